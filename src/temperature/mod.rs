// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-modbus-temperature project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Temperature decoding and alerting
//!
//! Raw holding registers carry no unit or scale information, so the conversion
//! depends on how the slave device encodes its readings. The encoding is a
//! [`TemperatureDecoder`] strategy selected from the configuration:
//!
//! - [`TenthsDecoder`]: one register per sensor, value in tenths of a degree
//!   (register `250` is `25.0`)
//! - [`Float32Decoder`]: two registers per sensor forming a big-endian IEEE-754
//!   single precision float
//!
//! Decoders never fail: an empty block decodes to no readings.

pub mod alert;

pub use alert::{check_alerts, TemperatureAlert};

/// Strategy turning a raw register block into temperatures.
pub trait TemperatureDecoder: Send + Sync {
    /// Decode the registers, in register order.
    fn decode(&self, registers: &[u16]) -> Vec<f64>;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}

/// Fixed point encoding in tenths of a degree.
#[derive(Debug, Clone, Copy, Default)]
pub struct TenthsDecoder;

impl TemperatureDecoder for TenthsDecoder {
    fn decode(&self, registers: &[u16]) -> Vec<f64> {
        parse(registers)
    }

    fn name(&self) -> &'static str {
        "tenths"
    }
}

/// Register pairs holding a big-endian `f32`, high word first.
///
/// A trailing unpaired register is ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct Float32Decoder;

impl TemperatureDecoder for Float32Decoder {
    fn decode(&self, registers: &[u16]) -> Vec<f64> {
        registers
            .chunks_exact(2)
            .map(|pair| {
                let bits = (u32::from(pair[0]) << 16) | u32::from(pair[1]);
                f64::from(f32::from_bits(bits))
            })
            .collect()
    }

    fn name(&self) -> &'static str {
        "float32"
    }
}

/// Convert raw registers in tenths of a degree into temperatures.
///
/// ```
/// use rust_modbus_temperature::temperature::parse;
///
/// assert_eq!(parse(&[250, 305, 180]), vec![25.0, 30.5, 18.0]);
/// assert!(parse(&[]).is_empty());
/// ```
pub fn parse(registers: &[u16]) -> Vec<f64> {
    registers.iter().map(|&raw| f64::from(raw) / 10.0).collect()
}
