// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-modbus-temperature project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Modbus RTU serial link configuration
//!
//! This module defines the structures for configuring the serial line and the
//! slave device polled by the temperature monitor.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Number of data bits per character. Fixed for the supported devices.
pub const DATA_BITS: u8 = 8;

/// Parity used on the serial line (`N`: none). Fixed for the supported devices.
pub const PARITY: char = 'N';

/// Number of stop bits per character. Fixed for the supported devices.
pub const STOP_BITS: u8 = 1;

/// Configuration for the Modbus RTU master connection.
///
/// Byte size, parity and stop bits are not configurable: the link is always
/// opened as 8N1 (see [`DATA_BITS`], [`PARITY`] and [`STOP_BITS`]).
///
/// # Example
///
/// ```
/// use rust_modbus_temperature::config::ModbusConfig;
///
/// let modbus_config = ModbusConfig {
///     port: "/dev/ttyUSB0".to_string(),
///     baud_rate: 9600,
///     timeout_ms: 500,
///     slave_id: 3,
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModbusConfig {
    /// Serial port identifier, e.g. `COM2` on Windows or `/dev/ttyUSB0` on Linux.
    pub port: String,

    /// Serial line speed in bits per second.
    pub baud_rate: u32,

    /// Response timeout applied to every request, in milliseconds.
    pub timeout_ms: u64,

    /// Address of the slave device on the bus (1-247).
    pub slave_id: u8,
}

impl ModbusConfig {
    /// Response timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for ModbusConfig {
    fn default() -> Self {
        Self {
            port: "COM2".to_string(),
            baud_rate: 38400,
            timeout_ms: 1000,
            slave_id: 1,
        }
    }
}
