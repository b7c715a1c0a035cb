// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-modbus-temperature project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Acquisition configuration
//!
//! Controls which register block is polled, how often, and how the raw
//! registers are decoded into temperatures.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::temperature::{Float32Decoder, TemperatureDecoder, TenthsDecoder};

/// Encoding of temperatures inside the holding registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RegisterEncoding {
    /// One register per sensor, value in tenths of a degree (250 → 25.0).
    #[default]
    Tenths,
    /// Two registers per sensor holding a big-endian IEEE-754 `f32`.
    Float32,
}

impl RegisterEncoding {
    /// Build the decoder implementing this encoding.
    pub fn decoder(self) -> Box<dyn TemperatureDecoder> {
        match self {
            RegisterEncoding::Tenths => Box::new(TenthsDecoder),
            RegisterEncoding::Float32 => Box::new(Float32Decoder),
        }
    }
}

/// Configuration for the polling loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionConfig {
    /// First holding register of the block.
    pub start_address: u16,

    /// Number of holding registers read on each cycle (1-125).
    pub register_count: u16,

    /// Time between two consecutive poll cycles, in milliseconds.
    pub interval_ms: u64,

    /// How the registers are turned into temperatures.
    pub encoding: RegisterEncoding,
}

impl AcquisitionConfig {
    /// Poll interval as a [`Duration`].
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            start_address: 0,
            register_count: 12,
            interval_ms: 1000,
            encoding: RegisterEncoding::Tenths,
        }
    }
}
