// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-modbus-temperature project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Configuration utilities
//!
//! This module provides utility functions for working with configuration
//! settings, including validation and schema management.

use anyhow::{Context, Result};
use log::debug;

use super::{Config, RegisterEncoding};

/// JSON schema embedded in the binary.
pub(crate) const CONFIG_SCHEMA: &str = include_str!("../../resources/config.schema.json");

/// Largest block a single "read holding registers" request may return.
pub const MAX_REGISTERS_PER_READ: u16 = 125;

/// Output the embedded JSON schema to the console.
///
/// Called when the `--show-config-schema` flag is provided on the command line.
///
/// # Example
///
/// ```bash
/// ./rust_modbus_temperature --show-config-schema > config_schema.json
/// ```
pub fn output_config_schema() -> Result<()> {
    let schema: serde_json::Value =
        serde_json::from_str(CONFIG_SCHEMA).context("Failed to parse JSON schema")?;

    let formatted_schema =
        serde_json::to_string_pretty(&schema).context("Failed to format JSON schema")?;

    println!("{}", formatted_schema);

    Ok(())
}

/// Validates the configuration against additional rules that aren't covered by the JSON schema.
///
/// # Validation Rules
///
/// - **Serial port**: the identifier must not be blank
/// - **Baud rate / timeout / interval**: must be strictly positive
/// - **Slave id**: must be a unicast address (1-247)
/// - **Register block**: 1 to 125 registers, not running past address 0xFFFF
/// - **Float32 encoding**: needs an even register count
/// - **Threshold**: must be a finite number
pub fn validate_specific_rules(config: &Config) -> Result<()> {
    debug!("Performing additional validation checks");

    if config.modbus.port.trim().is_empty() {
        anyhow::bail!("Serial port must not be empty");
    }

    if config.modbus.baud_rate == 0 {
        anyhow::bail!("Invalid baud rate: {}", config.modbus.baud_rate);
    }

    if config.modbus.timeout_ms == 0 {
        anyhow::bail!("Response timeout must be greater than 0 ms");
    }

    if !(1..=247).contains(&config.modbus.slave_id) {
        anyhow::bail!(
            "Invalid slave id: {} (valid range is 1-247)",
            config.modbus.slave_id
        );
    }

    let acquisition = &config.acquisition;
    if acquisition.register_count == 0 || acquisition.register_count > MAX_REGISTERS_PER_READ {
        anyhow::bail!(
            "Invalid register count: {} (valid range is 1-{})",
            acquisition.register_count,
            MAX_REGISTERS_PER_READ
        );
    }

    if u32::from(acquisition.start_address) + u32::from(acquisition.register_count) > 0x1_0000 {
        anyhow::bail!(
            "Register block {}+{} runs past the last register address",
            acquisition.start_address,
            acquisition.register_count
        );
    }

    if acquisition.encoding == RegisterEncoding::Float32 && acquisition.register_count % 2 != 0 {
        anyhow::bail!(
            "The float32 encoding needs an even register count, got {}",
            acquisition.register_count
        );
    }

    if acquisition.interval_ms == 0 {
        anyhow::bail!("Poll interval must be greater than 0 ms");
    }

    if !config.alert.threshold.is_finite() {
        anyhow::bail!("Alert threshold must be a finite number");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_specific_rules(&Config::default()).is_ok());
    }

    #[test]
    fn rejects_out_of_range_values() {
        let mut config = Config::default();
        config.modbus.slave_id = 0;
        assert!(validate_specific_rules(&config).is_err());

        let mut config = Config::default();
        config.acquisition.register_count = 126;
        assert!(validate_specific_rules(&config).is_err());

        let mut config = Config::default();
        config.acquisition.start_address = 0xFFFF;
        config.acquisition.register_count = 2;
        assert!(validate_specific_rules(&config).is_err());

        let mut config = Config::default();
        config.modbus.port = "  ".to_string();
        assert!(validate_specific_rules(&config).is_err());
    }

    #[test]
    fn float32_needs_even_count() {
        let mut config = Config::default();
        config.acquisition.encoding = RegisterEncoding::Float32;
        config.acquisition.register_count = 7;
        assert!(validate_specific_rules(&config).is_err());

        config.acquisition.register_count = 8;
        assert!(validate_specific_rules(&config).is_ok());
    }

    #[test]
    fn embedded_schema_is_valid_json() {
        let schema: serde_json::Value = serde_json::from_str(CONFIG_SCHEMA).unwrap();
        assert!(schema.get("properties").is_some());
    }
}
