// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-modbus-temperature project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Configuration management for the temperature monitor
//!
//! This module provides functionality for loading, validating, and applying
//! configuration settings. The configuration is backed by an optional YAML file
//! validated against a JSON schema, and can be overridden from the command line.
//!
//! ## Configuration Structure
//!
//! - `modbus`: Serial link and slave device settings
//! - `acquisition`: Register block, poll interval and register encoding
//! - `alert`: Alert threshold and display unit
//!
//! ## Usage
//!
//! ```no_run
//! use rust_modbus_temperature::config::Config;
//! use std::path::Path;
//!
//! // Load config from file, creates a default if not found
//! let mut config = Config::from_file(Path::new("config.yaml")).unwrap();
//!
//! // Apply command line overrides if needed
//! config.apply_args(
//!     Some("/dev/ttyUSB0".to_string()), // Serial port
//!     Some(9600),                       // Baud rate
//!     None,                             // Slave id
//!     None,                             // Timeout
//!     None,                             // Start address
//!     Some(8),                          // Register count
//!     None,                             // Interval
//!     Some(45.0),                       // Threshold
//!     None,                             // Encoding
//! );
//!
//! println!("Polling {} every {} ms", config.modbus.port, config.acquisition.interval_ms);
//! ```

pub mod acquisition;
pub mod alert;
pub mod modbus;
pub mod utils;

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, error};
use serde::{Deserialize, Serialize};

pub use acquisition::{AcquisitionConfig, RegisterEncoding};
pub use alert::AlertConfig;
pub use modbus::ModbusConfig;
pub use utils::{output_config_schema, validate_specific_rules};

/// Root configuration structure.
///
/// Every section falls back to its defaults when absent from the YAML file, so
/// an empty file is a valid configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Serial link and slave device.
    #[serde(default)]
    pub modbus: ModbusConfig,

    /// Register block, poll interval and encoding.
    #[serde(default)]
    pub acquisition: AcquisitionConfig,

    /// Alert threshold and display unit.
    #[serde(default)]
    pub alert: AlertConfig,
}

impl Config {
    /// Helper method to create a sample config file when validation fails
    fn create_sample_config<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        let sample_path = path.with_extension("sample.yaml");
        debug!("Original path: {:?}, Sample path: {:?}", path, sample_path);

        if let Some(parent) = sample_path.parent() {
            if !parent.exists() {
                debug!("Creating parent directory: {:?}", parent);
                fs::create_dir_all(parent).with_context(|| {
                    format!(
                        "Failed to create parent directory for sample config at {:?}",
                        parent
                    )
                })?;
            }
        }

        Self::default()
            .save_to_file(&sample_path)
            .with_context(|| format!("Failed to save sample config to {:?}", sample_path))?;

        error!(
            "Sample configuration file created at {:?}\nPlease edit and rename it",
            sample_path
        );
        Ok(())
    }

    /// Load configuration from a file
    ///
    /// A missing file is created with the default values. A file failing schema
    /// validation, deserialization or [`validate_specific_rules`] produces an
    /// error and a `*.sample.yaml` file with defaults next to it.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(
                "Configuration file not found at {:?}, creating default",
                path
            );
            let default_config = Self::default();
            default_config.save_to_file(path)?;
            return Ok(default_config);
        }

        debug!("Loading configuration from {:?}", path);
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file at {:?}", path))?;

        let yaml_value: serde_yml::Value = serde_yml::from_str(&contents)
            .with_context(|| format!("Failed to parse YAML configuration from {:?}", path))?;

        // An empty document is null, which means "all defaults"
        let json_value = match serde_json::to_value(&yaml_value).with_context(|| {
            format!("Failed to convert YAML to JSON for validation: {:?}", path)
        })? {
            serde_json::Value::Null => serde_json::Value::Object(Default::default()),
            value => value,
        };

        let schema: serde_json::Value = serde_json::from_str(utils::CONFIG_SCHEMA)
            .context("Failed to parse JSON schema")?;
        let validator = jsonschema::draft202012::options()
            .should_validate_formats(true)
            .build(&schema)?;

        debug!("Validating {} configuration against schema", path.display());
        if let Err(error) = validator.validate(&json_value) {
            error!("Configuration validation error before deserialization");
            Self::create_sample_config(path)?;
            anyhow::bail!("Configuration validation failed: {}", error);
        }

        debug!("Schema validation passed, deserializing into Config structure");
        let config: Config = match serde_json::from_value(json_value) {
            Ok(config) => config,
            Err(err) => {
                error!("Configuration deserialization error: {}", err);
                if let Err(e) = Self::create_sample_config(path) {
                    error!("Failed to create sample config: {}", e);
                }
                return Err(anyhow::anyhow!(
                    "Failed to deserialize configuration from {}: {}",
                    path.display(),
                    err
                ));
            }
        };

        if let Err(err) = config.validate() {
            error!("Configuration specific validation error: {}", err);
            Self::create_sample_config(path)?;
            return Err(err);
        }

        Ok(config)
    }

    /// Save the configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml =
            serde_yml::to_string(self).context("Failed to serialize configuration to YAML")?;

        let mut file = File::create(path.as_ref())
            .with_context(|| format!("Failed to create config file at {:?}", path.as_ref()))?;

        file.write_all(yaml.as_bytes())
            .with_context(|| format!("Failed to write configuration to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Check the rules the JSON schema cannot express.
    pub fn validate(&self) -> Result<()> {
        validate_specific_rules(self)
    }

    /// Apply command line arguments to override configuration values.
    ///
    /// Only the arguments that were actually provided replace the loaded values.
    #[allow(clippy::too_many_arguments)]
    pub fn apply_args(
        &mut self,
        port: Option<String>,
        baud_rate: Option<u32>,
        slave_id: Option<u8>,
        timeout_ms: Option<u64>,
        start_address: Option<u16>,
        register_count: Option<u16>,
        interval_ms: Option<u64>,
        threshold: Option<f64>,
        encoding: Option<RegisterEncoding>,
    ) {
        if let Some(port) = port {
            debug!("Overriding serial port from command line: {}", port);
            self.modbus.port = port;
        }
        if let Some(baud_rate) = baud_rate {
            debug!("Overriding baud rate from command line: {}", baud_rate);
            self.modbus.baud_rate = baud_rate;
        }
        if let Some(slave_id) = slave_id {
            debug!("Overriding slave id from command line: {}", slave_id);
            self.modbus.slave_id = slave_id;
        }
        if let Some(timeout_ms) = timeout_ms {
            debug!("Overriding response timeout from command line: {} ms", timeout_ms);
            self.modbus.timeout_ms = timeout_ms;
        }

        if let Some(start_address) = start_address {
            debug!("Overriding start address from command line: {}", start_address);
            self.acquisition.start_address = start_address;
        }
        if let Some(count) = register_count {
            debug!("Overriding register count from command line: {}", count);
            self.acquisition.register_count = count;
        }
        if let Some(interval_ms) = interval_ms {
            debug!("Overriding poll interval from command line: {} ms", interval_ms);
            self.acquisition.interval_ms = interval_ms;
        }
        if let Some(encoding) = encoding {
            debug!("Overriding register encoding from command line: {:?}", encoding);
            self.acquisition.encoding = encoding;
        }

        if let Some(threshold) = threshold {
            debug!("Overriding alert threshold from command line: {}", threshold);
            self.alert.threshold = threshold;
        }
    }
}
