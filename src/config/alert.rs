// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-modbus-temperature project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Alert configuration

use serde::{Deserialize, Serialize};

/// Threshold alerting settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// A reading strictly above this value raises an alert.
    pub threshold: f64,

    /// Unit suffix appended to printed temperatures.
    pub unit: String,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            threshold: 30.0,
            unit: "°C".to_string(),
        }
    }
}
