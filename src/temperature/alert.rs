// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-modbus-temperature project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Threshold alerts

use std::fmt;

/// A reading above the configured threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct TemperatureAlert {
    /// Sensor number as shown to the operator, starting at 1.
    pub sensor: usize,
    /// Measured temperature.
    pub value: f64,
    /// Threshold the value exceeded.
    pub threshold: f64,
}

impl fmt::Display for TemperatureAlert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "sensor {} temperature {:.1} exceeds threshold {:?}",
            self.sensor, self.value, self.threshold
        )
    }
}

/// Flag every reading strictly greater than `threshold`.
///
/// Each call is independent: there is no hysteresis between cycles.
pub fn check_alerts(temperatures: &[f64], threshold: f64) -> Vec<TemperatureAlert> {
    temperatures
        .iter()
        .enumerate()
        .filter(|(_, &value)| value > threshold)
        .map(|(index, &value)| TemperatureAlert {
            sensor: index + 1,
            value,
            threshold,
        })
        .collect()
}
