// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-modbus-temperature project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Console output of the poll cycles
//!
//! The report is the operator facing output and is kept apart from logging:
//! it always goes to the configured writer (stdout by default) regardless of
//! the log level.

use std::io::{self, Write};

use chrono::{DateTime, Local};

use crate::temperature::TemperatureAlert;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Writes cycle results, failures and alerts.
pub struct Reporter {
    out: Box<dyn Write + Send>,
    unit: String,
}

impl Reporter {
    pub fn new(out: Box<dyn Write + Send>, unit: impl Into<String>) -> Self {
        Self {
            out,
            unit: unit.into(),
        }
    }

    pub fn stdout(unit: impl Into<String>) -> Self {
        Self::new(Box::new(io::stdout()), unit)
    }

    /// Raw registers and decoded temperatures of a successful cycle.
    pub fn readings(
        &mut self,
        timestamp: DateTime<Local>,
        registers: &[u16],
        temperatures: &[f64],
    ) -> io::Result<()> {
        let formatted: Vec<String> = temperatures
            .iter()
            .map(|t| format!("{:.1}{}", t, self.unit))
            .collect();

        writeln!(self.out)?;
        writeln!(
            self.out,
            "[{}] Temperature data read:",
            timestamp.format(TIMESTAMP_FORMAT)
        )?;
        writeln!(self.out, "Raw register values: {:?}", registers)?;
        writeln!(self.out, "Temperatures: [{}]", formatted.join(", "))?;
        self.out.flush()
    }

    /// Failure notice of a cycle whose read failed.
    pub fn read_failed(&mut self, timestamp: DateTime<Local>) -> io::Result<()> {
        writeln!(
            self.out,
            "[{}] Temperature data read failed",
            timestamp.format(TIMESTAMP_FORMAT)
        )?;
        self.out.flush()
    }

    /// The threshold is printed as configured, without rounding.
    pub fn alert(&mut self, alert: &TemperatureAlert) -> io::Result<()> {
        writeln!(
            self.out,
            "WARNING: sensor {} temperature over limit: {:.1}{} (threshold: {:?}{})",
            alert.sensor, alert.value, self.unit, alert.threshold, self.unit
        )?;
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Buffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn timestamp() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 5, 17, 8, 30, 5).unwrap()
    }

    #[test]
    fn prints_readings_with_one_decimal_and_unit() {
        let buffer = Buffer::default();
        let mut reporter = Reporter::new(Box::new(buffer.clone()), "°C");

        reporter
            .readings(timestamp(), &[250, 305, 180], &[25.0, 30.5, 18.0])
            .unwrap();

        let output = buffer.contents();
        assert!(output.contains("[2024-05-17 08:30:05] Temperature data read:"));
        assert!(output.contains("Raw register values: [250, 305, 180]"));
        assert!(output.contains("Temperatures: [25.0°C, 30.5°C, 18.0°C]"));
    }

    #[test]
    fn prints_failure_and_alert_lines() {
        let buffer = Buffer::default();
        let mut reporter = Reporter::new(Box::new(buffer.clone()), "°C");

        reporter.read_failed(timestamp()).unwrap();
        reporter
            .alert(&TemperatureAlert {
                sensor: 2,
                value: 30.5,
                threshold: 30.0,
            })
            .unwrap();

        let output = buffer.contents();
        assert!(output.contains("[2024-05-17 08:30:05] Temperature data read failed"));
        assert!(output
            .contains("WARNING: sensor 2 temperature over limit: 30.5°C (threshold: 30.0°C)"));
    }

    #[test]
    fn alert_keeps_threshold_precision() {
        let buffer = Buffer::default();
        let mut reporter = Reporter::new(Box::new(buffer.clone()), "°C");

        reporter
            .alert(&TemperatureAlert {
                sensor: 1,
                value: 30.3,
                threshold: 30.25,
            })
            .unwrap();

        assert!(buffer
            .contents()
            .contains("WARNING: sensor 1 temperature over limit: 30.3°C (threshold: 30.25°C)"));
    }
}
