// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-modbus-temperature project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! # Temperature monitor
//!
//! The monitor owns the Modbus connection and drives the poll cycles:
//!
//! ```text
//! Disconnected --connect()--> Connected --run()--> Polling --shutdown/error--> Disconnected
//! ```
//!
//! Each cycle reads the register block, decodes it, prints the result and
//! checks the alert threshold. A failed read only marks the cycle as failed.
//! The shutdown future is observed between cycles, never during a read, and
//! the connection is released exactly once whenever `run` leaves the polling
//! state.
//!
//! ## Usage
//!
//! ```no_run
//! use rust_modbus_temperature::{config::Config, modbus::RtuConnector, monitor::TemperatureMonitor};
//!
//! async fn run() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     let mut monitor = TemperatureMonitor::new(&config, Box::new(RtuConnector));
//!     monitor.connect().await?;
//!
//!     let stats = monitor
//!         .run(async {
//!             let _ = tokio::signal::ctrl_c().await;
//!         })
//!         .await?;
//!     println!("{} cycles", stats.cycles);
//!     Ok(())
//! }
//! ```

pub mod report;
pub mod scheduler;

use std::future::Future;

use anyhow::{Context, Result};
use chrono::Local;
use log::{error, info, warn};

use crate::config::{AcquisitionConfig, AlertConfig, Config};
use crate::modbus::{ConnectionManager, MasterConnector, ModbusError};
use crate::temperature::{check_alerts, TemperatureDecoder};

pub use report::Reporter;
pub use scheduler::{IntervalScheduler, Scheduler};

/// Lifecycle state of a [`TemperatureMonitor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Disconnected,
    Connected,
    Polling,
}

/// Counters accumulated by [`TemperatureMonitor::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorStats {
    /// Poll cycles started.
    pub cycles: u64,
    /// Cycles whose read failed.
    pub failed_cycles: u64,
    /// Alerts raised over all cycles.
    pub alerts: u64,
}

/// Periodic reader of the temperature slave.
pub struct TemperatureMonitor {
    connection: ConnectionManager,
    acquisition: AcquisitionConfig,
    alert: AlertConfig,
    decoder: Box<dyn TemperatureDecoder>,
    scheduler: Box<dyn Scheduler>,
    reporter: Reporter,
    state: MonitorState,
}

impl TemperatureMonitor {
    /// Monitor reporting to stdout and waiting the configured interval between cycles.
    pub fn new(config: &Config, connector: Box<dyn MasterConnector>) -> Self {
        Self {
            connection: ConnectionManager::new(config.modbus.clone(), connector),
            acquisition: config.acquisition.clone(),
            alert: config.alert.clone(),
            decoder: config.acquisition.encoding.decoder(),
            scheduler: Box::new(IntervalScheduler::new(config.acquisition.interval())),
            reporter: Reporter::stdout(config.alert.unit.clone()),
            state: MonitorState::Disconnected,
        }
    }

    pub fn with_scheduler(mut self, scheduler: Box<dyn Scheduler>) -> Self {
        self.scheduler = scheduler;
        self
    }

    pub fn with_reporter(mut self, reporter: Reporter) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn with_decoder(mut self, decoder: Box<dyn TemperatureDecoder>) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }

    /// Open the Modbus connection.
    pub async fn connect(&mut self) -> Result<(), ModbusError> {
        self.connection.connect().await?;
        self.state = MonitorState::Connected;
        Ok(())
    }

    /// Release the Modbus connection. Safe to call in any state.
    pub async fn disconnect(&mut self) {
        self.connection.disconnect().await;
        self.state = MonitorState::Disconnected;
    }

    /// Poll until `shutdown` resolves or a cycle fails to report.
    ///
    /// The connection is always released before returning.
    pub async fn run<F>(&mut self, shutdown: F) -> Result<MonitorStats>
    where
        F: Future<Output = ()>,
    {
        if self.state != MonitorState::Connected {
            anyhow::bail!("Cannot start monitoring in state {:?}", self.state);
        }

        info!(
            "Starting temperature monitoring, interval: {} ms",
            self.acquisition.interval_ms
        );
        info!("Press Ctrl+C to stop monitoring");
        self.state = MonitorState::Polling;

        let mut stats = MonitorStats::default();
        let outcome = self.poll_until(shutdown, &mut stats).await;
        if let Err(err) = &outcome {
            error!("Monitoring aborted: {:#}", err);
        }

        self.disconnect().await;
        info!(
            "Monitoring stopped after {} cycles ({} failed, {} alerts)",
            stats.cycles, stats.failed_cycles, stats.alerts
        );

        outcome.map(|()| stats)
    }

    async fn poll_until<F>(&mut self, shutdown: F, stats: &mut MonitorStats) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            self.poll_cycle(stats)
                .await
                .context("Failed to write the monitoring report")?;

            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("Interrupted by user, stopping monitoring");
                    return Ok(());
                }
                _ = self.scheduler.wait_next_cycle() => {}
            }
        }
    }

    async fn poll_cycle(&mut self, stats: &mut MonitorStats) -> std::io::Result<()> {
        stats.cycles += 1;

        let registers = self
            .connection
            .read_registers(
                self.acquisition.start_address,
                self.acquisition.register_count,
            )
            .await;
        let timestamp = Local::now();

        if registers.is_empty() {
            stats.failed_cycles += 1;
            return self.reporter.read_failed(timestamp);
        }

        let temperatures = self.decoder.decode(&registers);
        self.reporter.readings(timestamp, &registers, &temperatures)?;

        let alerts = check_alerts(&temperatures, self.alert.threshold);
        for alert in &alerts {
            warn!("Temperature alert: {}", alert);
            self.reporter.alert(alert)?;
        }
        stats.alerts += alerts.len() as u64;

        Ok(())
    }
}
