// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-modbus-temperature project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Modbus communication module
//!
//! This module owns the Modbus master used to poll the temperature slave.
//! The monitor only depends on two narrow seams so it can run against real
//! hardware or a simulated slave:
//!
//! - [`ModbusMaster`]: executes "read holding registers" (function code 3)
//! - [`MasterConnector`]: opens a master from a [`ModbusConfig`]
//!
//! For avoiding confusion with the Modbus master/slave terminology: the master
//! is this program, it sends requests. The slave is the temperature module on
//! the serial bus, it answers them.
//!
//! ## Key Components
//!
//! - [`ConnectionManager`]: connection lifecycle and register reads
//! - [`rtu::RtuConnector`]: Modbus RTU over a serial port (`tokio-modbus` + `tokio-serial`)
//! - [`simulated::SimulatedConnector`]: in-memory slave for tests and `--simulate`

pub mod rtu;
pub mod simulated;

use std::io;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error, info};
use thiserror::Error;
use tokio_modbus::prelude::ExceptionCode;

use crate::config::ModbusConfig;

pub use rtu::RtuConnector;
pub use simulated::{SimulatedConnector, SimulatedDevice, SimulatedFailure};

/// Errors raised while talking to the slave device.
#[derive(Debug, Error)]
pub enum ModbusError {
    /// The serial channel could not be opened.
    #[error("failed to open serial port {port}: {source}")]
    Open {
        port: String,
        #[source]
        source: io::Error,
    },

    /// A request was issued before `connect()` succeeded.
    #[error("Modbus master is not connected")]
    NotConnected,

    /// The slave did not answer within the response timeout.
    #[error("no response from slave within {0:?}")]
    Timeout(Duration),

    /// The slave answered with a Modbus exception.
    #[error("slave answered with exception {0:?}")]
    Exception(ExceptionCode),

    /// The response did not carry the requested number of registers.
    #[error("expected {expected} registers, received {actual}")]
    CountMismatch { expected: u16, actual: usize },

    /// Framing, CRC or protocol level failure reported by the client.
    #[error(transparent)]
    Client(#[from] tokio_modbus::Error),

    /// I/O failure on the serial channel.
    #[error(transparent)]
    Transport(#[from] io::Error),
}

impl From<ExceptionCode> for ModbusError {
    fn from(code: ExceptionCode) -> Self {
        ModbusError::Exception(code)
    }
}

/// A Modbus master able to read holding registers.
#[async_trait]
pub trait ModbusMaster: Send {
    /// Read `count` holding registers starting at `address` from `slave_id`.
    async fn read_holding_registers(
        &mut self,
        slave_id: u8,
        address: u16,
        count: u16,
    ) -> Result<Vec<u16>, ModbusError>;

    /// Release the underlying channel.
    async fn close(&mut self) -> Result<(), ModbusError>;
}

/// Factory opening a [`ModbusMaster`] for a configuration.
#[async_trait]
pub trait MasterConnector: Send + Sync {
    async fn open(&self, config: &ModbusConfig) -> Result<Box<dyn ModbusMaster>, ModbusError>;
}

/// Owns the Modbus master for the lifetime of a monitoring session.
pub struct ConnectionManager {
    config: ModbusConfig,
    connector: Box<dyn MasterConnector>,
    master: Option<Box<dyn ModbusMaster>>,
}

impl ConnectionManager {
    pub fn new(config: ModbusConfig, connector: Box<dyn MasterConnector>) -> Self {
        info!(
            "Initializing Modbus client: port={}, baud rate={}, slave={}",
            config.port, config.baud_rate, config.slave_id
        );
        Self {
            config,
            connector,
            master: None,
        }
    }

    pub fn config(&self) -> &ModbusConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.master.is_some()
    }

    /// Open the serial channel and bind a master to it.
    ///
    /// Connecting while already connected keeps the current master.
    pub async fn connect(&mut self) -> Result<(), ModbusError> {
        if self.is_connected() {
            debug!("Modbus master already connected to {}", self.config.port);
            return Ok(());
        }

        match self.connector.open(&self.config).await {
            Ok(master) => {
                self.master = Some(master);
                info!("Modbus device connected on {}", self.config.port);
                Ok(())
            }
            Err(err) => {
                error!("Connection failed: {}", err);
                Err(err)
            }
        }
    }

    /// Release the channel. Safe to call when not connected; errors are only logged.
    pub async fn disconnect(&mut self) {
        let Some(mut master) = self.master.take() else {
            debug!("Disconnect requested but no Modbus master is open");
            return;
        };

        match master.close().await {
            Ok(()) => info!("Modbus connection closed"),
            Err(err) => error!("Error while closing Modbus connection: {}", err),
        }
    }

    /// Read a block of holding registers, returning the typed error on failure.
    pub async fn try_read_registers(
        &mut self,
        start_address: u16,
        count: u16,
    ) -> Result<Vec<u16>, ModbusError> {
        let timeout = self.config.timeout();
        let slave_id = self.config.slave_id;
        let master = self.master.as_mut().ok_or(ModbusError::NotConnected)?;

        let registers = tokio::time::timeout(
            timeout,
            master.read_holding_registers(slave_id, start_address, count),
        )
        .await
        .map_err(|_| ModbusError::Timeout(timeout))??;

        if registers.len() != usize::from(count) {
            return Err(ModbusError::CountMismatch {
                expected: count,
                actual: registers.len(),
            });
        }

        debug!("Read {} register values: {:?}", registers.len(), registers);
        Ok(registers)
    }

    /// Read a block of holding registers.
    ///
    /// Any failure is logged and yields an empty block so the caller can carry on.
    pub async fn read_registers(&mut self, start_address: u16, count: u16) -> Vec<u16> {
        match self.try_read_registers(start_address, count).await {
            Ok(registers) => registers,
            Err(err) => {
                error!("Failed to read temperature registers: {}", err);
                Vec::new()
            }
        }
    }
}
