// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-modbus-temperature project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Modbus RTU master over a serial port
//!
//! Framing, CRC and function codes are handled by `tokio-modbus`, the serial
//! line by `tokio-serial`. The line is always opened as 8N1.

use async_trait::async_trait;
use log::debug;
use tokio_modbus::client::{rtu, Client, Context, Reader};
use tokio_modbus::slave::{Slave, SlaveContext};
use tokio_serial::{DataBits, Parity, SerialStream, StopBits};

use super::{MasterConnector, ModbusError, ModbusMaster};
use crate::config::modbus::{DATA_BITS, PARITY, STOP_BITS};
use crate::config::ModbusConfig;

/// Opens [`RtuMaster`]s on the configured serial port.
#[derive(Debug, Clone, Copy, Default)]
pub struct RtuConnector;

#[async_trait]
impl MasterConnector for RtuConnector {
    async fn open(&self, config: &ModbusConfig) -> Result<Box<dyn ModbusMaster>, ModbusError> {
        debug!(
            "Opening {} at {} baud, {}{}{}, timeout {} ms",
            config.port, config.baud_rate, DATA_BITS, PARITY, STOP_BITS, config.timeout_ms
        );

        let builder = tokio_serial::new(config.port.as_str(), config.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .timeout(config.timeout());

        let port = SerialStream::open(&builder).map_err(|err| ModbusError::Open {
            port: config.port.clone(),
            source: err.into(),
        })?;

        let ctx = rtu::attach_slave(port, Slave(config.slave_id));
        Ok(Box::new(RtuMaster { ctx }))
    }
}

/// `tokio-modbus` RTU client context bound to an open serial port.
pub struct RtuMaster {
    ctx: Context,
}

#[async_trait]
impl ModbusMaster for RtuMaster {
    async fn read_holding_registers(
        &mut self,
        slave_id: u8,
        address: u16,
        count: u16,
    ) -> Result<Vec<u16>, ModbusError> {
        self.ctx.set_slave(Slave(slave_id));
        let registers = self.ctx.read_holding_registers(address, count).await??;
        Ok(registers)
    }

    async fn close(&mut self) -> Result<(), ModbusError> {
        self.ctx.disconnect().await?;
        Ok(())
    }
}
