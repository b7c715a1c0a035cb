// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-modbus-temperature project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! In-memory Modbus slave
//!
//! [`SimulatedDevice`] holds a holding register map shared between the test (or
//! the `--simulate` mode) and the [`SimulatedMaster`] handed to the monitor.
//! Failures can be scripted per read, and the device counts opens, reads and
//! closes so callers can check the connection lifecycle.

use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error};
use rand::Rng;
use tokio_modbus::prelude::ExceptionCode;

use super::{MasterConnector, ModbusError, ModbusMaster};
use crate::config::{ModbusConfig, RegisterEncoding};

/// A failure injected into the next read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulatedFailure {
    /// The slave never answers.
    Timeout,
    /// The slave answers with a Modbus exception.
    Exception(ExceptionCode),
    /// The slave answers with one register less than requested.
    ShortResponse,
}

#[derive(Debug, Default)]
struct DeviceState {
    holding_registers: HashMap<u16, u16>,
    pending_failures: VecDeque<SimulatedFailure>,
    open_error: Option<String>,
    jitter: u16,
    opens: usize,
    reads: usize,
    closes: usize,
}

/// Shared handle on a simulated slave.
#[derive(Debug, Clone, Default)]
pub struct SimulatedDevice {
    state: Arc<Mutex<DeviceState>>,
}

impl SimulatedDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Device whose holding registers start at `start_address` with `values`.
    pub fn with_registers(start_address: u16, values: &[u16]) -> Self {
        let device = Self::new();
        device.set_registers(start_address, values);
        device
    }

    /// Device exposing `temperatures` encoded as the slave would.
    pub fn with_temperatures(
        start_address: u16,
        temperatures: &[f64],
        encoding: RegisterEncoding,
    ) -> Self {
        Self::with_registers(start_address, &encode_temperatures(temperatures, encoding))
    }

    /// Randomly move every returned register by up to `amplitude` counts.
    pub fn with_jitter(self, amplitude: u16) -> Self {
        self.lock().jitter = amplitude;
        self
    }

    pub fn set_registers(&self, start_address: u16, values: &[u16]) {
        let mut state = self.lock();
        for (offset, value) in values.iter().enumerate() {
            state
                .holding_registers
                .insert(start_address.wrapping_add(offset as u16), *value);
        }
    }

    /// Queue a failure for the next read not already consumed by an earlier one.
    pub fn fail_next_read(&self, failure: SimulatedFailure) {
        self.lock().pending_failures.push_back(failure);
    }

    /// Make every connection attempt fail with `reason`.
    pub fn fail_open(&self, reason: impl Into<String>) {
        self.lock().open_error = Some(reason.into());
    }

    pub fn open_count(&self) -> usize {
        self.lock().opens
    }

    pub fn read_count(&self) -> usize {
        self.lock().reads
    }

    pub fn close_count(&self) -> usize {
        self.lock().closes
    }

    fn read_block(&self, address: u16, count: u16) -> Result<Vec<u16>, ExceptionCode> {
        let state = self.lock();
        register_read(&state, address, count)
    }

    fn lock(&self) -> MutexGuard<'_, DeviceState> {
        // A test panicking while holding the lock must not hide the device state
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Encode temperatures into holding registers.
pub fn encode_temperatures(temperatures: &[f64], encoding: RegisterEncoding) -> Vec<u16> {
    match encoding {
        RegisterEncoding::Tenths => temperatures
            .iter()
            .map(|t| (t * 10.0).round().clamp(0.0, f64::from(u16::MAX)) as u16)
            .collect(),
        RegisterEncoding::Float32 => temperatures
            .iter()
            .flat_map(|t| {
                let bits = (*t as f32).to_bits();
                [(bits >> 16) as u16, bits as u16]
            })
            .collect(),
    }
}

/// Helper function implementing reading registers from the register map.
fn register_read(state: &DeviceState, addr: u16, cnt: u16) -> Result<Vec<u16>, ExceptionCode> {
    let mut rng = rand::rng();
    let mut response_values = Vec::with_capacity(cnt.into());
    for i in 0..cnt {
        let reg_addr = addr.wrapping_add(i);
        let Some(value) = state.holding_registers.get(&reg_addr) else {
            error!("SIMULATOR: Exception::IllegalDataAddress at register {reg_addr}");
            return Err(ExceptionCode::IllegalDataAddress);
        };
        let value = if state.jitter > 0 {
            let amplitude = i16::try_from(state.jitter).unwrap_or(i16::MAX);
            value.saturating_add_signed(rng.random_range(-amplitude..=amplitude))
        } else {
            *value
        };
        response_values.push(value);
    }
    Ok(response_values)
}

/// Master talking to a [`SimulatedDevice`].
#[derive(Debug)]
pub struct SimulatedMaster {
    device: SimulatedDevice,
}

#[async_trait]
impl ModbusMaster for SimulatedMaster {
    async fn read_holding_registers(
        &mut self,
        slave_id: u8,
        address: u16,
        count: u16,
    ) -> Result<Vec<u16>, ModbusError> {
        let failure = {
            let mut state = self.device.lock();
            state.reads += 1;
            state.pending_failures.pop_front()
        };
        debug!("SIMULATOR: slave {slave_id} read {count} registers at {address}");

        match failure {
            Some(SimulatedFailure::Timeout) => {
                // Outlives any sensible response timeout
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(ModbusError::Timeout(Duration::from_secs(3600)))
            }
            Some(SimulatedFailure::Exception(code)) => Err(ModbusError::Exception(code)),
            Some(SimulatedFailure::ShortResponse) => {
                let mut registers = self.device.read_block(address, count)?;
                registers.pop();
                Ok(registers)
            }
            None => {
                let registers = self.device.read_block(address, count)?;
                Ok(registers)
            }
        }
    }

    async fn close(&mut self) -> Result<(), ModbusError> {
        self.device.lock().closes += 1;
        Ok(())
    }
}

/// Connector handing out [`SimulatedMaster`]s bound to one device.
#[derive(Debug, Clone)]
pub struct SimulatedConnector {
    device: SimulatedDevice,
}

impl SimulatedConnector {
    pub fn new(device: SimulatedDevice) -> Self {
        Self { device }
    }
}

#[async_trait]
impl MasterConnector for SimulatedConnector {
    async fn open(&self, config: &ModbusConfig) -> Result<Box<dyn ModbusMaster>, ModbusError> {
        let open_error = {
            let mut state = self.device.lock();
            state.opens += 1;
            state.open_error.clone()
        };

        if let Some(reason) = open_error {
            return Err(ModbusError::Open {
                port: config.port.clone(),
                source: io::Error::other(reason),
            });
        }

        Ok(Box::new(SimulatedMaster {
            device: self.device.clone(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_mapped_registers() {
        let device = SimulatedDevice::with_registers(10, &[1, 2, 3]);
        let mut master = SimulatedConnector::new(device.clone())
            .open(&ModbusConfig::default())
            .await
            .unwrap();

        assert_eq!(master.read_holding_registers(1, 10, 3).await.unwrap(), vec![1, 2, 3]);
        assert_eq!(device.read_count(), 1);
    }

    #[tokio::test]
    async fn unmapped_register_is_an_exception() {
        let device = SimulatedDevice::with_registers(0, &[1, 2]);
        let mut master = SimulatedConnector::new(device)
            .open(&ModbusConfig::default())
            .await
            .unwrap();

        assert!(matches!(
            master.read_holding_registers(1, 0, 3).await,
            Err(ModbusError::Exception(ExceptionCode::IllegalDataAddress))
        ));
    }

    #[tokio::test]
    async fn scripted_failures_are_consumed_in_order() {
        let device = SimulatedDevice::with_registers(0, &[100, 200]);
        device.fail_next_read(SimulatedFailure::ShortResponse);
        device.fail_next_read(SimulatedFailure::Exception(ExceptionCode::ServerDeviceBusy));
        let mut master = SimulatedConnector::new(device)
            .open(&ModbusConfig::default())
            .await
            .unwrap();

        assert_eq!(master.read_holding_registers(1, 0, 2).await.unwrap(), vec![100]);
        assert!(master.read_holding_registers(1, 0, 2).await.is_err());
        assert_eq!(master.read_holding_registers(1, 0, 2).await.unwrap(), vec![100, 200]);
    }

    #[tokio::test]
    async fn jitter_stays_within_amplitude() {
        let device = SimulatedDevice::with_registers(0, &[250; 12]).with_jitter(5);
        let mut master = SimulatedConnector::new(device)
            .open(&ModbusConfig::default())
            .await
            .unwrap();

        for _ in 0..20 {
            let registers = master.read_holding_registers(1, 0, 12).await.unwrap();
            assert!(registers.iter().all(|r| (245..=255).contains(r)));
        }
    }

    #[test]
    fn encodes_tenths_and_float32() {
        assert_eq!(
            encode_temperatures(&[25.0, 30.5], RegisterEncoding::Tenths),
            vec![250, 305]
        );
        assert_eq!(
            encode_temperatures(&[25.5], RegisterEncoding::Float32),
            vec![0x41CC, 0x0000]
        );
    }
}
