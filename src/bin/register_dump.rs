// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-modbus-temperature project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! One-shot dump of a holding register block over Modbus RTU.
//!
//! Useful to check the wiring and the register map of a temperature module
//! before starting the monitor.

use clap::Parser;
use std::error::Error;

use rust_modbus_temperature::config::{ModbusConfig, RegisterEncoding};
use rust_modbus_temperature::modbus::{ConnectionManager, RtuConnector};

/// Read a block of holding registers from a Modbus RTU slave once
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Serial port of the Modbus device
    #[clap(long, default_value = "COM2")]
    port: String,

    /// Serial line speed
    #[clap(long, default_value = "38400")]
    baud_rate: u32,

    /// Modbus slave address
    #[clap(long, default_value = "1")]
    slave_id: u8,

    /// Response timeout in milliseconds
    #[clap(long, default_value = "1000")]
    timeout_ms: u64,

    /// Starting holding register address
    #[clap(long, default_value = "0")]
    start_address: u16,

    /// Number of registers to read
    #[clap(long, default_value = "12")]
    quantity: u16,

    /// Register encoding used to display temperatures
    #[clap(long, value_enum, default_value = "tenths")]
    encoding: RegisterEncoding,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init_from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "info"),
    );

    let args = Args::parse();

    let config = ModbusConfig {
        port: args.port,
        baud_rate: args.baud_rate,
        timeout_ms: args.timeout_ms,
        slave_id: args.slave_id,
    };
    println!(
        "Connecting to slave {} on {} at {} baud",
        config.slave_id, config.port, config.baud_rate
    );

    let mut connection = ConnectionManager::new(config, Box::new(RtuConnector));
    connection.connect().await?;

    println!(
        "Reading {} holding registers starting at address {}",
        args.quantity, args.start_address
    );
    let result = connection
        .try_read_registers(args.start_address, args.quantity)
        .await;
    connection.disconnect().await;
    let registers = result?;

    println!("Raw register values: {:?}", registers);
    for (i, value) in registers.iter().enumerate() {
        println!(
            "Register {}: {} (0x{:04X})",
            u32::from(args.start_address) + i as u32,
            value,
            value
        );
    }

    let decoder = args.encoding.decoder();
    for (i, temperature) in decoder.decode(&registers).iter().enumerate() {
        println!("Sensor {}: {:.1} ({})", i + 1, temperature, decoder.name());
    }

    Ok(())
}
