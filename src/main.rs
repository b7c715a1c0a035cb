// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-modbus-temperature project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

// Main entry point for the Modbus RTU temperature monitor
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use log::{error, info};
use tokio::signal;

use rust_modbus_temperature::config::modbus::{DATA_BITS, PARITY, STOP_BITS};
use rust_modbus_temperature::config::{self, Config, RegisterEncoding};
use rust_modbus_temperature::modbus::{
    MasterConnector, RtuConnector, SimulatedConnector, SimulatedDevice,
};
use rust_modbus_temperature::monitor::TemperatureMonitor;

/// Modbus RTU temperature acquisition with threshold alerts
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Serial port of the Modbus device (e.g. COM2 or /dev/ttyUSB0)
    #[arg(long)]
    port: Option<String>,

    /// Serial line speed
    #[arg(long)]
    baud_rate: Option<u32>,

    /// Modbus slave address of the temperature module
    #[arg(long)]
    slave_id: Option<u8>,

    /// Response timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// First holding register to read
    #[arg(long)]
    start_address: Option<u16>,

    /// Number of holding registers to read
    #[arg(long)]
    count: Option<u16>,

    /// Poll interval in milliseconds
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Alert threshold
    #[arg(long)]
    threshold: Option<f64>,

    /// Register encoding of the temperatures
    #[arg(long, value_enum)]
    encoding: Option<RegisterEncoding>,

    /// Path to configuration file (YAML format)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to a configuration to validate and exit
    #[arg(long)]
    validate_config: Option<PathBuf>,

    /// Output the configuration schema as JSON and exit
    #[arg(long)]
    show_config_schema: bool,

    /// Poll a simulated slave instead of the serial port
    #[arg(long)]
    simulate: bool,

    /// Enable verbose logging (debug level)
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    /// Disable all logging output
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let log_level = if args.quiet {
        log::LevelFilter::Off
    } else if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    if args.show_config_schema {
        config::output_config_schema()?;
        return Ok(ExitCode::SUCCESS);
    }

    if let Some(validate_path) = &args.validate_config {
        if !validate_path.exists() {
            return Err(anyhow::anyhow!(
                "Configuration file does not exist: {}",
                validate_path.display()
            ));
        }

        Config::from_file(validate_path)
            .map_err(|err| anyhow::anyhow!("Configuration validation failed: {}", err))?;
        println!("Configuration file is valid: {}", validate_path.display());
        return Ok(ExitCode::SUCCESS);
    }

    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    config.apply_args(
        args.port.clone(),
        args.baud_rate,
        args.slave_id,
        args.timeout_ms,
        args.start_address,
        args.count,
        args.interval_ms,
        args.threshold,
        args.encoding,
    );
    config.validate()?;

    println!("{}", "=".repeat(60));
    println!("Modbus RTU temperature acquisition");
    println!("{}", "=".repeat(60));
    info!(
        "Serial link {} {} baud {}{}{}, slave {}, registers {}..{} every {} ms",
        config.modbus.port,
        config.modbus.baud_rate,
        DATA_BITS,
        PARITY,
        STOP_BITS,
        config.modbus.slave_id,
        config.acquisition.start_address,
        u32::from(config.acquisition.start_address) + u32::from(config.acquisition.register_count),
        config.acquisition.interval_ms
    );

    let connector: Box<dyn MasterConnector> = if args.simulate {
        info!("Using a simulated Modbus slave");
        Box::new(SimulatedConnector::new(simulated_device(&config)))
    } else {
        Box::new(RtuConnector)
    };

    let interrupted = async {
        if let Err(err) = signal::ctrl_c().await {
            error!("Unable to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };
    tokio::pin!(interrupted);

    // The first poll installs the SIGINT handler, before the port is opened
    let mut monitor = TemperatureMonitor::new(&config, connector);
    let connected = tokio::select! {
        biased;
        _ = &mut interrupted => None,
        result = monitor.connect() => Some(result),
    };

    let Some(connected) = connected else {
        info!("Interrupted by user before monitoring started");
        return Ok(ExitCode::SUCCESS);
    };
    if let Err(err) = connected {
        eprintln!("Unable to connect to the Modbus device ({}), please check:", err);
        eprintln!("1. The serial port name is correct");
        eprintln!("2. The device is connected and powered on");
        eprintln!("3. The serial parameters match the device");
        eprintln!("4. No other program is using the serial port");
        return Ok(ExitCode::FAILURE);
    }

    // An interrupt received during a read stays pending until the next check
    match monitor.run(&mut interrupted).await {
        Ok(_) => Ok(ExitCode::SUCCESS),
        Err(_) => Ok(ExitCode::FAILURE),
    }
}

/// Slave with one sensor per decoded reading, spread around the threshold.
fn simulated_device(config: &Config) -> SimulatedDevice {
    let acquisition = &config.acquisition;
    let sensors = match acquisition.encoding {
        RegisterEncoding::Tenths => acquisition.register_count,
        RegisterEncoding::Float32 => acquisition.register_count / 2,
    };
    let temperatures: Vec<f64> = (0..sensors)
        .map(|i| config.alert.threshold - 8.5 + f64::from(i))
        .collect();

    SimulatedDevice::with_temperatures(acquisition.start_address, &temperatures, acquisition.encoding)
        .with_jitter(match acquisition.encoding {
            RegisterEncoding::Tenths => 5,
            RegisterEncoding::Float32 => 0,
        })
}
