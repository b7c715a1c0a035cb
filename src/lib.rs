// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-modbus-temperature project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Rust Modbus temperature library
//!
//! This library polls a Modbus RTU temperature module over a serial line,
//! decodes its holding registers into temperatures and raises threshold alerts.

pub mod config;
pub mod modbus;
pub mod monitor;
pub mod temperature;
