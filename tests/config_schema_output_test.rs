// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-modbus-temperature project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

use anyhow::Result;
use rust_modbus_temperature::config;

#[test]
fn test_config_schema_output() -> Result<()> {
    // The schema goes to stdout, only check that it is produced without error
    config::output_config_schema()?;
    Ok(())
}
