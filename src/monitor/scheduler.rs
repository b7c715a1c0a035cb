// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-modbus-temperature project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Pacing of the poll cycles

use std::time::Duration;

use async_trait::async_trait;
use tokio::time;

/// Decides when the next poll cycle starts.
#[async_trait]
pub trait Scheduler: Send {
    /// Resolves when the next cycle is due.
    async fn wait_next_cycle(&mut self);
}

/// Fixed delay between the end of a cycle and the start of the next one.
#[derive(Debug, Clone)]
pub struct IntervalScheduler {
    interval: Duration,
}

impl IntervalScheduler {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

#[async_trait]
impl Scheduler for IntervalScheduler {
    async fn wait_next_cycle(&mut self) {
        time::sleep(self.interval).await;
    }
}
