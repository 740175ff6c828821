// Shared test helpers
#![allow(dead_code)]

use portpulse::models::*;
use portpulse::source::{MetricsSource, SourceError};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Counters for one port; packets/bytes sent as given, everything else zero.
pub fn port(id: &str, packets_sent: u64, bytes_sent: u64) -> PortCounters {
    PortCounters {
        packets_sent,
        bytes_sent,
        ..PortCounters::zeroed(id)
    }
}

pub fn device(id: &str, ports: Vec<PortCounters>) -> DeviceStatistics {
    DeviceStatistics {
        device: id.to_string(),
        ports,
    }
}

pub fn snapshot(devices: Vec<DeviceStatistics>) -> StatisticsSnapshot {
    StatisticsSnapshot {
        statistics: devices,
    }
}

/// Source that replays a fixed script of fetch results, then fails with 503.
pub struct ScriptedSource {
    script: Mutex<VecDeque<Result<StatisticsSnapshot, SourceError>>>,
}

impl ScriptedSource {
    pub fn new(script: Vec<Result<StatisticsSnapshot, SourceError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
        }
    }
}

pub fn unavailable() -> SourceError {
    SourceError::Status(reqwest::StatusCode::SERVICE_UNAVAILABLE)
}

impl MetricsSource for ScriptedSource {
    async fn fetch(&self) -> Result<StatisticsSnapshot, SourceError> {
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Err(unavailable()))
    }
}
