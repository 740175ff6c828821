// In-memory series store keyed by device and port. Owned by the poll loop; no locking.

use crate::models::{DeviceSeries, Metric, PortCounters, PortId, PortSeries, StatisticsSnapshot};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// What happens to a known port that is missing from a snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapPolicy {
    /// Skip the port for that cycle. Its series fall behind the shared timestamps.
    #[default]
    Preserve,
    /// Repeat the port's last sample so it stays aligned with the timestamps.
    CarryForward,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StoreOptions {
    pub gap_policy: GapPolicy,
    /// Keep at most this many points per sequence (oldest dropped first). `None` = unbounded.
    pub max_points: Option<usize>,
}

/// Snapshot rejected before any mutation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngestError {
    #[error("device {0} listed more than once in snapshot")]
    DuplicateDevice(String),
    #[error("port {port} listed more than once for device {device}")]
    DuplicatePort { device: String, port: PortId },
}

#[derive(Debug, Clone)]
pub struct PortRecord {
    id: PortId,
    series: [Vec<u64>; Metric::COUNT],
    last_seen_cycle: u64,
}

impl PortRecord {
    fn new(id: PortId) -> Self {
        Self {
            id,
            series: Default::default(),
            last_seen_cycle: 0,
        }
    }

    pub fn id(&self) -> &PortId {
        &self.id
    }

    pub fn series(&self, metric: Metric) -> &[u64] {
        &self.series[metric.index()]
    }

    /// Number of samples; identical across all eight metrics.
    pub fn len(&self) -> usize {
        self.series[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&mut self, counters: &PortCounters, cycle: u64) {
        for metric in Metric::ALL {
            self.series[metric.index()].push(counters.value(metric));
        }
        self.last_seen_cycle = cycle;
    }

    fn repeat_last(&mut self) {
        if self.is_empty() {
            return;
        }
        for s in &mut self.series {
            if let Some(&last) = s.last() {
                s.push(last);
            }
        }
    }

    fn trim_front(&mut self, max_points: usize) {
        for s in &mut self.series {
            trim_front(s, max_points);
        }
    }

    fn render(&self, timestamps: &[String]) -> PortSeries {
        let take = |m: Metric| self.series[m.index()].clone();
        PortSeries {
            id: self.id.clone(),
            timestamps: timestamps.to_vec(),
            packets_sent: take(Metric::PacketsSent),
            packets_received: take(Metric::PacketsReceived),
            bytes_sent: take(Metric::BytesSent),
            bytes_received: take(Metric::BytesReceived),
            packets_rx_dropped: take(Metric::PacketsRxDropped),
            packets_tx_dropped: take(Metric::PacketsTxDropped),
            packets_rx_errors: take(Metric::PacketsRxErrors),
            packets_tx_errors: take(Metric::PacketsTxErrors),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DeviceRecord {
    id: String,
    ports: Vec<PortRecord>,
    index: HashMap<PortId, usize>,
}

impl DeviceRecord {
    fn new(id: String) -> Self {
        Self {
            id,
            ports: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn port(&self, id: &PortId) -> Option<&PortRecord> {
        self.index.get(id).map(|&i| &self.ports[i])
    }

    /// Ports in first-seen order.
    pub fn ports(&self) -> impl Iterator<Item = &PortRecord> {
        self.ports.iter()
    }

    /// Returns the port record, creating an empty one on first sighting.
    pub fn port_mut_or_insert(&mut self, id: &PortId) -> &mut PortRecord {
        let i = match self.index.get(id) {
            Some(&i) => i,
            None => {
                self.ports.push(PortRecord::new(id.clone()));
                self.index.insert(id.clone(), self.ports.len() - 1);
                self.ports.len() - 1
            }
        };
        &mut self.ports[i]
    }
}

#[derive(Debug, Clone, Default)]
pub struct SeriesStore {
    options: StoreOptions,
    timestamps: Vec<String>,
    devices: Vec<DeviceRecord>,
    index: HashMap<String, usize>,
    cycles: u64,
}

impl SeriesStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: StoreOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Successful ingestions since creation (not reduced by `max_points` trimming).
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn timestamps(&self) -> &[String] {
        &self.timestamps
    }

    pub fn device(&self, id: &str) -> Option<&DeviceRecord> {
        self.index.get(id).map(|&i| &self.devices[i])
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    pub fn port_count(&self) -> usize {
        self.devices.iter().map(|d| d.ports.len()).sum()
    }

    /// Returns the device record, creating an empty one on first sighting.
    pub fn device_mut_or_insert(&mut self, id: &str) -> &mut DeviceRecord {
        let i = match self.index.get(id) {
            Some(&i) => i,
            None => {
                self.devices.push(DeviceRecord::new(id.to_string()));
                self.index.insert(id.to_string(), self.devices.len() - 1);
                self.devices.len() - 1
            }
        };
        &mut self.devices[i]
    }

    /// Appends one timestamp and one sample per metric for every port in `snapshot`.
    /// All-or-nothing: a rejected snapshot leaves the store untouched.
    pub fn ingest_snapshot(
        &mut self,
        snapshot: &StatisticsSnapshot,
        timestamp: impl Into<String>,
    ) -> Result<(), IngestError> {
        validate(snapshot)?;

        self.cycles += 1;
        let cycle = self.cycles;
        self.timestamps.push(timestamp.into());

        for device in &snapshot.statistics {
            let record = self.device_mut_or_insert(&device.device);
            for counters in &device.ports {
                record.port_mut_or_insert(&counters.port).push(counters, cycle);
            }
        }

        if self.options.gap_policy == GapPolicy::CarryForward {
            for port in self.devices.iter_mut().flat_map(|d| d.ports.iter_mut()) {
                if port.last_seen_cycle != cycle {
                    port.repeat_last();
                }
            }
        }

        if let Some(max_points) = self.options.max_points {
            trim_front(&mut self.timestamps, max_points);
            for port in self.devices.iter_mut().flat_map(|d| d.ports.iter_mut()) {
                port.trim_front(max_points);
            }
        }

        Ok(())
    }

    /// Devices and ports in first-seen order. Pure read.
    pub fn render(&self) -> Vec<DeviceSeries> {
        self.devices
            .iter()
            .map(|d| DeviceSeries {
                id: d.id.clone(),
                ports: d.ports.iter().map(|p| p.render(&self.timestamps)).collect(),
            })
            .collect()
    }
}

fn validate(snapshot: &StatisticsSnapshot) -> Result<(), IngestError> {
    let mut devices = HashSet::with_capacity(snapshot.statistics.len());
    for device in &snapshot.statistics {
        if !devices.insert(device.device.as_str()) {
            return Err(IngestError::DuplicateDevice(device.device.clone()));
        }
        let mut ports = HashSet::with_capacity(device.ports.len());
        for counters in &device.ports {
            if !ports.insert(&counters.port) {
                return Err(IngestError::DuplicatePort {
                    device: device.device.clone(),
                    port: counters.port.clone(),
                });
            }
        }
    }
    Ok(())
}

fn trim_front<T>(v: &mut Vec<T>, max_points: usize) {
    if v.len() > max_points {
        let excess = v.len() - max_points;
        v.drain(..excess);
    }
}
