// Controller port-statistics body (what the metrics source returns)

use serde::{Deserialize, Serialize};
use std::fmt;

use super::Metric;

/// Port identifier as reported by the controller. Kept in its original JSON type so it is
/// re-emitted unchanged; `"1"` and `1` are different ports.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PortId {
    Number(u64),
    Name(String),
}

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortId::Number(n) => write!(f, "{}", n),
            PortId::Name(s) => f.write_str(s),
        }
    }
}

impl From<&str> for PortId {
    fn from(s: &str) -> Self {
        PortId::Name(s.to_string())
    }
}

impl From<u64> for PortId {
    fn from(n: u64) -> Self {
        PortId::Number(n)
    }
}

/// One fetch result: every device the controller knows about.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatisticsSnapshot {
    pub statistics: Vec<DeviceStatistics>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceStatistics {
    pub device: String,
    pub ports: Vec<PortCounters>,
}

/// Raw counters for one port. All eight are required; a body missing any of them fails to decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortCounters {
    pub port: PortId,
    pub packets_sent: u64,
    pub packets_received: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
    pub packets_rx_dropped: u64,
    pub packets_tx_dropped: u64,
    pub packets_rx_errors: u64,
    pub packets_tx_errors: u64,
}

impl PortCounters {
    /// All-zero counters for `port`.
    pub fn zeroed(port: impl Into<PortId>) -> Self {
        Self {
            port: port.into(),
            packets_sent: 0,
            packets_received: 0,
            bytes_sent: 0,
            bytes_received: 0,
            packets_rx_dropped: 0,
            packets_tx_dropped: 0,
            packets_rx_errors: 0,
            packets_tx_errors: 0,
        }
    }

    pub fn value(&self, metric: Metric) -> u64 {
        match metric {
            Metric::PacketsSent => self.packets_sent,
            Metric::PacketsReceived => self.packets_received,
            Metric::BytesSent => self.bytes_sent,
            Metric::BytesReceived => self.bytes_received,
            Metric::PacketsRxDropped => self.packets_rx_dropped,
            Metric::PacketsTxDropped => self.packets_tx_dropped,
            Metric::PacketsRxErrors => self.packets_rx_errors,
            Metric::PacketsTxErrors => self.packets_tx_errors,
        }
    }
}
