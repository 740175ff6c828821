// Published wire format: accumulated series per device and port

use serde::{Deserialize, Serialize};

use super::PortId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSeries {
    pub id: String,
    pub ports: Vec<PortSeries>,
}

/// One port's history. Every metric vector has the same length; `timestamps` is the
/// store-wide label sequence and may be longer than the metric vectors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortSeries {
    pub id: PortId,
    pub timestamps: Vec<String>,
    pub packets_sent: Vec<u64>,
    pub packets_received: Vec<u64>,
    pub bytes_sent: Vec<u64>,
    pub bytes_received: Vec<u64>,
    pub packets_rx_dropped: Vec<u64>,
    pub packets_tx_dropped: Vec<u64>,
    pub packets_rx_errors: Vec<u64>,
    pub packets_tx_errors: Vec<u64>,
}

/// Serializes a rendered store into the text payload pushed to subscribers.
pub fn encode_payload(devices: &[DeviceSeries]) -> serde_json::Result<String> {
    serde_json::to_string(devices)
}
