// Tracked per-port metrics

/// The eight counters tracked for every port, in wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    PacketsSent,
    PacketsReceived,
    BytesSent,
    BytesReceived,
    PacketsRxDropped,
    PacketsTxDropped,
    PacketsRxErrors,
    PacketsTxErrors,
}

impl Metric {
    pub const COUNT: usize = 8;

    pub const ALL: [Metric; Metric::COUNT] = [
        Metric::PacketsSent,
        Metric::PacketsReceived,
        Metric::BytesSent,
        Metric::BytesReceived,
        Metric::PacketsRxDropped,
        Metric::PacketsTxDropped,
        Metric::PacketsRxErrors,
        Metric::PacketsTxErrors,
    ];

    /// Position in `ALL`; used to index per-port series arrays.
    pub fn index(self) -> usize {
        self as usize
    }
}
