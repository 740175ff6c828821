// Domain models: source snapshot in, accumulated series out

mod metric;
mod series;
mod statistics;

pub use metric::Metric;
pub use series::{DeviceSeries, PortSeries, encode_payload};
pub use statistics::{DeviceStatistics, PortCounters, PortId, StatisticsSnapshot};
