//! 统计模块
//!
//! 记录每个包的转发时延与往返时间，按需给出均值与 95% 置信区间，
//! 并根据发送日志估算隐蔽信道容量。

mod aggregator;
mod delay;
mod series;
mod summary;

pub use aggregator::{StatsAggregator, StatsSnapshot, channel_capacity};
pub use delay::DelayModel;
pub use series::SampleSeries;
pub use summary::{Summary, Z_95};
