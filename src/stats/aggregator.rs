//! 时延 / RTT 样本聚合

use std::sync::{Mutex, PoisonError};

use super::series::SampleSeries;
use super::summary::Summary;
use crate::covert::EmissionRecord;

#[derive(Debug, Default)]
struct Samples {
    delays: SampleSeries,
    rtts: SampleSeries,
}

/// 运行期样本序列，按处理顺序追加，不做截断。
#[derive(Debug, Default)]
pub struct StatsAggregator {
    inner: Mutex<Samples>,
}

/// 某一时刻的样本副本与摘要
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StatsSnapshot {
    pub delays: Vec<f64>,
    pub rtts: Vec<f64>,
    pub delay: Summary,
    pub rtt: Summary,
}

impl StatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    fn samples(&self) -> std::sync::MutexGuard<'_, Samples> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 记录一次转发时延（秒）
    pub fn record_delay(&self, secs: f64) {
        self.samples().delays.push(secs);
    }

    /// 记录一次往返时间（秒）
    pub fn record_rtt(&self, secs: f64) {
        self.samples().rtts.push(secs);
    }

    pub fn delay_summary(&self) -> Summary {
        self.samples().delays.summary()
    }

    pub fn rtt_summary(&self) -> Summary {
        self.samples().rtts.summary()
    }

    pub fn delay_count(&self) -> usize {
        self.samples().delays.len()
    }

    pub fn rtt_count(&self) -> usize {
        self.samples().rtts.len()
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let s = self.samples();
        StatsSnapshot {
            delays: s.delays.values().to_vec(),
            rtts: s.rtts.values().to_vec(),
            delay: s.delays.summary(),
            rtt: s.rtts.summary(),
        }
    }
}

/// 隐蔽信道容量（bit/s）：`8 * n / (t_last - t_first)`。
///
/// 少于两条发送记录或时间跨度不为正时返回 0。
pub fn channel_capacity(log: &[EmissionRecord]) -> f64 {
    let (Some(first), Some(last)) = (log.first(), log.last()) else {
        return 0.0;
    };
    if log.len() < 2 {
        return 0.0;
    }
    let elapsed = last.timestamp - first.timestamp;
    if elapsed <= 0.0 {
        return 0.0;
    }
    8.0 * log.len() as f64 / elapsed
}
