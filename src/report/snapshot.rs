//! 结果快照

use serde::{Deserialize, Serialize};

use crate::covert::{CovertDetector, CovertEncoder, DetectionMetrics};
use crate::stats::{StatsAggregator, channel_capacity};

/// `results.json` 的内容。字段名与离线绘图脚本读取的键一致。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultsSnapshot {
    pub delays: Vec<f64>,
    pub rtts: Vec<f64>,
    pub delay_avg: f64,
    pub delay_ci_95: f64,
    pub rtt_avg: f64,
    pub rtt_ci_95: f64,
    /// 仅在隐蔽模式下出现
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub covert_channel_capacity_bps: Option<f64>,
    pub detection: DetectionMetrics,
}

impl ResultsSnapshot {
    pub fn collect(
        stats: &StatsAggregator,
        detector: &CovertDetector,
        encoder: Option<&CovertEncoder>,
    ) -> Self {
        let s = stats.snapshot();
        Self {
            delay_avg: s.delay.avg,
            delay_ci_95: s.delay.ci95,
            rtt_avg: s.rtt.avg,
            rtt_ci_95: s.rtt.ci95,
            delays: s.delays,
            rtts: s.rtts,
            covert_channel_capacity_bps: encoder.map(|e| channel_capacity(&e.emission_log())),
            detection: detector.metrics(),
        }
    }
}
