//! 隐蔽包检测
//!
//! 判定 = 签名检查 OR 时序检查：
//! - 签名：IPv4 选项列表里出现 type 68
//! - 时序：与上一个处理过的包的到达间隔落在均值时延 ±10% 内

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::packet::{COVERT_OPTION_KIND, FrameSummary, ipv4_options};

/// 时序检查允许的相对偏差
pub const TIMING_TOLERANCE: f64 = 0.10;

/// 定长的检测历史，满了以后淘汰最旧的一条
#[derive(Debug)]
pub struct DetectionHistory {
    capacity: usize,
    entries: VecDeque<(FrameSummary, Duration)>,
}

impl DetectionHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, summary: FrameSummary, at: Duration) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back((summary, at));
    }

    pub fn last(&self) -> Option<&(FrameSummary, Duration)> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &(FrameSummary, Duration)> {
        self.entries.iter()
    }
}

/// 两路子信号
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub signature: bool,
    pub timing: bool,
}

impl Verdict {
    pub fn is_covert(&self) -> bool {
        self.signature || self.timing
    }
}

/// 混淆矩阵计数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfusionCounters {
    pub tp: u64,
    pub tn: u64,
    pub fp: u64,
    pub fn_: u64,
}

impl ConfusionCounters {
    pub fn record(&mut self, ground_truth: bool, verdict: bool) {
        match (ground_truth, verdict) {
            (true, true) => self.tp += 1,
            (false, false) => self.tn += 1,
            (false, true) => self.fp += 1,
            (true, false) => self.fn_ += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.tp + self.tn + self.fp + self.fn_
    }

    pub fn metrics(&self) -> DetectionMetrics {
        let ratio = |num: u64, den: u64| if den == 0 { 0.0 } else { num as f64 / den as f64 };
        let precision = ratio(self.tp, self.tp + self.fp);
        let recall = ratio(self.tp, self.tp + self.fn_);
        let f1 = if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        };
        DetectionMetrics {
            accuracy: ratio(self.tp + self.tn, self.total()),
            precision,
            recall,
            f1,
            tp: self.tp,
            tn: self.tn,
            fp: self.fp,
            fn_: self.fn_,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub tp: u64,
    pub tn: u64,
    pub fp: u64,
    #[serde(rename = "fn")]
    pub fn_: u64,
}

/// 隐蔽包检测器
#[derive(Debug)]
pub struct CovertDetector {
    mean_delay_secs: f64,
    history: Mutex<DetectionHistory>,
    counters: Mutex<ConfusionCounters>,
}

impl CovertDetector {
    pub fn new(mean_delay_secs: f64, history_capacity: usize) -> Self {
        Self {
            mean_delay_secs,
            history: Mutex::new(DetectionHistory::new(history_capacity)),
            counters: Mutex::new(ConfusionCounters::default()),
        }
    }

    fn history(&self) -> MutexGuard<'_, DetectionHistory> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn counter_guard(&self) -> MutexGuard<'_, ConfusionCounters> {
        self.counters.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 选项列表里是否有 type 68；无 IPv4 层或选项区无法解析时为 false
    pub fn signature_check(frame: &[u8]) -> bool {
        matches!(
            ipv4_options(frame),
            Ok(Some(opts)) if opts.iter().any(|o| o.kind == COVERT_OPTION_KIND)
        )
    }

    /// 到达间隔是否落在均值时延 ±10% 内
    pub fn timing_matches(&self, iat: Duration) -> bool {
        let iat = iat.as_secs_f64();
        (iat - self.mean_delay_secs).abs() <= TIMING_TOLERANCE * self.mean_delay_secs
    }

    /// 计算两路子信号，并把本包追加进历史。
    ///
    /// `received_at` 是相对于中继启动时刻的单调时间。
    pub fn inspect(&self, frame: &[u8], received_at: Duration) -> Verdict {
        let summary = FrameSummary::of(frame);
        let signature = summary.covert_option;

        let mut history = self.history();
        let timing = history
            .last()
            .is_some_and(|(_, prev)| self.timing_matches(received_at.abs_diff(*prev)));
        history.push(summary, received_at);

        Verdict { signature, timing }
    }

    pub fn classify(&self, frame: &[u8], received_at: Duration) -> bool {
        let verdict = self.inspect(frame, received_at);
        debug!(
            signature = verdict.signature,
            timing = verdict.timing,
            covert = verdict.is_covert(),
            "检测结果"
        );
        verdict.is_covert()
    }

    /// 按真值与判定结果累加一个混淆矩阵格子
    pub fn update(&self, ground_truth: bool, verdict: bool) {
        self.counter_guard().record(ground_truth, verdict);
    }

    pub fn counters(&self) -> ConfusionCounters {
        *self.counter_guard()
    }

    pub fn metrics(&self) -> DetectionMetrics {
        self.counter_guard().metrics()
    }

    pub fn history_len(&self) -> usize {
        self.history().len()
    }
}
