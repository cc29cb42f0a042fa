//! 样本均值与置信区间

use serde::{Deserialize, Serialize};

/// 95% 双侧正态分位数
pub const Z_95: f64 = 1.96;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Summary {
    pub avg: f64,
    pub ci95: f64,
}

impl Summary {
    /// 空序列均值为 0；少于两个样本时置信区间为 0。
    ///
    /// 置信区间半宽 = `1.96 * s / sqrt(n)`，`s` 为无偏（n-1）样本标准差。
    pub fn of(samples: &[f64]) -> Self {
        let n = samples.len();
        if n == 0 {
            return Self::default();
        }
        let avg = samples.iter().sum::<f64>() / n as f64;
        if n < 2 {
            return Self { avg, ci95: 0.0 };
        }
        let var = samples.iter().map(|x| (x - avg).powi(2)).sum::<f64>() / (n - 1) as f64;
        Self {
            avg,
            ci95: Z_95 * var.sqrt() / (n as f64).sqrt(),
        }
    }
}
