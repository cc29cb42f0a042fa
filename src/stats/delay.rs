//! 转发时延模型

use std::time::Duration;

use rand::Rng;

/// 指数分布时延，速率为 `1 / mean`。
#[derive(Debug, Clone, Copy)]
pub struct DelayModel {
    mean_secs: f64,
}

impl DelayModel {
    pub fn new(mean_secs: f64) -> Self {
        Self { mean_secs }
    }

    pub fn mean_secs(&self) -> f64 {
        self.mean_secs
    }

    /// 逆变换采样：`-ln(1 - U) * mean`，`U ∈ [0, 1)`，结果以秒计。
    pub fn sample_secs<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let u: f64 = rng.r#gen();
        let secs = -(1.0 - u).ln() * self.mean_secs;
        // u == 0 时得到 -0.0
        if secs > 0.0 { secs } else { 0.0 }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        Duration::from_secs_f64(self.sample_secs(rng))
    }
}
