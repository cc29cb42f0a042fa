//! 样本序列

use serde::{Deserialize, Serialize};

use super::summary::Summary;

/// 只追加的样本序列，顺序即处理顺序。
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SampleSeries {
    values: Vec<f64>,
}

impl SampleSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, v: f64) {
        self.values.push(v);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn summary(&self) -> Summary {
        Summary::of(&self.values)
    }
}

impl From<Vec<f64>> for SampleSeries {
    fn from(values: Vec<f64>) -> Self {
        Self { values }
    }
}
