//! 快照写盘

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use super::snapshot::ResultsSnapshot;
use crate::config::RelayConfig;
use crate::covert::{CovertDetector, CovertEncoder};
use crate::error::{Error, Result};
use crate::stats::StatsAggregator;

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// 序列化为带缩进的 JSON，经临时文件 rename 覆盖目标
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    let tmp = tmp_path(path);
    fs::write(&tmp, json).map_err(|source| Error::Persistence {
        path: tmp.clone(),
        source,
    })?;
    fs::rename(&tmp, path).map_err(|source| Error::Persistence {
        path: path.to_path_buf(),
        source,
    })
}

#[derive(Debug, Clone)]
pub struct Reporter {
    results_path: PathBuf,
    covert_log_path: PathBuf,
}

impl Reporter {
    pub fn new(results_path: impl Into<PathBuf>, covert_log_path: impl Into<PathBuf>) -> Self {
        Self {
            results_path: results_path.into(),
            covert_log_path: covert_log_path.into(),
        }
    }

    pub fn from_config(config: &RelayConfig) -> Self {
        Self::new(&config.results_path, &config.covert_log_path)
    }

    pub fn results_path(&self) -> &Path {
        &self.results_path
    }

    pub fn covert_log_path(&self) -> &Path {
        &self.covert_log_path
    }

    /// 写出结果快照；隐蔽模式下另写发送日志
    pub fn flush(
        &self,
        stats: &StatsAggregator,
        detector: &CovertDetector,
        encoder: Option<&CovertEncoder>,
    ) -> Result<ResultsSnapshot> {
        let snapshot = ResultsSnapshot::collect(stats, detector, encoder);
        write_json_atomic(&self.results_path, &snapshot)?;

        if let Some(encoder) = encoder {
            let log = encoder.emission_log();
            write_json_atomic(&self.covert_log_path, &log)?;
        }

        info!(
            path = %self.results_path.display(),
            packets = snapshot.delays.len(),
            delay_avg = snapshot.delay_avg,
            rtt_avg = snapshot.rtt_avg,
            accuracy = snapshot.detection.accuracy,
            capacity_bps = ?snapshot.covert_channel_capacity_bps,
            "💾 结果已写入"
        );
        Ok(snapshot)
    }
}
