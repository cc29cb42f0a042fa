//! 中继配置
//!
//! 每个选项都可以通过命令行或同名环境变量给出，容器里只设环境变量即可启动。

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use clap::builder::BoolishValueParser;

use crate::error::{Error, Result};

pub const DEFAULT_NATS_URL: &str = "nats://nats:4222";
pub const DEFAULT_MEAN_DELAY_SECS: f64 = 5e-6;
pub const DEFAULT_COVERT_MESSAGE: &str = "HELLO";

#[derive(Debug, Clone, Parser)]
#[command(
    name = "covert_relay",
    about = "Relay Ethernet frames between NATS subjects, embed and detect covert IP options"
)]
pub struct RelayConfig {
    /// NATS 服务器地址（逗号分隔时取第一个）
    #[arg(long, env = "NATS_SURVEYOR_SERVERS", default_value = DEFAULT_NATS_URL)]
    pub nats_url: String,

    /// 转发时延的均值（秒），时延服从指数分布
    #[arg(long, env = "MEAN_DELAY", default_value_t = DEFAULT_MEAN_DELAY_SECS)]
    pub mean_delay: f64,

    /// 是否开启隐蔽信道注入
    #[arg(
        long,
        env = "COVERT_ENABLED",
        default_value_t = false,
        action = clap::ArgAction::Set,
        value_parser = BoolishValueParser::new()
    )]
    pub covert: bool,

    /// 要隐藏的消息（仅限 ASCII，每个包携带一个字节）
    #[arg(long, env = "COVERT_MESSAGE", default_value = DEFAULT_COVERT_MESSAGE)]
    pub covert_message: String,

    /// 周期性落盘间隔（秒）
    #[arg(long, env = "FLUSH_INTERVAL_SECS", default_value_t = 60)]
    pub flush_interval_secs: u64,

    /// 检测器保留的历史包数量
    #[arg(long, env = "HISTORY_CAPACITY", default_value_t = 100)]
    pub history_capacity: usize,

    #[arg(long, env = "RESULTS_PATH", default_value = "results.json")]
    pub results_path: PathBuf,

    #[arg(long, env = "COVERT_LOG_PATH", default_value = "covert_log.json")]
    pub covert_log_path: PathBuf,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            nats_url: DEFAULT_NATS_URL.to_string(),
            mean_delay: DEFAULT_MEAN_DELAY_SECS,
            covert: false,
            covert_message: DEFAULT_COVERT_MESSAGE.to_string(),
            flush_interval_secs: 60,
            history_capacity: 100,
            results_path: PathBuf::from("results.json"),
            covert_log_path: PathBuf::from("covert_log.json"),
        }
    }
}

impl RelayConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.mean_delay.is_finite() || self.mean_delay <= 0.0 {
            return Err(Error::config(format!(
                "mean_delay must be a positive number of seconds, got {}",
                self.mean_delay
            )));
        }
        if self.flush_interval_secs == 0 {
            return Err(Error::config("flush_interval_secs must be > 0"));
        }
        if self.history_capacity == 0 {
            return Err(Error::config("history_capacity must be > 0"));
        }
        if self.covert && self.covert_message.is_empty() {
            return Err(Error::config("covert mode needs a non-empty covert_message"));
        }
        // 每个包只带一个字节，发送日志按字节还原字符
        if self.covert && !self.covert_message.is_ascii() {
            return Err(Error::config(format!(
                "covert_message must be ASCII, got {:?}",
                self.covert_message
            )));
        }
        Ok(())
    }

    /// 实际使用的服务器地址
    pub fn primary_server(&self) -> &str {
        self.nats_url
            .split(',')
            .map(str::trim)
            .find(|s| !s.is_empty())
            .unwrap_or(DEFAULT_NATS_URL)
    }

    pub fn flush_interval(&self) -> Duration {
        Duration::from_secs(self.flush_interval_secs)
    }
}
