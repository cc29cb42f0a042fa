//! 错误类型
//!
//! 中继启动阶段的错误（连接、订阅）是致命的；逐包处理中的错误只记录日志，
//! 该包按原样转发。

use std::path::PathBuf;

use thiserror::Error;

/// 中继操作的 Result 别名。
pub type Result<T> = std::result::Result<T, Error>;

/// 中继运行过程中可能出现的错误。
#[derive(Error, Debug)]
pub enum Error {
    /// 无法连接消息总线
    #[error("connection error: {0}")]
    Connection(String),

    /// 订阅入口主题失败
    #[error("subscription to '{subject}' failed: {reason}")]
    Subscription { subject: String, reason: String },

    /// 帧解析或重新序列化失败
    #[error("codec error: {0}")]
    Codec(String),

    /// 隐蔽数据注入失败
    #[error("injection error: {0}")]
    Injection(String),

    /// 发布到出口主题失败
    #[error("publish to '{subject}' failed: {reason}")]
    Publish { subject: String, reason: String },

    /// 结果快照写盘失败
    #[error("persistence error writing {}: {source}", .path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 快照序列化失败
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// 配置非法
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn codec(msg: impl Into<String>) -> Self {
        Error::Codec(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// 启动阶段错误会终止进程，其余错误只影响单个包或单次落盘。
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Connection(_) | Error::Subscription { .. })
    }
}
