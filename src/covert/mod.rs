//! 隐蔽信道
//!
//! - `CovertEncoder`：每个带 IPv4 层的包嵌入一个消息字节，记录发送日志
//! - `CovertDetector`：签名 + 到达间隔两路信号判定隐蔽包，维护混淆矩阵

mod detector;
mod encoder;

pub use detector::{
    ConfusionCounters, CovertDetector, DetectionHistory, DetectionMetrics, TIMING_TOLERANCE,
    Verdict,
};
pub use encoder::{CovertEncoder, EmissionRecord, unix_now};
