//! 中继主流程
//!
//! 收包 → （可选）嵌入 → 检测 → 随机时延 → 转发 → 记录时延与 RTT。
//! `Relay` 驱动 `Idle → Connected → Running → Draining → Closed` 状态机。

mod pipeline;
mod runner;
mod state;
mod subject;

pub use pipeline::{PacketOutcome, RelayPipeline};
pub use runner::{Relay, RunSummary};
pub use state::RelayState;
pub use subject::{INBOUND_SUBJECTS, Ingress, IN_INSECURE, IN_SECURE, OUT_INSECURE, OUT_SECURE};
