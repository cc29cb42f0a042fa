//! 结果落盘
//!
//! 每次 flush 都整体覆盖上一次的快照（先写临时文件再 rename），
//! 中途失败不会留下半截 JSON。

mod snapshot;
mod writer;

pub use snapshot::ResultsSnapshot;
pub use writer::{Reporter, write_json_atomic};
