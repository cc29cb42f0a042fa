//! 消息总线
//!
//! 中继只需要 subscribe / publish / close 三个操作。`NatsBus` 通过 async-nats 连接真实的
//! NATS 服务器，`MemoryBus` 在进程内分发，供测试与本地演示使用。

mod memory;
mod nats;

use std::future::Future;

use tokio::sync::mpsc;

use crate::error::Result;

pub use memory::MemoryBus;
pub use nats::{NatsBus, redact_url};

/// 总线上的一条消息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusMessage {
    pub subject: String,
    pub payload: Vec<u8>,
}

/// 一个订阅：总线关闭或订阅被丢弃后 `next` 返回 `None`
#[derive(Debug)]
pub struct Subscription {
    subject: String,
    rx: mpsc::UnboundedReceiver<BusMessage>,
}

impl Subscription {
    pub(crate) fn new(subject: impl Into<String>, rx: mpsc::UnboundedReceiver<BusMessage>) -> Self {
        Self {
            subject: subject.into(),
            rx,
        }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub async fn next(&mut self) -> Option<BusMessage> {
        self.rx.recv().await
    }
}

/// 消息总线抽象
pub trait MessageBus: Send + Sync + 'static {
    fn subscribe(&self, subject: &str) -> impl Future<Output = Result<Subscription>> + Send;

    /// 发出即返回，不等待对端确认
    fn publish(&self, subject: &str, payload: Vec<u8>)
    -> impl Future<Output = Result<()>> + Send;

    /// 关闭连接，结束所有订阅
    fn close(&self) -> impl Future<Output = Result<()>> + Send;
}
