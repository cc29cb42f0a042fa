//! 进程内消息总线

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tracing::trace;

use super::{BusMessage, MessageBus, Subscription};
use crate::error::{Error, Result};

type SubTable = HashMap<String, Vec<mpsc::UnboundedSender<BusMessage>>>;

#[derive(Debug, Default)]
struct Inner {
    subs: Mutex<SubTable>,
    closed: AtomicBool,
}

/// 按主题精确匹配分发；同一主题可以有多个订阅者。
///
/// clone 得到的是同一条总线的句柄。
#[derive(Debug, Clone, Default)]
pub struct MemoryBus {
    inner: Arc<Inner>,
}

impl MemoryBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn subs(&self) -> MutexGuard<'_, SubTable> {
        self.inner.subs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// 某主题当前仍存活的订阅数
    pub fn subscriber_count(&self, subject: &str) -> usize {
        self.subs()
            .get(subject)
            .map_or(0, |senders| senders.iter().filter(|tx| !tx.is_closed()).count())
    }

    /// 同步投递，返回收到消息的订阅者数量
    pub fn deliver(&self, subject: &str, payload: Vec<u8>) -> usize {
        let mut subs = self.subs();
        let Some(senders) = subs.get_mut(subject) else {
            return 0;
        };
        senders.retain(|tx| !tx.is_closed());
        for tx in senders.iter() {
            let _ = tx.send(BusMessage {
                subject: subject.to_string(),
                payload: payload.clone(),
            });
        }
        trace!(subject, receivers = senders.len(), "memory bus deliver");
        senders.len()
    }
}

impl MessageBus for MemoryBus {
    async fn subscribe(&self, subject: &str) -> Result<Subscription> {
        if self.is_closed() {
            return Err(Error::Subscription {
                subject: subject.to_string(),
                reason: "bus is closed".into(),
            });
        }
        let (tx, rx) = mpsc::unbounded_channel();
        self.subs().entry(subject.to_string()).or_default().push(tx);
        Ok(Subscription::new(subject, rx))
    }

    async fn publish(&self, subject: &str, payload: Vec<u8>) -> Result<()> {
        if self.is_closed() {
            return Err(Error::Publish {
                subject: subject.to_string(),
                reason: "bus is closed".into(),
            });
        }
        self.deliver(subject, payload);
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.inner.closed.store(true, Ordering::Release);
        self.subs().clear();
        Ok(())
    }
}
