//! NATS 消息总线，基于 `async-nats` 客户端

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace};

use super::{BusMessage, MessageBus, Subscription};
use crate::error::{Error, Result};

/// 把 URL 里的 `user:pass@` / token 换成 `***@`，用于日志与错误信息
pub fn redact_url(url: &str) -> String {
    let (scheme, rest) = match url.split_once("://") {
        Some((scheme, rest)) => (Some(scheme), rest),
        None => (None, url),
    };
    let rest = match rest.rsplit_once('@') {
        Some((_, host)) => format!("***@{host}"),
        None => rest.to_string(),
    };
    match scheme {
        Some(scheme) => format!("{scheme}://{rest}"),
        None => rest,
    }
}

/// 单连接 NATS 客户端。
///
/// URL 中的用户名密码（或 token）会带进 CONNECT；`tls://` 地址走 TLS。
/// 每个订阅由一个转发任务搬进 mpsc 通道，关闭时一并中止。
#[derive(Debug)]
pub struct NatsBus {
    url: String,
    client: async_nats::Client,
    forwarders: Mutex<Vec<JoinHandle<()>>>,
    closed: AtomicBool,
}

impl NatsBus {
    pub async fn connect(url: &str) -> Result<Self> {
        let shown = redact_url(url);
        let client = async_nats::connect(url)
            .await
            .map_err(|e| Error::Connection(format!("{shown}: {e}")))?;
        info!(url = %shown, "🔌 已连接 NATS");
        Ok(Self {
            url: shown,
            client,
            forwarders: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        })
    }

    /// 去掉凭据后的服务器地址
    pub fn url(&self) -> &str {
        &self.url
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl MessageBus for NatsBus {
    async fn subscribe(&self, subject: &str) -> Result<Subscription> {
        let sub_err = |reason: String| Error::Subscription {
            subject: subject.to_string(),
            reason,
        };
        if self.is_closed() {
            return Err(sub_err("connection is closed".into()));
        }

        let mut subscriber = self
            .client
            .subscribe(subject.to_string())
            .await
            .map_err(|e| sub_err(e.to_string()))?;

        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(async move {
            while let Some(msg) = subscriber.next().await {
                let msg = BusMessage {
                    subject: msg.subject.to_string(),
                    payload: msg.payload.to_vec(),
                };
                if tx.send(msg).is_err() {
                    break;
                }
            }
        });
        self.forwarders
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(handle);

        debug!(subject, "已订阅");
        Ok(Subscription::new(subject, rx))
    }

    async fn publish(&self, subject: &str, payload: Vec<u8>) -> Result<()> {
        let pub_err = |reason: String| Error::Publish {
            subject: subject.to_string(),
            reason,
        };
        if self.is_closed() {
            return Err(pub_err("connection is closed".into()));
        }
        trace!(subject, bytes = payload.len(), "PUB");
        self.client
            .publish(subject.to_string(), payload.into())
            .await
            .map_err(|e| pub_err(e.to_string()))
    }

    /// 中止订阅转发（随之退订），把已排队的 PUB 刷出去
    async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        let forwarders =
            std::mem::take(&mut *self.forwarders.lock().unwrap_or_else(PoisonError::into_inner));
        for handle in forwarders {
            handle.abort();
        }
        self.client
            .flush()
            .await
            .map_err(|e| Error::Connection(format!("{}: {e}", self.url)))?;
        info!(url = %self.url, "NATS 连接已关闭");
        Ok(())
    }
}
