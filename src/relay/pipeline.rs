//! 单包处理流程

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, warn};

use super::subject::Ingress;
use crate::bus::{BusMessage, MessageBus};
use crate::covert::{CovertDetector, CovertEncoder};
use crate::error::Result;
use crate::stats::{DelayModel, StatsAggregator};

/// 一个包处理完后的结果
#[derive(Debug, Clone, PartialEq)]
pub struct PacketOutcome {
    pub ingress: Ingress,
    pub outbound: &'static str,
    pub embedded: bool,
    pub covert: bool,
    pub delay: Duration,
    pub rtt: Duration,
}

/// 收包 → 嵌入 → 检测 → 时延 → 转发。
///
/// 共享状态（编码器、检测器、统计）各自加锁，锁不会跨越 `.await`。
pub struct RelayPipeline<B> {
    bus: Arc<B>,
    encoder: Option<Arc<CovertEncoder>>,
    detector: Arc<CovertDetector>,
    stats: Arc<StatsAggregator>,
    delay: DelayModel,
    covert_enabled: bool,
    rng: Mutex<StdRng>,
    epoch: Instant,
    relayed: AtomicU64,
    failed: AtomicU64,
}

impl<B: MessageBus> RelayPipeline<B> {
    /// `encoder` 为 `Some` 即表示本次运行开启了隐蔽模式
    pub fn new(
        bus: Arc<B>,
        encoder: Option<Arc<CovertEncoder>>,
        detector: Arc<CovertDetector>,
        stats: Arc<StatsAggregator>,
        delay: DelayModel,
    ) -> Self {
        let covert_enabled = encoder.is_some();
        Self {
            bus,
            encoder,
            detector,
            stats,
            delay,
            covert_enabled,
            rng: Mutex::new(StdRng::from_entropy()),
            epoch: Instant::now(),
            relayed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }

    /// 固定随机种子，便于复现时延序列
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    pub fn relayed(&self) -> u64 {
        self.relayed.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    fn sample_delay(&self) -> Duration {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        self.delay.sample(&mut *rng)
    }

    fn embed(&self, payload: Vec<u8>) -> (Vec<u8>, bool) {
        let Some(encoder) = &self.encoder else {
            return (payload, false);
        };
        match encoder.encode(&payload) {
            Ok(Some(frame)) => (frame, true),
            Ok(None) => {
                debug!(cursor = encoder.cursor(), "帧原样通过");
                (payload, false)
            }
            Err(e) => {
                warn!(error = %e, "嵌入失败，转发原始帧");
                (payload, false)
            }
        }
    }

    /// 处理一个包。出错时返回错误，调用方决定如何记录。
    #[tracing::instrument(skip(self, msg), fields(subject = %msg.subject, bytes = msg.payload.len()))]
    pub async fn handle(&self, msg: BusMessage) -> Result<PacketOutcome> {
        let received = Instant::now();
        let ingress = Ingress::from_subject(&msg.subject);

        let (payload, embedded) = self.embed(msg.payload);

        let covert = self
            .detector
            .classify(&payload, received.duration_since(self.epoch));
        self.detector.update(self.covert_enabled, covert);

        let delay = self.sample_delay();
        tokio::time::sleep(delay).await;
        let rtt = received.elapsed();
        self.stats.record_delay(delay.as_secs_f64());
        self.stats.record_rtt(rtt.as_secs_f64());

        let outbound = ingress.outbound();
        self.bus.publish(outbound, payload).await?;

        debug!(
            ?ingress,
            outbound,
            embedded,
            covert,
            delay_us = delay.as_secs_f64() * 1e6,
            rtt_us = rtt.as_secs_f64() * 1e6,
            "📤 已转发"
        );
        Ok(PacketOutcome {
            ingress,
            outbound,
            embedded,
            covert,
            delay,
            rtt,
        })
    }

    /// 处理一个包并吞掉错误：逐包错误只记日志，不影响后续包。
    pub async fn process(&self, msg: BusMessage) -> Option<PacketOutcome> {
        let subject = msg.subject.clone();
        match self.handle(msg).await {
            Ok(outcome) => {
                self.relayed.fetch_add(1, Ordering::Relaxed);
                Some(outcome)
            }
            Err(e) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                warn!(%subject, error = %e, "包处理失败");
                None
            }
        }
    }
}
