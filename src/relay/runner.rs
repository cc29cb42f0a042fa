//! 中继运行器：生命周期状态机 + 周期落盘

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::pipeline::RelayPipeline;
use super::state::RelayState;
use super::subject::INBOUND_SUBJECTS;
use crate::bus::{MessageBus, Subscription, redact_url};
use crate::config::RelayConfig;
use crate::covert::{CovertDetector, CovertEncoder};
use crate::error::{Error, Result};
use crate::report::Reporter;
use crate::stats::{DelayModel, StatsAggregator};

/// 一次运行的收尾信息
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub relayed: u64,
    pub failed: u64,
    pub flushes: u64,
    pub final_state: RelayState,
}

/// 中继进程的顶层对象，持有所有跨包共享的状态。
pub struct Relay {
    config: RelayConfig,
    state: RelayState,
    encoder: Option<Arc<CovertEncoder>>,
    detector: Arc<CovertDetector>,
    stats: Arc<StatsAggregator>,
    reporter: Reporter,
    seed: Option<u64>,
}

impl Relay {
    pub fn new(config: RelayConfig) -> Result<Self> {
        config.validate()?;
        let encoder = config
            .covert
            .then(|| Arc::new(CovertEncoder::new(config.covert_message.as_bytes())));
        let detector = Arc::new(CovertDetector::new(
            config.mean_delay,
            config.history_capacity,
        ));
        Ok(Self {
            reporter: Reporter::from_config(&config),
            config,
            state: RelayState::Idle,
            encoder,
            detector,
            stats: Arc::new(StatsAggregator::new()),
            seed: None,
        })
    }

    /// 固定时延采样的随机种子
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn state(&self) -> RelayState {
        self.state
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    pub fn encoder(&self) -> Option<&Arc<CovertEncoder>> {
        self.encoder.as_ref()
    }

    pub fn detector(&self) -> &Arc<CovertDetector> {
        &self.detector
    }

    pub fn stats(&self) -> &Arc<StatsAggregator> {
        &self.stats
    }

    pub fn reporter(&self) -> &Reporter {
        &self.reporter
    }

    fn transition(&mut self, next: RelayState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {} -> {}",
            self.state,
            next
        );
        info!(from = %self.state, to = %next, "🔁 状态迁移");
        self.state = next;
    }

    /// 落盘失败只记错误日志，不中断中继
    fn flush_logged(&self) -> bool {
        match self
            .reporter
            .flush(&self.stats, &self.detector, self.encoder.as_deref())
        {
            Ok(_) => true,
            Err(e) => {
                error!(error = %e, "❌ 结果落盘失败");
                false
            }
        }
    }

    /// 连接总线、订阅两个入口主题并开始转发，直到 `shutdown` 完成。
    ///
    /// 连接或订阅失败时进入 `Closed` 并返回错误；否则在停止后做最后一次落盘、
    /// 关闭连接，返回运行摘要。
    pub async fn run<B, C, S>(&mut self, connect: C, shutdown: S) -> Result<RunSummary>
    where
        B: MessageBus,
        C: Future<Output = Result<B>>,
        S: Future<Output = ()>,
    {
        if self.state != RelayState::Idle {
            return Err(Error::config(format!(
                "relay can only start from idle, currently {}",
                self.state
            )));
        }

        let bus = match connect.await {
            Ok(bus) => Arc::new(bus),
            Err(e) => {
                error!(
                    error = %e,
                    url = %redact_url(self.config.primary_server()),
                    "❌ 无法连接消息总线"
                );
                self.transition(RelayState::Closed);
                return Err(e);
            }
        };
        self.transition(RelayState::Connected);

        let mut subs: Vec<Subscription> = Vec::with_capacity(INBOUND_SUBJECTS.len());
        for subject in INBOUND_SUBJECTS {
            match bus.subscribe(subject).await {
                Ok(sub) => subs.push(sub),
                Err(e) => {
                    error!(subject, error = %e, "❌ 订阅失败");
                    if let Err(e) = bus.close().await {
                        warn!(error = %e, "关闭连接失败");
                    }
                    self.transition(RelayState::Closed);
                    return Err(e);
                }
            }
        }
        info!(subjects = ?INBOUND_SUBJECTS, "已订阅入口主题");

        let mut pipeline = RelayPipeline::new(
            Arc::clone(&bus),
            self.encoder.clone(),
            Arc::clone(&self.detector),
            Arc::clone(&self.stats),
            DelayModel::new(self.config.mean_delay),
        );
        if let Some(seed) = self.seed {
            pipeline = pipeline.with_seed(seed);
        }
        let pipeline = Arc::new(pipeline);

        let (stop_tx, stop_rx) = watch::channel(false);
        let mut workers = JoinSet::new();
        for sub in subs {
            workers.spawn(worker(sub, Arc::clone(&pipeline), stop_rx.clone()));
        }
        self.transition(RelayState::Running);
        info!(
            covert = self.config.covert,
            mean_delay = self.config.mean_delay,
            "▶️  开始转发"
        );

        let period = self.config.flush_interval();
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut flushes = 0_u64;

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("收到停止信号");
                    break;
                }
                _ = ticker.tick() => {
                    self.transition(RelayState::Draining);
                    self.flush_logged();
                    flushes += 1;
                    self.transition(RelayState::Running);
                }
                joined = workers.join_next() => {
                    if let Some(Err(e)) = joined {
                        warn!(error = %e, "worker 异常退出");
                    }
                    if workers.is_empty() {
                        warn!("所有订阅都已结束");
                        break;
                    }
                }
            }
        }

        self.transition(RelayState::Draining);
        // 正在处理的包会先处理完
        let _ = stop_tx.send(true);
        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "worker 异常退出");
            }
        }

        self.flush_logged();
        flushes += 1;

        if let Err(e) = bus.close().await {
            warn!(error = %e, "关闭连接失败");
        }
        self.transition(RelayState::Closed);

        let summary = RunSummary {
            relayed: pipeline.relayed(),
            failed: pipeline.failed(),
            flushes,
            final_state: self.state,
        };
        info!(
            relayed = summary.relayed,
            failed = summary.failed,
            flushes = summary.flushes,
            "✅ 中继已停止"
        );
        Ok(summary)
    }
}

/// 每个入口主题一个 worker，逐个处理，保证同一主题的转发顺序与接收顺序一致。
async fn worker<B: MessageBus>(
    mut sub: Subscription,
    pipeline: Arc<RelayPipeline<B>>,
    mut stop: watch::Receiver<bool>,
) {
    loop {
        let msg = tokio::select! {
            biased;
            _ = stop.changed() => break,
            msg = sub.next() => match msg {
                Some(msg) => msg,
                None => break,
            },
        };
        pipeline.process(msg).await;
    }
    debug!(subject = sub.subject(), "worker 退出");
}
