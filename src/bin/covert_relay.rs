//! 隐蔽信道中继
//!
//! 从 NATS 的 inpktsec / inpktinsec 收以太网帧，随机时延后转发到对应出口主题，
//! 同时做隐蔽包检测，周期性把统计结果写成 JSON。

use clap::Parser;
use covert_relay::bus::{NatsBus, redact_url};
use covert_relay::config::RelayConfig;
use covert_relay::relay::Relay;
use tracing::{info, warn};

/// Ctrl-C 或 SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "无法监听 Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "无法监听 SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化 tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .init();

    let config = RelayConfig::parse();
    let url = config.primary_server().to_string();
    info!(
        url = %redact_url(&url),
        covert = config.covert,
        mean_delay = config.mean_delay,
        results = %config.results_path.display(),
        "启动中继"
    );

    let mut relay = Relay::new(config)?;
    let summary = relay
        .run(NatsBus::connect(&url), shutdown_signal())
        .await?;

    println!(
        "done: relayed={}, failed={}, flushes={}, state={}",
        summary.relayed, summary.failed, summary.flushes, summary.final_state
    );
    Ok(())
}
