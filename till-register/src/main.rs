use std::sync::Arc;

use anyhow::Context;
use shared::money::format_money;
use shared::util::format_long_date;
use till_client::{RestStore, RestStoreConfig};
use till_register::{LocalOrderCache, Register, RegisterEvent, setup_environment};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. 设置环境 (dotenv, 工作目录, 日志)
    let config = setup_environment()?;
    tracing::info!(work_dir = %config.work_dir, store = %config.store_url, "Till register starting");

    // 2. 本地订单缓存
    let cache = LocalOrderCache::open(config.cache_path())
        .with_context(|| format!("opening order cache at {}", config.cache_path().display()))?;

    // 3. 远程存储
    let store = RestStore::new(
        RestStoreConfig::new(&config.store_url, &config.store_api_key)
            .with_timeout(config.store_timeout()),
    )
    .context("building store client")?;

    // 4. 启动收银台
    let symbol = config.currency_symbol.clone();
    let register = Register::new(config, Arc::new(store), cache);
    let mut events = register.subscribe();
    register.start().await;

    loop {
        tokio::select! {
            _ = shutdown_signal() => break,
            event = events.recv() => match event {
                Ok(RegisterEvent::Alert(message)) => tracing::warn!(%message, "Alert"),
                Ok(RegisterEvent::PaymentRecorded(record)) => tracing::info!(
                    table = %record.table_id,
                    total = %format_money(record.total_amount, &symbol),
                    change = %format_money(record.change_amount, &symbol),
                    "Payment recorded"
                ),
                Ok(RegisterEvent::SessionClosed(report)) => tracing::info!(
                    closed_at = %format_long_date(report.end_time),
                    cash = %format_money(report.combined.cash, &symbol),
                    card = %format_money(report.combined.card, &symbol),
                    total = %format_money(report.combined.total, &symbol),
                    "Cash session closed"
                ),
                Ok(RegisterEvent::SessionExpired) => {
                    tracing::error!("Store session expired, restart required");
                    break;
                }
                Ok(event) => tracing::info!(?event, "Register event"),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event stream lagged");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    register.shutdown();
    tracing::info!("Till register stopped");
    Ok(())
}

/// Ctrl+C or SIGTERM
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C signal, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM signal, shutting down"),
    }
}
