use anyhow::Result;
use dealerboard::*;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = config::AppConfig::load()?;

    let repo = snapshot_repo::SnapshotRepo::connect(
        &app_config.database.path,
        app_config.database.max_pool_size,
    )
    .await?;
    repo.init().await?;
    let store: Arc<dyn snapshot_repo::SnapshotStore> = Arc::new(repo);

    let source: Arc<dyn sheet::SheetSource> = Arc::new(sheet::HttpSheetSource::new(
        app_config.source.csv_url.clone(),
        Duration::from_secs(app_config.source.request_timeout_secs),
        app_config.source.cache_bust_param.clone(),
    )?);

    let (state_tx, state_rx) = watch::channel(poller::FeedState::default());
    let stats = Arc::new(poller::AppStats::default());

    let poller_handle = poller::start(
        poller::PollerDeps {
            source: source.clone(),
            store: store.clone(),
            state_tx,
            stats: stats.clone(),
        },
        poller::PollerConfig {
            interval: Duration::from_secs(app_config.polling.interval_secs),
            daily_snapshot: app_config.polling.daily_snapshot,
            stats_log_interval: Duration::from_secs(app_config.monitoring.stats_log_interval_secs),
        },
    );

    let auto_task = if app_config.auto_snapshot.enabled {
        let (tx, rx) = tokio::sync::oneshot::channel();
        let handle = auto_snapshot::spawn(
            store.clone(),
            app_config.auto_snapshot.schedule.clone(),
            stats.clone(),
            rx,
        );
        tracing::info!(schedule = %app_config.auto_snapshot.schedule, "auto snapshots enabled");
        Some((tx, handle))
    } else {
        None
    };

    let app = routes::app(store, source, state_rx, app_config.clone());
    let addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);

    tokio::select! {
        result = axum::serve(listener, app) => {
            result?;
        }
        _ = async {
            #[cfg(unix)]
            {
                let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                    Ok(s) => s,
                    Err(_) => {
                        let _ = tokio::signal::ctrl_c().await;
                        return;
                    }
                };
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            #[cfg(not(unix))]
            {
                let _ = tokio::signal::ctrl_c().await;
            }
        } => {
            tracing::info!("Received shutdown signal");
            poller_handle.stop().await;
            if let Some((tx, handle)) = auto_task {
                let _ = tx.send(());
                let _ = handle.await;
            }
            stats.log();
        }
    }

    Ok(())
}
