//! Process startup: telemetry, executor selection, health probes, signal
//! handling and the pod controller.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use kube::Client;
use tokio::{
    signal,
    sync::{oneshot, watch},
};
use tracing::{error, info, warn};

use crate::{
    config::ControllerConfig,
    controller::{self, KubePodClient, ReconcileContext},
    health::{self, HealthState},
    observability::{
        logging::{self, parse_level, LoggingConfig},
        metrics::{self, NoopTelemetry, PrometheusConfig, PrometheusTelemetry, WarmupTelemetry},
    },
    version,
    warmup::{HttpWarmupExecutor, NoopExecutor, WarmupExecutor},
};

static LOGGING_INITIALIZED: AtomicBool = AtomicBool::new(false);

pub async fn startup(config: ControllerConfig) -> anyhow::Result<()> {
    let _log_guard = if !LOGGING_INITIALIZED.swap(true, Ordering::SeqCst) {
        Some(logging::init_logging(LoggingConfig {
            level: config
                .log_level
                .as_deref()
                .and_then(parse_level)
                .unwrap_or(tracing::Level::INFO),
            json_format: config.log_json,
            log_dir: config.log_dir.clone(),
            ..Default::default()
        }))
    } else {
        None
    };

    info!(
        version = version::get_version(),
        namespace = config.namespace.as_deref().unwrap_or("<all>"),
        node = config.node_name.as_deref().unwrap_or("<all>"),
        warmup_enabled = config.warmup_enabled,
        "starting kube-booster controller"
    );

    let _ = rustls::crypto::ring::default_provider().install_default();

    let telemetry: Arc<dyn WarmupTelemetry> = match &config.metrics {
        Some(metrics_config) => {
            metrics::start_prometheus(PrometheusConfig {
                port: metrics_config.port,
                host: metrics_config.host.clone(),
                duration_buckets: None,
            })
            .context("failed to start Prometheus exporter")?;
            info!(
                "Prometheus exporter listening on {}:{}",
                metrics_config.host, metrics_config.port
            );
            Arc::new(PrometheusTelemetry)
        }
        None => Arc::new(NoopTelemetry),
    };

    let executor: Arc<dyn WarmupExecutor> = if config.warmup_enabled {
        Arc::new(
            HttpWarmupExecutor::new(Arc::clone(&telemetry))
                .context("failed to build warmup HTTP client")?,
        )
    } else {
        warn!("warmup disabled: gates will be satisfied without sending traffic");
        Arc::new(NoopExecutor)
    };

    let client = Client::try_default()
        .await
        .context("failed to create Kubernetes client")?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
        let _ = stop_tx.send(());
    });

    let health_state = HealthState::new();
    let listener = health::bind(&config.health).await.with_context(|| {
        format!(
            "failed to bind health probe server on {}:{}",
            config.health.host, config.health.port
        )
    })?;
    let mut health_shutdown = shutdown_rx.clone();
    let health_task = tokio::spawn(health::serve(
        listener,
        health_state.clone(),
        async move {
            let _ = health_shutdown.wait_for(|stopping| *stopping).await;
        },
    ));

    let pods = Arc::new(KubePodClient::new(
        client.clone(),
        std::env::var("HOSTNAME").ok(),
    ));
    let context = Arc::new(ReconcileContext::new(
        pods,
        executor,
        telemetry,
        shutdown_rx,
        &config,
    ));

    health_state.set_ready(true);
    controller::run(client, &config, context, async move {
        let _ = stop_rx.await;
    })
    .await;
    health_state.set_ready(false);

    match health_task.await {
        Ok(Err(e)) => error!("Health probe server failed: {}", e),
        Err(e) => error!("Health probe server task panicked: {}", e),
        Ok(Ok(())) => {}
    }

    info!("kube-booster controller exited");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        },
    }
}
