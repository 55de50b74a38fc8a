use clap::Parser;
use kube_booster::{
    config::{
        ControllerConfig, ControllerConfigBuilder, MetricsConfig, DEFAULT_CONCURRENCY,
        DEFAULT_ERROR_REQUEUE_SECS, DEFAULT_REQUEUE_DELAY_SECS,
    },
    server, version,
};

#[derive(Parser, Debug)]
#[command(
    name = "kube-booster",
    about = "Holds a pod's readiness gate until it has received warmup traffic",
    disable_version_flag = true
)]
struct CliArgs {
    /// Only watch pods in this namespace (default: all namespaces)
    #[arg(long)]
    namespace: Option<String>,

    /// Node-local mode: only reconcile pods scheduled on this node
    #[arg(long, env = "NODE_NAME")]
    node_name: Option<String>,

    /// Maximum number of pods warmed up concurrently
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
    concurrency: u16,

    /// Delay before re-checking a pod that is not running or ready yet
    #[arg(long, default_value_t = DEFAULT_REQUEUE_DELAY_SECS)]
    requeue_delay_secs: u64,

    /// Backoff after a failed pod status update
    #[arg(long, default_value_t = DEFAULT_ERROR_REQUEUE_SECS)]
    error_requeue_secs: u64,

    /// Satisfy readiness gates without sending warmup traffic
    #[arg(long, default_value_t = false)]
    disable_warmup: bool,

    #[arg(long, default_value = "0.0.0.0")]
    prometheus_host: String,

    #[arg(long, default_value_t = 8080)]
    prometheus_port: u16,

    /// Do not start the Prometheus exporter
    #[arg(long, default_value_t = false)]
    disable_metrics: bool,

    #[arg(long, default_value = "0.0.0.0")]
    health_host: String,

    #[arg(long, default_value_t = 8081)]
    health_port: u16,

    #[arg(long, value_parser = ["trace", "debug", "info", "warn", "error"])]
    log_level: Option<String>,

    /// Also write daily-rotated log files to this directory
    #[arg(long)]
    log_dir: Option<String>,

    #[arg(long, default_value_t = false)]
    log_json: bool,
}

impl CliArgs {
    fn to_controller_config(&self) -> ControllerConfig {
        let metrics = (!self.disable_metrics).then(|| MetricsConfig {
            host: self.prometheus_host.clone(),
            port: self.prometheus_port,
        });

        ControllerConfigBuilder::new()
            .maybe_namespace(self.namespace.clone())
            .maybe_node_name(self.node_name.clone().filter(|n| !n.is_empty()))
            .concurrency(self.concurrency)
            .requeue_delay_secs(self.requeue_delay_secs)
            .error_requeue_secs(self.error_requeue_secs)
            .warmup_enabled(!self.disable_warmup)
            .maybe_metrics(metrics)
            .health_probe(self.health_host.clone(), self.health_port)
            .maybe_log_level(self.log_level.clone())
            .maybe_log_dir(self.log_dir.clone())
            .log_json(self.log_json)
            .build_unchecked()
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Check for version flags before parsing other args to avoid errors
    for arg in std::env::args() {
        if arg == "--version" || arg == "-V" {
            println!("{}", version::get_version_string());
            return Ok(());
        }
        if arg == "--version-verbose" {
            println!("{}", version::get_verbose_version_string());
            return Ok(());
        }
    }

    let cli_args = CliArgs::parse();
    let config = cli_args.to_controller_config();
    config.validate()?;

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move { server::startup(config).await })?;
    Ok(())
}
