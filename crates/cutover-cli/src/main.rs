use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use cutover_flow::CutoverConfig;
use cutover_platform::{Color, KubectlClient};

mod commands;

#[derive(Parser)]
#[command(
    name = "cutover",
    about = "Cutover — blue/green cutover and zero-downtime rolling updates",
    version,
    propagate_version = true,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Flags shared by every subcommand that touches the cluster.
#[derive(Args, Clone)]
struct CommonOpts {
    /// Namespace the deployments live in
    #[arg(short = 'n', long, default_value = "default")]
    namespace: String,
    /// Value of the `app` label shared by the deployments
    #[arg(long, default_value = "messaging-app")]
    app: String,
    /// Service whose selector routes live traffic
    #[arg(long, default_value = "messaging-app-service")]
    service: String,
    /// Readiness budget in seconds
    #[arg(short = 't', long, default_value_t = 300)]
    timeout: u64,
}

/// Flags for anything that probes the service endpoint.
#[derive(Args, Clone)]
struct MonitorOpts {
    /// host:port of the stable service endpoint
    #[arg(long, default_value = "localhost:8000")]
    endpoint: String,
    /// Seconds between probes
    #[arg(long, default_value_t = 2)]
    interval: u64,
    /// Directory the probe log file is written to
    #[arg(long, default_value = ".")]
    log_dir: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy (or update) the blue side and wait for readiness
    DeployBlue {
        #[command(flatten)]
        common: CommonOpts,
        /// Deployment manifest override
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Deploy (or update) the green side and wait for readiness
    DeployGreen {
        #[command(flatten)]
        common: CommonOpts,
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Point the service selector at blue
    SwitchBlue {
        #[command(flatten)]
        common: CommonOpts,
    },
    /// Point the service selector at green
    SwitchGreen {
        #[command(flatten)]
        common: CommonOpts,
    },
    /// Scan pod logs for error signatures
    CheckLogs {
        #[command(flatten)]
        common: CommonOpts,
        /// Restrict the scan to one deployment (default: both colors)
        #[arg(short, long)]
        deployment: Option<String>,
        /// Log lines to scan per pod
        #[arg(long, default_value_t = 50)]
        tail: u32,
    },
    /// Show readiness per color and which color is live
    Status {
        #[command(flatten)]
        common: CommonOpts,
    },
    /// Full blue/green cutover: deploy both sides, check green's logs,
    /// switch traffic
    FullDeploy {
        #[command(flatten)]
        common: CommonOpts,
        #[arg(long)]
        blue_file: Option<PathBuf>,
        #[arg(long)]
        green_file: Option<PathBuf>,
        #[arg(long)]
        service_file: Option<PathBuf>,
    },
    /// Rolling update supervised by the endpoint monitor
    RollingUpdate {
        #[command(flatten)]
        common: CommonOpts,
        #[command(flatten)]
        monitor: MonitorOpts,
        /// Deployment manifest override
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Deployment name override
        #[arg(short, long)]
        deployment: Option<String>,
    },
    /// The rolling-update apply sequence without the monitor
    ApplyOnly {
        #[command(flatten)]
        common: CommonOpts,
        #[arg(short, long)]
        file: Option<PathBuf>,
        #[arg(short, long)]
        deployment: Option<String>,
    },
    /// Run only the endpoint monitor and report downtime statistics
    MonitorOnly {
        #[command(flatten)]
        monitor: MonitorOpts,
        /// Stop after this many probes
        #[arg(long, default_value_t = 30)]
        max_probes: u64,
    },
    /// Replica-parity check only
    VerifyOnly {
        #[command(flatten)]
        common: CommonOpts,
        #[arg(short, long)]
        deployment: Option<String>,
    },
    /// Short monitor run that fails if any probe failed
    DowntimeTest {
        #[command(flatten)]
        monitor: MonitorOpts,
        /// Probes to issue
        #[arg(long, default_value_t = 30)]
        max_probes: u64,
    },
}

fn build_config(common: &CommonOpts) -> CutoverConfig {
    CutoverConfig {
        namespace: common.namespace.clone(),
        app_label: common.app.clone(),
        service: common.service.clone(),
        readiness_timeout: Duration::from_secs(common.timeout),
        ..CutoverConfig::default()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("cutover=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let platform = KubectlClient::new();

    match cli.command {
        Commands::DeployBlue { common, file } => {
            let mut cfg = build_config(&common);
            if let Some(file) = file {
                cfg.blue_manifest = file;
            }
            commands::bluegreen::deploy(&platform, &cfg, Color::Blue).await
        }
        Commands::DeployGreen { common, file } => {
            let mut cfg = build_config(&common);
            if let Some(file) = file {
                cfg.green_manifest = file;
            }
            commands::bluegreen::deploy(&platform, &cfg, Color::Green).await
        }
        Commands::SwitchBlue { common } => {
            commands::bluegreen::switch(&platform, &build_config(&common), Color::Blue).await
        }
        Commands::SwitchGreen { common } => {
            commands::bluegreen::switch(&platform, &build_config(&common), Color::Green).await
        }
        Commands::CheckLogs {
            common,
            deployment,
            tail,
        } => {
            let mut cfg = build_config(&common);
            cfg.log_tail_lines = tail;
            commands::bluegreen::check_logs(&platform, &cfg, deployment.as_deref()).await
        }
        Commands::Status { common } => {
            commands::bluegreen::status(&platform, &build_config(&common)).await
        }
        Commands::FullDeploy {
            common,
            blue_file,
            green_file,
            service_file,
        } => {
            let mut cfg = build_config(&common);
            if let Some(file) = blue_file {
                cfg.blue_manifest = file;
            }
            if let Some(file) = green_file {
                cfg.green_manifest = file;
            }
            if let Some(file) = service_file {
                cfg.service_manifest = file;
            }
            commands::bluegreen::full_deploy(&platform, &cfg).await
        }
        Commands::RollingUpdate {
            common,
            monitor,
            file,
            deployment,
        } => {
            let mut cfg = build_config(&common);
            cfg.endpoint = monitor.endpoint.clone();
            cfg.monitor_interval = Duration::from_secs(monitor.interval);
            if let Some(file) = file {
                cfg.rolling_manifest = file;
            }
            if let Some(deployment) = deployment {
                cfg.rolling_deployment = deployment;
            }
            commands::rolling::rolling_update(&platform, &cfg, &monitor.log_dir).await
        }
        Commands::ApplyOnly {
            common,
            file,
            deployment,
        } => {
            let mut cfg = build_config(&common);
            if let Some(file) = file {
                cfg.rolling_manifest = file;
            }
            if let Some(deployment) = deployment {
                cfg.rolling_deployment = deployment;
            }
            commands::rolling::apply_only(&platform, &cfg).await
        }
        Commands::MonitorOnly {
            monitor,
            max_probes,
        } => {
            commands::monitor::monitor_only(
                &monitor.endpoint,
                Duration::from_secs(monitor.interval),
                max_probes,
                &monitor.log_dir,
            )
            .await
        }
        Commands::VerifyOnly { common, deployment } => {
            let mut cfg = build_config(&common);
            if let Some(deployment) = deployment {
                cfg.rolling_deployment = deployment;
            }
            commands::rolling::verify_only(&platform, &cfg).await
        }
        Commands::DowntimeTest {
            monitor,
            max_probes,
        } => {
            commands::monitor::downtime_test(
                &monitor.endpoint,
                Duration::from_secs(monitor.interval),
                max_probes,
                &monitor.log_dir,
            )
            .await
        }
    }
}
