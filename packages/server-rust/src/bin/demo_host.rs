//! Demo host: serves an echo service over HTTP.
//!
//! ```text
//! curl -X POST localhost:8080/echo -d '{"message": "hi"}'
//! curl localhost:8080/metadata
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use serde::{Deserialize, Serialize};
use svchost_core::{
    ContractAttributes, MethodSignature, ServiceDefinition, ServiceInterface, ServiceMethod,
};
use svchost_server::handler::ErrorResponseHandler;
use svchost_server::network::build_router;
use svchost_server::stats::{MetricsStatsSink, StatsReport, StatsSink, TracingStatsSink};
use svchost_server::{HostConfig, ServiceHost};
use tokio::net::TcpListener;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "demo-host", about = "Serve an echo service through the service host")]
struct Args {
    #[arg(long, default_value = "127.0.0.1", env = "SVCHOST_BIND")]
    bind: String,

    #[arg(short, long, default_value_t = 8080, env = "SVCHOST_PORT")]
    port: u16,

    /// Seconds between stats reports.
    #[arg(long, default_value_t = 30, env = "SVCHOST_STATS_INTERVAL_SECS")]
    stats_interval_secs: u64,

    /// Emit logs as JSON lines.
    #[arg(long, env = "SVCHOST_JSON_LOGS")]
    json_logs: bool,
}

#[derive(Debug, Deserialize)]
struct EchoRequest {
    message: String,
}

#[derive(Debug, Serialize)]
struct EchoResponse {
    message: String,
    length: usize,
}

struct EchoService;

impl ServiceDefinition for EchoService {
    fn interfaces() -> Vec<ServiceInterface> {
        vec![ServiceInterface::contract(
            "EchoContract",
            ContractAttributes {
                service_name: "EchoService",
                service_namespace: "http://example.com/echo",
                code_generator_version: "1.0.0",
            },
        )
        .method(MethodSignature::typed::<EchoRequest>("echo"))]
    }

    fn methods() -> Vec<ServiceMethod<Self>> {
        vec![ServiceMethod::typed("echo", |_: &Self, req: EchoRequest| {
            Ok(EchoResponse {
                length: req.message.chars().count(),
                message: req.message,
            })
        })]
    }
}

/// Logs every report and also publishes it as gauges.
struct DemoStatsSink;

impl StatsSink for DemoStatsSink {
    fn emit(&self, report: &StatsReport) {
        TracingStatsSink.emit(report);
        MetricsStatsSink.emit(report);
    }
}

fn init_tracing(json: bool) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new("info"))?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.json_logs)?;

    let config = HostConfig {
        exception_handler: Some(Arc::new(ErrorResponseHandler)),
        stats_report_interval: Duration::from_secs(args.stats_interval_secs),
        stats_sink: Arc::new(DemoStatsSink),
        ..HostConfig::default()
    };
    let host = Arc::new(ServiceHost::with_config(config, EchoService)?);

    let addr = format!("{}:{}", args.bind, args.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;
    info!(%addr, "demo host listening");

    axum::serve(listener, build_router(Arc::clone(&host)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server failure")?;

    host.shutdown();
    Ok(())
}
