//! Swarm Exporter: exposes Docker Swarm service, task and container state as
//! Prometheus metrics.
//!
//! Every scrape of `/metrics` queries the Docker daemon for services, tasks and
//! containers, joins them in memory and renders the result in the Prometheus
//! text format. Nothing is persisted between scrapes.
use std::sync::Arc;

pub mod api;
pub mod collector;
pub mod config;
pub mod swarm;

use config::Config;
use swarm::DockerOrchestrator;

/// Initializes logging for the given configuration.
///
/// `DEBUG=1` raises the default level to `debug`; `RUST_LOG` still refines the
/// filter per module.
pub fn init_logging(config: &Config) {
    env_logger::Builder::new()
        .filter_level(config.log_level())
        .parse_default_env()
        .format_timestamp_secs()
        .init();
}

/// Runs the exporter.
///
/// Connects to the Docker daemon, checks that it answers, and serves the
/// metrics endpoint until the HTTP server stops.
///
/// # Errors
///
/// Possible errors include:
/// - Failure to connect to or query the Docker daemon at startup.
/// - Failure to bind the HTTP listener.
pub async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let docker_host = config
        .docker_host
        .as_deref()
        .unwrap_or(swarm::DEFAULT_DOCKER_HOST);
    let orchestrator = DockerOrchestrator::connect().await?;
    log::info!("Docker client created using socket host: {}", docker_host);

    let info = orchestrator.daemon_info().await?;
    log::info!(
        "Connected to Docker Daemon: OS={} / {}, version={}",
        info.os_type,
        info.operating_system,
        info.server_version
    );

    let aggregator = Arc::new(collector::Aggregator::new(
        orchestrator,
        config.scrape_timeout,
        config.inspect_concurrency,
    ));

    log::info!("Starting HTTP Server on {}", config.listen_addr);
    api::APIServer::new(aggregator)
        .listen(config.listen_addr)
        .await?;

    Ok(())
}
