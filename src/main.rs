/// Entry point for the Swarm Exporter.
///
/// Reads the configuration from the environment, initializes logging and
/// serves Prometheus metrics for the Docker Swarm the daemon belongs to.
///
/// # Examples
///
/// ```bash
/// DEBUG=1 DOCKER_HOST=unix:///var/run/docker.sock cargo run
/// ```
#[tokio::main]
async fn main() -> std::process::ExitCode {
    let config = match swarm_exporter::config::Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            return std::process::ExitCode::FAILURE;
        }
    };
    swarm_exporter::init_logging(&config);

    match swarm_exporter::run(config).await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{}", err);
            std::process::ExitCode::FAILURE
        }
    }
}
