/// Errors returned while talking to the Docker daemon.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to connect to docker daemon at `{host}`: {source}")]
    Connect {
        host: String,
        #[source]
        source: bollard::errors::Error,
    },
    #[error("failed to query docker daemon info: {0}")]
    Info(#[source] bollard::errors::Error),
    #[error("failed to list swarm services: {0}")]
    ListServices(#[source] bollard::errors::Error),
    #[error("failed to list swarm tasks: {0}")]
    ListTasks(#[source] bollard::errors::Error),
    #[error("failed to list containers: {0}")]
    ListContainers(#[source] bollard::errors::Error),
    #[error("failed to inspect container `{id}`: {source}")]
    InspectContainer {
        id: String,
        #[source]
        source: bollard::errors::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
