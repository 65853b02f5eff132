//! Swarm state as seen through the Docker Engine API.
//!
//! The [`Orchestrator`] trait is the seam between the metrics collector and the
//! daemon. [`DockerOrchestrator`] implements it on top of `bollard` and maps the
//! generated API models into the small read-only types defined here.
use std::future::Future;

use chrono::{DateTime, Utc};

mod docker;
mod error;

pub use docker::{DEFAULT_DOCKER_HOST, DaemonInfo, DockerOrchestrator};
pub use error::{Error, Result};

/// A Swarm service definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Service {
    pub id: String,
    pub name: String,
    /// Desired replica count. `None` for global-mode services.
    pub desired_replicas: Option<u64>,
    /// Image reference of the task template, as stored by the daemon.
    pub image: String,
}

/// One scheduled instantiation of a [`Service`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub service_id: String,
    /// Lifecycle state, e.g. `running` or `shutdown`.
    pub state: Option<String>,
    /// Time of the last state transition.
    pub changed_at: Option<DateTime<Utc>>,
}

/// A container as returned by the container list call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    pub id: String,
}

/// Live container state as returned by the inspect call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerDetails {
    /// Container name as reported by the daemon (with its leading `/`).
    pub name: String,
    pub status: String,
    /// Health status, present only if the container defines a health check.
    pub health: Option<String>,
}

/// Read access to the orchestrator state needed for a metrics snapshot.
pub trait Orchestrator {
    fn list_services(&self) -> impl Future<Output = Result<Vec<Service>>> + Send;

    fn list_tasks(&self) -> impl Future<Output = Result<Vec<Task>>> + Send;

    fn list_containers(&self) -> impl Future<Output = Result<Vec<Container>>> + Send;

    fn inspect_container(&self, id: &str)
    -> impl Future<Output = Result<ContainerDetails>> + Send;
}
