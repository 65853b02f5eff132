use std::time::Duration;

use bollard::Docker;
use bollard::models::{ContainerInspectResponse, ContainerSummary, Task as ApiTask};
use bollard::query_parameters::{
    InspectContainerOptions, InspectContainerOptionsBuilder, ListContainersOptions,
    ListContainersOptionsBuilder, ListServicesOptions, ListServicesOptionsBuilder,
    ListTasksOptions, ListTasksOptionsBuilder,
};
use chrono::{DateTime, Utc};

use super::{Container, ContainerDetails, Error, Orchestrator, Result, Service, Task};

/// Docker host used when `DOCKER_HOST` is not set.
pub const DEFAULT_DOCKER_HOST: &str = "unix:///var/run/docker.sock";

/// Request timeout for the underlying HTTP client.
const CLIENT_TIMEOUT: Duration = Duration::from_secs(120);

/// Operating system and version details reported by the daemon.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DaemonInfo {
    pub os_type: String,
    pub operating_system: String,
    pub server_version: String,
}

/// [`Orchestrator`] backed by a Docker Engine in Swarm mode.
#[derive(Debug, Clone)]
pub struct DockerOrchestrator {
    docker: Docker,
}

impl DockerOrchestrator {
    /// Connects to the daemon named by `DOCKER_HOST` and negotiates the API
    /// version.
    ///
    /// Every address form the Docker CLI understands is accepted (`unix://`,
    /// `tcp://`, `http://`, `https://` with `DOCKER_CERT_PATH`, `npipe://`).
    /// Without `DOCKER_HOST` the platform default local socket is used.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connect`] if the client cannot be created or the
    /// version negotiation fails.
    pub async fn connect() -> Result<Self> {
        let docker = client()?
            .negotiate_version()
            .await
            .map_err(connect_error)?;
        Ok(Self { docker })
    }

    /// Queries basic daemon information, used as a connectivity check.
    pub async fn daemon_info(&self) -> Result<DaemonInfo> {
        let info = self.docker.info().await.map_err(Error::Info)?;
        Ok(DaemonInfo {
            os_type: info.os_type.unwrap_or_default(),
            operating_system: info.operating_system.unwrap_or_default(),
            server_version: info.server_version.unwrap_or_default(),
        })
    }
}

/// Address the client connects to, for log and error messages.
fn docker_host() -> String {
    std::env::var("DOCKER_HOST").unwrap_or_else(|_| DEFAULT_DOCKER_HOST.to_owned())
}

fn connect_error(source: bollard::errors::Error) -> Error {
    Error::Connect {
        host: docker_host(),
        source,
    }
}

/// Builds a client from the environment without contacting the daemon.
fn client() -> Result<Docker> {
    let docker = Docker::connect_with_defaults().map_err(connect_error)?;
    Ok(docker.with_timeout(CLIENT_TIMEOUT))
}

impl Orchestrator for DockerOrchestrator {
    async fn list_services(&self) -> Result<Vec<Service>> {
        let options: ListServicesOptions = ListServicesOptionsBuilder::new().build();
        let services = self
            .docker
            .list_services(Some(options))
            .await
            .map_err(Error::ListServices)?;

        Ok(services.into_iter().map(service_from_api).collect())
    }

    async fn list_tasks(&self) -> Result<Vec<Task>> {
        let options: ListTasksOptions = ListTasksOptionsBuilder::new().build();
        let tasks = self
            .docker
            .list_tasks(Some(options))
            .await
            .map_err(Error::ListTasks)?;

        Ok(tasks.into_iter().filter_map(task_from_api).collect())
    }

    async fn list_containers(&self) -> Result<Vec<Container>> {
        let options: ListContainersOptions = ListContainersOptionsBuilder::new().build();
        let containers = self
            .docker
            .list_containers(Some(options))
            .await
            .map_err(Error::ListContainers)?;

        Ok(containers
            .into_iter()
            .filter_map(container_from_api)
            .collect())
    }

    async fn inspect_container(&self, id: &str) -> Result<ContainerDetails> {
        let options: InspectContainerOptions = InspectContainerOptionsBuilder::new().build();
        let response = self
            .docker
            .inspect_container(id, Some(options))
            .await
            .map_err(|source| Error::InspectContainer {
                id: id.to_owned(),
                source,
            })?;

        Ok(details_from_api(response))
    }
}

fn service_from_api(service: bollard::models::Service) -> Service {
    let spec = service.spec.unwrap_or_default();
    let desired_replicas = spec
        .mode
        .and_then(|mode| mode.replicated)
        .and_then(|replicated| replicated.replicas)
        .and_then(|replicas| u64::try_from(replicas).ok());
    let image = spec
        .task_template
        .and_then(|template| template.container_spec)
        .and_then(|container_spec| container_spec.image)
        .unwrap_or_default();

    Service {
        id: service.id.unwrap_or_default(),
        name: spec.name.unwrap_or_default(),
        desired_replicas,
        image,
    }
}

fn task_from_api(task: ApiTask) -> Option<Task> {
    let Some(service_id) = task.service_id else {
        log::debug!(
            "Skipping task `{}` without service id",
            task.id.as_deref().unwrap_or_default()
        );
        return None;
    };
    let status = task.status.unwrap_or_default();
    let state = status
        .state
        .map(|state| state.to_string())
        .filter(|state| !state.is_empty());
    let changed_at = status.timestamp.as_deref().and_then(parse_timestamp);

    Some(Task {
        service_id,
        state,
        changed_at,
    })
}

fn container_from_api(container: ContainerSummary) -> Option<Container> {
    container.id.map(|id| Container { id })
}

fn details_from_api(response: ContainerInspectResponse) -> ContainerDetails {
    let state = response.state.unwrap_or_default();
    let status = state
        .status
        .map(|status| status.to_string())
        .unwrap_or_default();
    let health = state.health.map(|health| {
        health
            .status
            .map(|status| status.to_string())
            .unwrap_or_default()
    });

    ContainerDetails {
        name: response.name.unwrap_or_default(),
        status,
        health,
    }
}

/// Parses an RFC 3339 timestamp as reported by the Engine API.
///
/// The daemon reports the zero time (`0001-01-01T00:00:00Z`) for transitions
/// that never happened; those are treated as absent.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(ts) if ts.timestamp() > 0 => Some(ts.with_timezone(&Utc)),
        Ok(_) => None,
        Err(err) => {
            log::debug!("Ignoring unparsable task timestamp `{}`: {}", raw, err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use bollard::models::{
        ContainerState, ContainerStateStatusEnum, Health, HealthStatusEnum, ServiceSpec,
        ServiceSpecMode, ServiceSpecModeReplicated, TaskSpec, TaskSpecContainerSpec, TaskState,
        TaskStatus,
    };

    use super::*;

    #[test]
    fn parses_rfc3339_with_nanoseconds() {
        let ts = parse_timestamp("2024-05-01T12:30:45.123456789Z").unwrap();
        assert_eq!(ts.timestamp(), 1_714_566_645);
    }

    #[test]
    fn zero_time_is_absent() {
        assert!(parse_timestamp("0001-01-01T00:00:00Z").is_none());
    }

    #[test]
    fn garbage_timestamp_is_absent() {
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn maps_replicated_service() {
        let service = bollard::models::Service {
            id: Some("svc1".to_owned()),
            spec: Some(ServiceSpec {
                name: Some("web".to_owned()),
                mode: Some(ServiceSpecMode {
                    replicated: Some(ServiceSpecModeReplicated { replicas: Some(3) }),
                    ..Default::default()
                }),
                task_template: Some(TaskSpec {
                    container_spec: Some(TaskSpecContainerSpec {
                        image: Some("nginx:1.25".to_owned()),
                        ..Default::default()
                    }),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        };

        let mapped = service_from_api(service);
        assert_eq!(
            mapped,
            Service {
                id: "svc1".to_owned(),
                name: "web".to_owned(),
                desired_replicas: Some(3),
                image: "nginx:1.25".to_owned(),
            }
        );
    }

    #[test]
    fn global_service_has_no_desired_replicas() {
        let service = bollard::models::Service {
            id: Some("svc2".to_owned()),
            spec: Some(ServiceSpec {
                name: Some("agent".to_owned()),
                mode: Some(ServiceSpecMode::default()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let mapped = service_from_api(service);
        assert_eq!(mapped.desired_replicas, None);
        assert_eq!(mapped.image, "");
    }

    #[test]
    fn maps_task_state_and_timestamp() {
        let task = ApiTask {
            service_id: Some("svc1".to_owned()),
            status: Some(TaskStatus {
                state: Some(TaskState::RUNNING),
                timestamp: Some("2024-05-01T12:30:45Z".to_owned()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let mapped = task_from_api(task).unwrap();
        assert_eq!(mapped.service_id, "svc1");
        assert_eq!(mapped.state.as_deref(), Some("running"));
        assert_eq!(mapped.changed_at.map(|ts| ts.timestamp()), Some(1_714_566_645));
    }

    #[test]
    fn drops_task_without_service() {
        let task = ApiTask {
            id: Some("orphan".to_owned()),
            ..Default::default()
        };
        assert!(task_from_api(task).is_none());
    }

    #[test]
    fn maps_container_health_only_when_defined() {
        let with_health = ContainerInspectResponse {
            name: Some("/web.1.abc".to_owned()),
            state: Some(ContainerState {
                status: Some(ContainerStateStatusEnum::RUNNING),
                health: Some(Health {
                    status: Some(HealthStatusEnum::HEALTHY),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        };
        let details = details_from_api(with_health);
        assert_eq!(details.name, "/web.1.abc");
        assert_eq!(details.status, "running");
        assert_eq!(details.health.as_deref(), Some("healthy"));

        let without_health = ContainerInspectResponse {
            name: Some("/db".to_owned()),
            state: Some(ContainerState {
                status: Some(ContainerStateStatusEnum::EXITED),
                ..Default::default()
            }),
            ..Default::default()
        };
        let details = details_from_api(without_health);
        assert_eq!(details.status, "exited");
        assert_eq!(details.health, None);
    }

    #[test]
    fn client_follows_docker_host() {
        let previous = std::env::var_os("DOCKER_HOST");
        for host in ["tcp://127.0.0.1:2375", "http://127.0.0.1:2375", "unix:///tmp/docker.sock"] {
            // SAFETY: no other test reads or writes DOCKER_HOST.
            unsafe { std::env::set_var("DOCKER_HOST", host) };
            assert!(client().is_ok(), "no client for {host}");
            assert_eq!(docker_host(), host);
        }
        // SAFETY: as above.
        unsafe {
            match previous {
                Some(value) => std::env::set_var("DOCKER_HOST", value),
                None => std::env::remove_var("DOCKER_HOST"),
            }
        }
    }

    #[test]
    fn container_without_id_is_skipped() {
        assert!(container_from_api(ContainerSummary::default()).is_none());

        let listed = ContainerSummary {
            id: Some("abc".to_owned()),
            names: Some(vec!["/web".to_owned()]),
            ..Default::default()
        };
        assert_eq!(
            container_from_api(listed),
            Some(Container {
                id: "abc".to_owned()
            })
        );
    }
}
