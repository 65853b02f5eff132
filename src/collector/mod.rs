//! Swarm snapshot aggregation.
//!
//! Every scrape fetches services, tasks and containers from the
//! [`Orchestrator`], joins them in memory and turns the result into a
//! [`Snapshot`] of labeled gauge observations. Nothing is cached between
//! scrapes; concurrent scrapes are independent of each other.
//!
//! # Exported metrics
//!
//! - `swarm_service_desired_replicas{service_name}`: replicated services only.
//! - `swarm_service_tasks{service_name, state}`: one per observed state.
//! - `swarm_service_info{service_name, image}`: constant `1`.
//! - `swarm_service_change_time{service_name}`: services with at least one task.
//! - `container_status{container_status, container_name}`: constant `1`.
//! - `container_health_status{container_health_status, container_name}`:
//!   containers with a health check only.
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::{StreamExt, TryStreamExt};

use crate::swarm::{self, ContainerDetails, Orchestrator, Service, Task};

pub mod exposition;
mod metrics;

pub use metrics::{Metric, MetricDescriptor, Observation, Snapshot};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Orchestrator(#[from] swarm::Error),
    #[error("scrape did not finish within {0:?}")]
    Timeout(Duration),
    #[error("failed to render metrics: {0}")]
    Exposition(#[source] prometheus::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Collects Swarm metric snapshots from an [`Orchestrator`].
#[derive(Debug)]
pub struct Aggregator<O> {
    orchestrator: O,
    scrape_timeout: Duration,
    inspect_concurrency: usize,
}

impl<O: Orchestrator + Sync> Aggregator<O> {
    pub fn new(orchestrator: O, scrape_timeout: Duration, inspect_concurrency: usize) -> Self {
        Self {
            orchestrator,
            scrape_timeout,
            inspect_concurrency: inspect_concurrency.max(1),
        }
    }

    /// Descriptors of all metrics this aggregator can emit.
    pub fn describe(&self) -> Vec<MetricDescriptor> {
        Metric::ALL.iter().map(|metric| metric.descriptor()).collect()
    }

    /// Builds a fresh snapshot of the orchestrator state.
    ///
    /// # Errors
    ///
    /// Fails the whole scrape if any orchestrator call fails
    /// ([`Error::Orchestrator`]) or if the scrape exceeds its timeout
    /// ([`Error::Timeout`]). No partial snapshot is returned. In-flight
    /// orchestrator calls are dropped when the timeout fires.
    pub async fn collect(&self) -> Result<Snapshot> {
        match tokio::time::timeout(self.scrape_timeout, self.collect_unbounded()).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(self.scrape_timeout)),
        }
    }

    /// Collects and renders a snapshot in the text exposition format.
    pub async fn scrape(&self) -> Result<String> {
        let snapshot = self.collect().await?;
        exposition::render(&self.describe(), &snapshot)
    }

    async fn collect_unbounded(&self) -> Result<Snapshot> {
        log::debug!("Received request for metrics.");
        let (services, tasks, containers) = tokio::try_join!(
            self.orchestrator.list_services(),
            self.orchestrator.list_tasks(),
            self.orchestrator.list_containers(),
        )?;
        log::debug!(
            "Fetched {} services, {} tasks and {} containers",
            services.len(),
            tasks.len(),
            containers.len()
        );

        // `buffered` keeps the input order, so the snapshot is deterministic.
        let inspects: Vec<_> = containers
            .iter()
            .map(|container| self.orchestrator.inspect_container(&container.id))
            .collect();
        let details: Vec<ContainerDetails> = futures::stream::iter(inspects)
            .buffered(self.inspect_concurrency)
            .try_collect()
            .await?;

        let mut snapshot = Snapshot::default();
        for container in &details {
            push_container(&mut snapshot, container);
        }

        let groups = group_tasks(&tasks);
        for service in &services {
            push_service(&mut snapshot, service, groups.get(service.id.as_str()));
        }

        Ok(snapshot)
    }
}

/// Aggregate of all tasks belonging to one service.
#[derive(Debug, Default, PartialEq, Eq)]
struct TaskGroup<'a> {
    states: BTreeMap<&'a str, u64>,
    last_change: Option<DateTime<Utc>>,
}

/// Groups tasks by owning service id in a single pass.
fn group_tasks(tasks: &[Task]) -> HashMap<&str, TaskGroup<'_>> {
    let mut groups: HashMap<&str, TaskGroup<'_>> = HashMap::new();
    for task in tasks {
        let group = groups.entry(task.service_id.as_str()).or_default();
        if let Some(state) = task.state.as_deref() {
            *group.states.entry(state).or_default() += 1;
        }
        if let Some(changed_at) = task.changed_at {
            group.last_change = group.last_change.max(Some(changed_at));
        }
    }
    groups
}

fn push_container(snapshot: &mut Snapshot, container: &ContainerDetails) {
    snapshot.push(Observation::new(
        Metric::ContainerStatus,
        vec![container.status.clone(), container.name.clone()],
        1.0,
    ));

    if let Some(health) = &container.health {
        snapshot.push(Observation::new(
            Metric::ContainerHealthStatus,
            vec![health.clone(), container.name.clone()],
            1.0,
        ));
    }
}

fn push_service(snapshot: &mut Snapshot, service: &Service, tasks: Option<&TaskGroup<'_>>) {
    if let Some(replicas) = service.desired_replicas {
        snapshot.push(Observation::new(
            Metric::DesiredReplicas,
            vec![service.name.clone()],
            replicas as f64,
        ));
    }

    if let Some(group) = tasks {
        for (state, count) in &group.states {
            snapshot.push(Observation::new(
                Metric::ServiceTasks,
                vec![service.name.clone(), (*state).to_owned()],
                *count as f64,
            ));
        }
    }

    snapshot.push(Observation::new(
        Metric::ServiceInfo,
        vec![service.name.clone(), service.image.clone()],
        1.0,
    ));

    if let Some(last_change) = tasks.and_then(|group| group.last_change) {
        snapshot.push(Observation::new(
            Metric::ServiceChangeTime,
            vec![service.name.clone()],
            last_change.timestamp() as f64,
        ));
    }
}
