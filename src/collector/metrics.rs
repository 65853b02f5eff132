use std::fmt;

/// The gauges exported for every scrape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Metric {
    DesiredReplicas,
    ServiceTasks,
    ServiceInfo,
    ServiceChangeTime,
    ContainerStatus,
    ContainerHealthStatus,
}

impl Metric {
    pub const ALL: [Metric; 6] = [
        Metric::DesiredReplicas,
        Metric::ServiceTasks,
        Metric::ServiceInfo,
        Metric::ServiceChangeTime,
        Metric::ContainerStatus,
        Metric::ContainerHealthStatus,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Metric::DesiredReplicas => "swarm_service_desired_replicas",
            Metric::ServiceTasks => "swarm_service_tasks",
            Metric::ServiceInfo => "swarm_service_info",
            Metric::ServiceChangeTime => "swarm_service_change_time",
            Metric::ContainerStatus => "container_status",
            Metric::ContainerHealthStatus => "container_health_status",
        }
    }

    pub fn help(self) -> &'static str {
        match self {
            Metric::DesiredReplicas => "Number of replicas requested for this service",
            Metric::ServiceTasks => "Number of docker tasks",
            Metric::ServiceInfo => "Information about each service",
            Metric::ServiceChangeTime => "Time when a task state last changed",
            Metric::ContainerStatus => "Container status",
            Metric::ContainerHealthStatus => "Container Health Status",
        }
    }

    /// Label names, in the order observations carry their values.
    pub fn label_names(self) -> &'static [&'static str] {
        match self {
            Metric::DesiredReplicas | Metric::ServiceChangeTime => &["service_name"],
            Metric::ServiceTasks => &["service_name", "state"],
            Metric::ServiceInfo => &["service_name", "image"],
            Metric::ContainerStatus => &["container_status", "container_name"],
            Metric::ContainerHealthStatus => &["container_health_status", "container_name"],
        }
    }

    pub fn descriptor(self) -> MetricDescriptor {
        MetricDescriptor {
            metric: self,
            name: self.name(),
            help: self.help(),
            label_names: self.label_names(),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Static self-description of a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricDescriptor {
    pub metric: Metric,
    pub name: &'static str,
    pub help: &'static str,
    pub label_names: &'static [&'static str],
}

/// A single gauge value with its label values.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub metric: Metric,
    /// Label values, matching [`Metric::label_names`] position by position.
    pub labels: Vec<String>,
    pub value: f64,
}

impl Observation {
    pub fn new(metric: Metric, labels: Vec<String>, value: f64) -> Self {
        debug_assert_eq!(labels.len(), metric.label_names().len());
        Self {
            metric,
            labels,
            value,
        }
    }
}

/// All observations of one scrape.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    observations: Vec<Observation>,
}

impl Snapshot {
    pub fn push(&mut self, observation: Observation) {
        self.observations.push(observation);
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Returns the observations of a single metric.
    pub fn of(&self, metric: Metric) -> impl Iterator<Item = &Observation> {
        self.observations.iter().filter(move |o| o.metric == metric)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_names_are_unique() {
        let mut names: Vec<_> = Metric::ALL.iter().map(|m| m.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), Metric::ALL.len());
    }

    #[test]
    fn descriptor_matches_metric() {
        let desc = Metric::ServiceTasks.descriptor();
        assert_eq!(desc.name, "swarm_service_tasks");
        assert_eq!(desc.label_names, &["service_name", "state"]);
        assert_eq!(Metric::ServiceTasks.to_string(), "swarm_service_tasks");
    }

    #[test]
    fn snapshot_filters_by_metric() {
        let mut snapshot = Snapshot::default();
        snapshot.push(Observation::new(
            Metric::ServiceInfo,
            vec!["web".to_owned(), "nginx".to_owned()],
            1.0,
        ));
        snapshot.push(Observation::new(
            Metric::DesiredReplicas,
            vec!["web".to_owned()],
            2.0,
        ));
        assert_eq!(snapshot.observations().len(), 2);
        assert_eq!(snapshot.of(Metric::DesiredReplicas).count(), 1);
        assert_eq!(snapshot.of(Metric::ServiceTasks).count(), 0);
    }
}
