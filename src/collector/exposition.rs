use prometheus::{Encoder, GaugeVec, Opts, Registry, TextEncoder};

use super::metrics::{MetricDescriptor, Snapshot};
use super::{Error, Result};

/// Content type of the rendered exposition.
pub fn content_type() -> String {
    TextEncoder::new().format_type().to_owned()
}

/// Renders a snapshot in the Prometheus text exposition format.
///
/// A fresh [`Registry`] is built for every call: one [`GaugeVec`] per
/// descriptor, populated from the snapshot. Observations of metrics without a
/// descriptor are dropped with a warning.
///
/// # Errors
///
/// Returns [`Error::Exposition`] if a gauge cannot be created or registered,
/// or if encoding fails.
pub fn render(descriptors: &[MetricDescriptor], snapshot: &Snapshot) -> Result<String> {
    let registry = Registry::new();
    let mut gauges = Vec::with_capacity(descriptors.len());
    for desc in descriptors {
        let gauge = GaugeVec::new(Opts::new(desc.name, desc.help), desc.label_names)
            .map_err(Error::Exposition)?;
        registry
            .register(Box::new(gauge.clone()))
            .map_err(Error::Exposition)?;
        gauges.push((desc.metric, gauge));
    }

    for observation in snapshot.observations() {
        let Some((_, gauge)) = gauges.iter().find(|(m, _)| *m == observation.metric) else {
            log::warn!(
                "Dropping observation for undeclared metric `{}`",
                observation.metric
            );
            continue;
        };
        let labels: Vec<&str> = observation.labels.iter().map(String::as_str).collect();
        gauge
            .get_metric_with_label_values(&labels)
            .map_err(Error::Exposition)?
            .set(observation.value);
    }

    let mut out = String::new();
    TextEncoder::new()
        .encode_utf8(&registry.gather(), &mut out)
        .map_err(Error::Exposition)?;
    Ok(out)
}
