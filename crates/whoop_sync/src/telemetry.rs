//! Prometheus snapshot of the counters the client records during a run.

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::path::Path;

/// Install the global recorder. Only one may be installed per process.
pub fn install() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Write the current counters in the Prometheus text format.
pub fn write_snapshot(handle: &PrometheusHandle, path: &Path) -> std::io::Result<()> {
    std::fs::write(path, handle.render())?;
    tracing::debug!(path = %path.display(), "metrics snapshot written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_contains_recorded_counters() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        metrics::with_local_recorder(&recorder, || {
            metrics::counter!("whoop_records_total", "resource" => "v1/activity/sleep")
                .increment(3);
            metrics::counter!("whoop_api_requests_total").increment(2);
        });

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.prom");
        write_snapshot(&handle, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains(r#"whoop_records_total{resource="v1/activity/sleep"} 3"#));
        assert!(text.contains("whoop_api_requests_total 2"));
    }
}
