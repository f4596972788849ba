//! Run-level error boundary: one token, then every resource in turn.

use std::path::Path;
use whoop_client::{
    CredentialStore, FetchFailure, FetchReport, JsonLinesSink, LineFormat, PageFetcher, Resource,
    TokenManager, WhoopError,
};

#[derive(Debug)]
pub struct ResourceOutcome {
    pub resource: Resource,
    pub result: Result<FetchReport, FetchFailure>,
}

#[derive(Debug, Default)]
pub struct SyncSummary {
    pub outcomes: Vec<ResourceOutcome>,
}

impl SyncSummary {
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = &ResourceOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }

    /// Records written across all resources, including partial runs.
    pub fn records(&self) -> usize {
        self.outcomes
            .iter()
            .map(|o| match &o.result {
                Ok(report) => report.records,
                Err(failure) => failure.records,
            })
            .sum()
    }
}

/// Obtain an access token, then drain each resource into
/// `<output_dir>/<resource>.log`.
///
/// Only a token failure aborts the whole run. A failing resource is logged and
/// recorded, and the remaining resources are still attempted.
pub async fn run_sync<S: CredentialStore>(
    tokens: &TokenManager<S>,
    fetcher: &PageFetcher,
    resources: &[Resource],
    output_dir: &Path,
    format: LineFormat,
) -> Result<SyncSummary, WhoopError> {
    let token = tokens.obtain().await?;
    let mut summary = SyncSummary::default();

    for &resource in resources {
        let log = output_dir.join(resource.log_file());
        tracing::info!(%resource, file = %log.display(), "exporting");

        let result = match JsonLinesSink::append_to_file(&log, format) {
            Ok(mut sink) => fetcher.fetch(resource.path(), &token, &mut sink).await,
            Err(source) => Err(FetchFailure {
                resource_path: resource.path().to_string(),
                pages: 0,
                records: 0,
                source,
            }),
        };

        match &result {
            Ok(report) => tracing::info!(
                %resource,
                pages = report.pages,
                records = report.records,
                "export complete"
            ),
            Err(failure) => tracing::error!(%resource, "export incomplete: {failure}"),
        }
        summary.outcomes.push(ResourceOutcome { resource, result });
    }

    Ok(summary)
}
