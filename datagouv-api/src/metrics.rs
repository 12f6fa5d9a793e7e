use std::sync::Arc;

use crate::config::Configuration;
use crate::error::{UpstreamError, UpstreamResult};
use crate::models::{MetricsReport, MonthlyMetric, RawMetricsPage};
use crate::session::Session;

/// Number of months returned when the caller does not ask for another count.
pub const DEFAULT_MONTHS: u32 = 12;

/// Client for the usage metrics API (monthly visits and downloads)
///
/// The metrics API only knows production identifiers. Requests are forwarded
/// whatever the configured environment and upstream failures are reported
/// as-is.
#[derive(Clone)]
pub struct MetricsClient {
    configuration: Arc<Configuration>,
}

impl std::fmt::Debug for MetricsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsClient")
            .field("base_path", &self.configuration.endpoints.metrics_api)
            .finish()
    }
}

impl MetricsClient {
    pub fn new(configuration: Arc<Configuration>) -> Self {
        Self { configuration }
    }

    /// Fetch the latest `months` monthly counts of a dataset and/or a resource
    ///
    /// At least one identifier is required; with none the call fails with
    /// [`UpstreamError::InvalidArgument`] before any request is sent. When both
    /// are given the two series are fetched over one session. Series are
    /// ordered newest month first.
    pub async fn get_metrics(
        &self,
        dataset_id: Option<&str>,
        resource_id: Option<&str>,
        months: u32,
        session: Option<&Session>,
    ) -> UpstreamResult<MetricsReport> {
        let dataset_id = dataset_id.map(str::trim).filter(|id| !id.is_empty());
        let resource_id = resource_id.map(str::trim).filter(|id| !id.is_empty());
        if dataset_id.is_none() && resource_id.is_none() {
            return Err(UpstreamError::InvalidArgument(
                "a dataset_id or a resource_id is required".to_string(),
            ));
        }

        let session = self.configuration.acquire(session)?;
        let months = months.max(1);

        let mut report = MetricsReport::default();
        if let Some(id) = dataset_id {
            report.dataset = Some(
                self.fetch_series(&session, "datasets", "dataset_id", id, months)
                    .await?,
            );
        }
        if let Some(id) = resource_id {
            report.resource = Some(
                self.fetch_series(&session, "resources", "resource_id", id, months)
                    .await?,
            );
        }
        Ok(report)
    }

    async fn fetch_series(
        &self,
        session: &Session,
        collection: &str,
        id_field: &str,
        id: &str,
        months: u32,
    ) -> UpstreamResult<Vec<MonthlyMetric>> {
        let url = self
            .configuration
            .endpoints
            .metrics(&format!("{collection}/data/"));
        let request = self
            .configuration
            .request(url)
            .param(format!("{id_field}__exact"), id)
            .param("metric_month__sort", "desc")
            .param("page_size", months);

        let page: RawMetricsPage = session.get_json(&request).await?;
        Ok(page.data.into_iter().map(MonthlyMetric::from).collect())
    }
}
