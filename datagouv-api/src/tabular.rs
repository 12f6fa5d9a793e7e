use std::sync::Arc;

use crate::config::{Configuration, segment};
use crate::error::UpstreamResult;
use crate::models::{RawProfileEnvelope, ResourceProfile, RowQuery, TabularPage};
use crate::session::Session;

/// Client for the tabular query API
///
/// Only resources the tabular pipeline has loaded can be queried. Eligibility
/// is not checked here: querying any other resource is sent upstream as-is and
/// its 404 or 400 comes back as [`crate::UpstreamError::Status`].
#[derive(Clone)]
pub struct TabularClient {
    configuration: Arc<Configuration>,
}

impl std::fmt::Debug for TabularClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TabularClient")
            .field("base_path", &self.configuration.endpoints.tabular_api)
            .finish()
    }
}

impl TabularClient {
    pub fn new(configuration: Arc<Configuration>) -> Self {
        Self { configuration }
    }

    /// Fetch one page of rows, filtered and sorted as described by `query`
    ///
    /// ```rust,no_run
    /// # use datagouv_api::{Configuration, TabularClient};
    /// # use datagouv_api::models::{FilterOperator, RowQuery, SortDirection};
    /// # use std::sync::Arc;
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let tabular = TabularClient::new(Arc::new(Configuration::default()));
    /// let query = RowQuery::new(1, 50)
    ///     .with_filter("departement", FilterOperator::Exact, Some("29".into()))
    ///     .with_sort("population", SortDirection::Desc);
    ///
    /// let page = tabular.query_resource_rows("3b6b2281-b9d9-4959-ae9d-c2c166dff118", &query, None).await?;
    /// println!("{} rows in total", page.meta.total.unwrap_or(0));
    /// # Ok(())
    /// # }
    /// ```
    pub async fn query_resource_rows(
        &self,
        resource_id: &str,
        query: &RowQuery,
        session: Option<&Session>,
    ) -> UpstreamResult<TabularPage> {
        let url = self
            .configuration
            .endpoints
            .tabular(&format!("resources/{}/data/", segment(resource_id)));
        let request = query
            .params()
            .into_iter()
            .fold(self.configuration.request(url), |request, (key, value)| {
                request.param(key, value)
            });

        let session = self.configuration.acquire(session)?;
        session.get_json(&request).await
    }

    /// Fetch the column profile (header and detected types) of a resource.
    pub async fn get_resource_profile(
        &self,
        resource_id: &str,
        session: Option<&Session>,
    ) -> UpstreamResult<ResourceProfile> {
        let url = self
            .configuration
            .endpoints
            .tabular(&format!("resources/{}/profile/", segment(resource_id)));
        let request = self.configuration.request(url);

        let session = self.configuration.acquire(session)?;
        let envelope: RawProfileEnvelope = session.get_json(&request).await?;
        Ok(envelope.profile)
    }
}
