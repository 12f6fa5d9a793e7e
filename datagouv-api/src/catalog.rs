use std::sync::Arc;

use crate::config::{Configuration, segment};
use crate::error::UpstreamResult;
use crate::models::{
    self, DatasetDetails, DatasetMetadata, DatasetResources, ResourceDetails, ResourceMetadata,
    ResourceWithDataset, SearchPage,
};
use crate::session::Session;

/// Largest page size accepted by the dataset listing.
pub const MAX_PAGE_SIZE: u32 = 100;

/// # Catalog client
///
/// Client for the data.gouv.fr dataset catalog. Datasets are read from the
/// `1/` namespace, resources from the richer `2/datasets/resources/` family.
///
/// Every method accepts an optional [`Session`]. Pass one to share a
/// connection across several calls; pass `None` and the method opens its own
/// session and closes it before returning.
///
/// ## Usage
///
/// ```rust,no_run
/// use datagouv_api::{CatalogClient, Configuration, Environment};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = Arc::new(Configuration::for_environment(Environment::Production));
///     let catalog = CatalogClient::new(config);
///
///     let page = catalog.search_datasets("qualité de l'air", 1, 10, None).await?;
///     println!("{} datasets match", page.total);
///     for dataset in page.data {
///         println!("{} ({} resources)", dataset.title, dataset.resources_count);
///     }
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct CatalogClient {
    configuration: Arc<Configuration>,
}

impl std::fmt::Debug for CatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogClient")
            .field("base_path", &self.configuration.endpoints.catalog_api)
            .finish()
    }
}

impl CatalogClient {
    pub fn new(configuration: Arc<Configuration>) -> Self {
        Self { configuration }
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    /// Search datasets by full text
    ///
    /// # Arguments
    ///
    /// * `query` - Search terms, matched against titles, descriptions and tags
    /// * `page` - 1-based page number (0 is treated as 1)
    /// * `page_size` - Results per page, clamped to `1..=100`
    /// * `session` - Optional session to reuse
    ///
    /// # Returns
    ///
    /// Datasets in upstream order. Tags are flattened to plain names whether
    /// upstream sent strings or `{"name": ...}` objects. `page_size` in the
    /// result is the number of datasets actually returned.
    pub async fn search_datasets(
        &self,
        query: &str,
        page: u32,
        page_size: u32,
        session: Option<&Session>,
    ) -> UpstreamResult<SearchPage> {
        let page = page.max(1);
        let request = self
            .configuration
            .request(self.configuration.endpoints.catalog("1/datasets/"))
            .param("q", query)
            .param("page", page)
            .param("page_size", page_size.clamp(1, MAX_PAGE_SIZE));

        let session = self.configuration.acquire(session)?;
        let raw: models::RawSearchPage = session.get_json(&request).await?;

        let data: Vec<_> = raw
            .data
            .into_iter()
            .map(|dataset| dataset.into_summary(&self.configuration.endpoints))
            .collect();

        Ok(SearchPage {
            page,
            page_size: data.len(),
            total: raw.total.unwrap_or(data.len() as u64),
            data,
        })
    }

    async fn fetch_dataset(
        &self,
        dataset_id: &str,
        session: Option<&Session>,
    ) -> UpstreamResult<models::RawDataset> {
        let url = self
            .configuration
            .endpoints
            .catalog(&format!("1/datasets/{}/", segment(dataset_id)));
        let request = self.configuration.request(url);

        let session = self.configuration.acquire(session)?;
        session.get_json(&request).await
    }

    /// Fetch the title and descriptions of a dataset.
    pub async fn get_dataset_metadata(
        &self,
        dataset_id: &str,
        session: Option<&Session>,
    ) -> UpstreamResult<DatasetMetadata> {
        let raw = self.fetch_dataset(dataset_id, session).await?;
        Ok(raw.metadata())
    }

    /// Fetch the full dataset: organization, tags, license, dates and resources.
    pub async fn get_dataset_details(
        &self,
        dataset_id: &str,
        session: Option<&Session>,
    ) -> UpstreamResult<DatasetDetails> {
        let raw = self.fetch_dataset(dataset_id, session).await?;
        Ok(raw.into_details())
    }

    /// List `(id, title)` pairs of a dataset's resources, in upstream order.
    ///
    /// Resources without an identifier are skipped.
    pub async fn get_resources_for_dataset(
        &self,
        dataset_id: &str,
        session: Option<&Session>,
    ) -> UpstreamResult<DatasetResources> {
        let raw = self.fetch_dataset(dataset_id, session).await?;
        Ok(DatasetResources {
            dataset: raw.metadata(),
            resources: raw.resource_refs(),
        })
    }

    async fn fetch_resource(
        &self,
        resource_id: &str,
        session: Option<&Session>,
    ) -> UpstreamResult<models::RawResourceEnvelope> {
        let url = self
            .configuration
            .endpoints
            .catalog(&format!("2/datasets/resources/{}/", segment(resource_id)));
        let request = self.configuration.request(url);

        let session = self.configuration.acquire(session)?;
        session.get_json(&request).await
    }

    /// Fetch a resource's title, description and parent dataset id.
    pub async fn get_resource_metadata(
        &self,
        resource_id: &str,
        session: Option<&Session>,
    ) -> UpstreamResult<ResourceMetadata> {
        let envelope = self.fetch_resource(resource_id, session).await?;
        Ok(envelope.into_metadata(resource_id))
    }

    /// Fetch format, size, MIME type, URL and tabular eligibility of a resource.
    pub async fn get_resource_details(
        &self,
        resource_id: &str,
        session: Option<&Session>,
    ) -> UpstreamResult<ResourceDetails> {
        let envelope = self.fetch_resource(resource_id, session).await?;
        Ok(envelope.into_details(resource_id))
    }

    /// Fetch a resource, then the metadata of the dataset it belongs to
    ///
    /// Both calls share one session. If the resource call fails its error is
    /// returned unchanged and the dataset is never requested. A resource that
    /// names no parent dataset yields `dataset: None`.
    pub async fn get_resource_and_dataset_metadata(
        &self,
        resource_id: &str,
        session: Option<&Session>,
    ) -> UpstreamResult<ResourceWithDataset> {
        let session = self.configuration.acquire(session)?;

        let resource = self.get_resource_metadata(resource_id, Some(&*session)).await?;
        let dataset = match resource.dataset_id.as_deref() {
            Some(dataset_id) if !dataset_id.is_empty() => {
                Some(self.get_dataset_metadata(dataset_id, Some(&*session)).await?)
            }
            _ => None,
        };

        Ok(ResourceWithDataset { resource, dataset })
    }
}
