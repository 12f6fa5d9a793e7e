use std::time::Duration;

use futures::StreamExt;
use serde::Serialize;
use url::Url;

use datagouv_api::models::ResourceDetails;
use datagouv_api::{CatalogClient, Environment, MetricsClient, TabularClient};

use crate::config::DataGouvConfig;
use crate::error::{DataGouvError, Result};
use crate::parse::{self, FileFormat, ParsedTable};

/// Raw bytes of a downloaded resource file
#[derive(Debug, Clone)]
pub struct DownloadedResource {
    /// URL the file was fetched from
    pub url: String,
    /// `Content-Type` reported by the file host
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// A resource file parsed into a preview table
#[derive(Debug, Clone, Serialize)]
pub struct ParsedResource {
    pub resource: ResourceDetails,
    pub format: FileFormat,
    /// Whether the file was served gzip-compressed
    pub compressed: bool,
    /// Size of the file as downloaded
    pub downloaded_bytes: u64,
    pub table: ParsedTable,
}

/// High-level client for interacting with data.gouv.fr
///
/// This client bundles the catalog, tabular and metrics clients built from one
/// configuration, and adds a download path for resource files that the
/// tabular API does not serve.
#[derive(Debug)]
pub struct DataGouvClient {
    catalog: CatalogClient,
    tabular: TabularClient,
    metrics: MetricsClient,
    config: DataGouvConfig,
    http_client: reqwest::Client,
}

impl DataGouvClient {
    /// Create a new client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(DataGouvConfig::new())
    }

    /// Create a new client with custom configuration
    pub fn with_config(config: DataGouvConfig) -> Result<Self> {
        let catalog = CatalogClient::new(config.api_config.clone());
        let tabular = TabularClient::new(config.api_config.clone());
        let metrics = MetricsClient::new(config.api_config.clone());

        // Downloads get their own client with a much longer timeout
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.download_timeout_secs))
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self {
            catalog,
            tabular,
            metrics,
            config,
            http_client,
        })
    }

    pub fn catalog(&self) -> &CatalogClient {
        &self.catalog
    }

    pub fn tabular(&self) -> &TabularClient {
        &self.tabular
    }

    pub fn metrics(&self) -> &MetricsClient {
        &self.metrics
    }

    pub fn config(&self) -> &DataGouvConfig {
        &self.config
    }

    pub fn environment(&self) -> Environment {
        self.config.environment()
    }

    // === File Downloads ===

    /// Download a resource file into memory
    ///
    /// The body is streamed and the download aborts as soon as it exceeds
    /// `max_download_bytes`.
    pub async fn download_resource(
        &self,
        resource: &ResourceDetails,
    ) -> Result<DownloadedResource> {
        let url = resource
            .url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| {
                DataGouvError::resource_not_found(format!("resource {} has no URL", resource.id))
            })?;
        let url = Url::parse(url.trim())?;
        let limit = self.config.max_download_bytes;

        tracing::info!(resource = %resource.id, url = %url, "downloading resource");

        let response = self
            .http_client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| self.download_failure(&url, e))?;

        if !response.status().is_success() {
            return Err(DataGouvError::download_error(format!(
                "HTTP {} while downloading {}",
                response.status(),
                url
            )));
        }

        if response.content_length().is_some_and(|len| len > limit) {
            return Err(DataGouvError::TooLarge { limit });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| self.download_failure(&url, e))?;
            if (bytes.len() + chunk.len()) as u64 > limit {
                tracing::warn!(resource = %resource.id, limit, "download exceeded size limit");
                return Err(DataGouvError::TooLarge { limit });
            }
            bytes.extend_from_slice(&chunk);
        }

        tracing::debug!(resource = %resource.id, bytes = bytes.len(), "download complete");

        Ok(DownloadedResource {
            url: url.to_string(),
            content_type,
            bytes,
        })
    }

    /// Download a resource file and parse its first `max_rows` records
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// # use datagouv::DataGouvClient;
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let client = DataGouvClient::new()?;
    /// let parsed = client.download_and_parse("a1b2c3", 10).await?;
    /// println!("{} rows, columns {:?}", parsed.table.total_rows, parsed.table.columns);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn download_and_parse(
        &self,
        resource_id: &str,
        max_rows: usize,
    ) -> Result<ParsedResource> {
        let resource = self.catalog.get_resource_details(resource_id, None).await?;
        let downloaded = self.download_resource(&resource).await?;

        let (format, compressed) = parse::detect_format(
            resource.format.as_deref(),
            Some(&downloaded.url),
            &downloaded.bytes,
        )?;

        let downloaded_bytes = downloaded.bytes.len() as u64;
        let content = if compressed {
            parse::gunzip(&downloaded.bytes, self.config.max_download_bytes)?
        } else {
            downloaded.bytes
        };

        let table = parse::parse_table(format, &content, max_rows)?;
        tracing::debug!(
            resource = %resource.id,
            format = %format,
            rows = table.total_rows,
            "parsed resource file"
        );

        Ok(ParsedResource {
            resource,
            format,
            compressed,
            downloaded_bytes,
            table,
        })
    }

    fn download_failure(&self, url: &Url, err: reqwest::Error) -> DataGouvError {
        if err.is_timeout() {
            DataGouvError::download_error(format!(
                "timed out after {}s while downloading {}",
                self.config.download_timeout_secs, url
            ))
        } else {
            DataGouvError::HttpError(err)
        }
    }
}
