use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::dataset::DatasetMetadata;

/// Extras key set once the tabular pipeline has loaded a resource.
pub(crate) const PARSING_TABLE_EXTRA: &str = "analysis:parsing:parsing_table";

/// Body of `GET /2/datasets/resources/{id}/`
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawResourceEnvelope {
    #[serde(default)]
    pub resource: Option<RawResource>,
    #[serde(default)]
    pub dataset_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawResource {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub filesize: Option<u64>,
    #[serde(default)]
    pub mime: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, rename = "type")]
    pub resource_type: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub last_modified: Option<String>,
    #[serde(default)]
    pub extras: Option<Map<String, Value>>,
}

impl RawResourceEnvelope {
    pub(crate) fn into_metadata(self, requested_id: &str) -> ResourceMetadata {
        let resource = self.resource.unwrap_or_default();
        ResourceMetadata {
            id: resource.id.unwrap_or_else(|| requested_id.to_string()),
            title: resource.title.or(resource.name),
            description: resource.description,
            dataset_id: self.dataset_id,
        }
    }

    pub(crate) fn into_details(self, requested_id: &str) -> ResourceDetails {
        let resource = self.resource.unwrap_or_default();
        let tabular_eligible = resource
            .extras
            .as_ref()
            .and_then(|extras| extras.get(PARSING_TABLE_EXTRA))
            .is_some_and(|value| !value.is_null());

        ResourceDetails {
            id: resource.id.unwrap_or_else(|| requested_id.to_string()),
            title: resource.title.or(resource.name),
            description: resource.description,
            format: resource.format,
            filesize: resource.filesize,
            mime: resource.mime,
            url: resource.url,
            resource_type: resource.resource_type,
            created_at: resource.created_at,
            last_modified: resource.last_modified,
            dataset_id: self.dataset_id,
            tabular_eligible,
        }
    }
}

/// Lightweight resource description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceMetadata {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Parent dataset, when upstream links one
    pub dataset_id: Option<String>,
}

/// Full resource description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDetails {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub format: Option<String>,
    /// Size in bytes
    pub filesize: Option<u64>,
    pub mime: Option<String>,
    /// Download URL of the file
    pub url: Option<String>,
    /// Upstream resource type (`main`, `documentation`, `api`, ...)
    pub resource_type: Option<String>,
    pub created_at: Option<String>,
    pub last_modified: Option<String>,
    pub dataset_id: Option<String>,
    /// Whether rows can be queried through the tabular API
    pub tabular_eligible: bool,
}

/// A resource with the metadata of its parent dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceWithDataset {
    pub resource: ResourceMetadata,
    /// `None` when the resource references no dataset
    pub dataset: Option<DatasetMetadata>,
}
