use serde::{Deserialize, Serialize};

use super::tag::deserialize_tags;
use crate::environment::Endpoints;

/// Dataset as returned by the v1 catalog API, in listings and detail calls
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawDataset {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub description_short: Option<String>,
    #[serde(default)]
    pub organization: Option<RawOrganization>,
    #[serde(default, deserialize_with = "deserialize_tags")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub license: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub last_modified: Option<String>,
    #[serde(default)]
    pub last_update: Option<String>,
    #[serde(default)]
    pub frequency: Option<String>,
    #[serde(default)]
    pub page: Option<String>,
    #[serde(default)]
    pub resources: Option<Vec<RawDatasetResource>>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawOrganization {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawDatasetResource {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub filesize: Option<u64>,
    #[serde(default)]
    pub mime: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// One page of the v1 dataset listing
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawSearchPage {
    #[serde(default)]
    pub data: Vec<RawDataset>,
    #[serde(default)]
    pub total: Option<u64>,
}

impl RawDataset {
    fn display_title(&self) -> Option<String> {
        self.title.clone().or_else(|| self.name.clone())
    }

    fn resources(&self) -> &[RawDatasetResource] {
        self.resources.as_deref().unwrap_or_default()
    }

    pub(crate) fn into_summary(self, endpoints: &Endpoints) -> DatasetSummary {
        let id = self.id.clone().unwrap_or_default();
        let slug = self.slug.clone().unwrap_or_default();
        let page_key = if slug.is_empty() { id.as_str() } else { slug.as_str() };
        DatasetSummary {
            url: endpoints.dataset_page(page_key),
            title: self.display_title().unwrap_or_default(),
            resources_count: self.resources().len(),
            organization: self.organization.and_then(|org| org.name),
            description: self.description.unwrap_or_default(),
            description_short: self.description_short.unwrap_or_default(),
            tags: self.tags,
            id,
            slug,
        }
    }

    pub(crate) fn metadata(&self) -> DatasetMetadata {
        DatasetMetadata {
            id: self.id.clone(),
            title: self.display_title(),
            description_short: self.description_short.clone(),
            description: self.description.clone(),
        }
    }

    pub(crate) fn resource_refs(&self) -> Vec<ResourceRef> {
        self.resources()
            .iter()
            .filter_map(|res| {
                let id = res.id.clone().filter(|id| !id.is_empty())?;
                let title = res
                    .title
                    .clone()
                    .filter(|t| !t.is_empty())
                    .or_else(|| res.name.clone())
                    .unwrap_or_default();
                Some(ResourceRef { id, title })
            })
            .collect()
    }

    pub(crate) fn into_details(self) -> DatasetDetails {
        let resources = self
            .resources()
            .iter()
            .filter_map(|res| {
                Some(ResourceSummary {
                    id: res.id.clone()?,
                    title: res.title.clone().or_else(|| res.name.clone()),
                    format: res.format.clone(),
                    filesize: res.filesize,
                    mime: res.mime.clone(),
                    url: res.url.clone(),
                })
            })
            .collect();

        DatasetDetails {
            title: self.display_title(),
            id: self.id,
            slug: self.slug,
            description: self.description,
            description_short: self.description_short,
            organization: self.organization.map(|org| OrganizationRef {
                id: org.id,
                name: org.name,
                slug: org.slug,
            }),
            tags: self.tags,
            license: self.license,
            created_at: self.created_at,
            last_modified: self.last_modified,
            last_update: self.last_update,
            frequency: self.frequency,
            page: self.page,
            resources,
        }
    }
}

/// Dataset entry of a search page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub id: String,
    pub title: String,
    pub description: String,
    pub description_short: String,
    pub slug: String,
    pub organization: Option<String>,
    pub tags: Vec<String>,
    pub resources_count: usize,
    /// Public page of the dataset
    pub url: String,
}

/// Result of a dataset search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchPage {
    pub data: Vec<DatasetSummary>,
    pub page: u32,
    /// Number of datasets on this page
    pub page_size: usize,
    /// Total number of matches upstream
    pub total: u64,
}

/// Lightweight dataset description
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DatasetMetadata {
    pub id: Option<String>,
    pub title: Option<String>,
    pub description_short: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationRef {
    pub id: Option<String>,
    pub name: Option<String>,
    pub slug: Option<String>,
}

/// Resource entry embedded in a dataset payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSummary {
    pub id: String,
    pub title: Option<String>,
    pub format: Option<String>,
    pub filesize: Option<u64>,
    pub mime: Option<String>,
    pub url: Option<String>,
}

/// Full dataset payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetDetails {
    pub id: Option<String>,
    pub title: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub description_short: Option<String>,
    pub organization: Option<OrganizationRef>,
    pub tags: Vec<String>,
    pub license: Option<String>,
    pub created_at: Option<String>,
    pub last_modified: Option<String>,
    pub last_update: Option<String>,
    pub frequency: Option<String>,
    /// Public page as reported by upstream
    pub page: Option<String>,
    pub resources: Vec<ResourceSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRef {
    pub id: String,
    pub title: String,
}

/// Dataset metadata with its resources, in upstream order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetResources {
    pub dataset: DatasetMetadata,
    pub resources: Vec<ResourceRef>,
}
