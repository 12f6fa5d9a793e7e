use datagouv::DataGouvClient;
use serde::Deserialize;

use super::format::{DESCRIPTION_LIMIT, format_size, or_unknown, push_field, truncate};
use super::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, ToolResponse, check_range, required_id};
use crate::server::{ServerError, ServerResult};

/// Tags shown per dataset in search listings.
const TAGS_SHOWN: usize = 5;

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct SearchArgs {
    query: String,
    #[serde(default = "default_page")]
    page: u32,
    #[serde(default = "default_page_size")]
    page_size: u32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct DatasetArgs {
    dataset_id: String,
}

pub(super) async fn search_datasets(
    client: &DataGouvClient,
    args: SearchArgs,
) -> ServerResult<ToolResponse> {
    const TOOL: &str = "search_datasets";
    let query = args.query.trim();
    if query.is_empty() {
        return Err(ServerError::InvalidParams(format!("{TOOL}: query must not be empty")));
    }
    let page = check_range(TOOL, "page", args.page, 1, u32::MAX)?;
    let page_size = check_range(TOOL, "page_size", args.page_size, 1, MAX_PAGE_SIZE)?;

    let result = match client.catalog().search_datasets(query, page, page_size, None).await {
        Ok(result) => result,
        Err(err) => {
            tracing::warn!(query, error = %err, "dataset search failed");
            return Ok(ToolResponse::error(format!("Error searching datasets: {err}")));
        }
    };

    if result.data.is_empty() {
        return Ok(ToolResponse::text(format!(
            "No datasets found for '{query}' (page {page})."
        )));
    }

    let mut out = format!(
        "Found {} dataset(s) for '{query}' (page {page}, showing {}):\n\n",
        result.total, result.page_size
    );
    for (i, dataset) in result.data.iter().enumerate() {
        let position = (page as u64 - 1) * page_size as u64 + i as u64 + 1;
        let title = or_unknown(Some(dataset.title.as_str()), "Untitled");
        out.push_str(&format!("{position}. {title}\n"));
        out.push_str(&format!("   ID: {}\n", dataset.id));
        push_field(&mut out, "   ", "Organization", dataset.organization.as_deref());
        if !dataset.tags.is_empty() {
            let shown: Vec<&str> =
                dataset.tags.iter().take(TAGS_SHOWN).map(String::as_str).collect();
            let more = dataset.tags.len().saturating_sub(TAGS_SHOWN);
            let suffix = if more > 0 { format!(" (+{more})") } else { String::new() };
            out.push_str(&format!("   Tags: {}{suffix}\n", shown.join(", ")));
        }
        out.push_str(&format!("   Resources: {}\n", dataset.resources_count));
        let description = if dataset.description_short.trim().is_empty() {
            &dataset.description
        } else {
            &dataset.description_short
        };
        if !description.trim().is_empty() {
            out.push_str(&format!(
                "   Description: {}\n",
                truncate(description, DESCRIPTION_LIMIT)
            ));
        }
        out.push_str(&format!("   URL: {}\n\n", dataset.url));
    }

    let seen = (page as u64 - 1) * page_size as u64 + result.data.len() as u64;
    if result.total > seen {
        out.push_str(&format!("More results available: use page={}.\n", page.saturating_add(1)));
    }

    Ok(ToolResponse::text(out.trim_end()))
}

pub(super) async fn get_dataset_info(
    client: &DataGouvClient,
    args: DatasetArgs,
) -> ServerResult<ToolResponse> {
    let dataset_id = required_id("get_dataset_info", "dataset_id", &args.dataset_id)?;

    let dataset = match client.catalog().get_dataset_details(&dataset_id, None).await {
        Ok(dataset) => dataset,
        Err(err) => {
            return Ok(ToolResponse::error(format!(
                "Error fetching dataset {dataset_id}: {err}"
            )));
        }
    };

    let mut out = format!("Dataset: {}\n", or_unknown(dataset.title.as_deref(), "Untitled"));
    out.push_str(&format!("ID: {}\n", dataset.id.as_deref().unwrap_or(&dataset_id)));
    push_field(&mut out, "", "Slug", dataset.slug.as_deref());
    if let Some(org) = &dataset.organization {
        push_field(&mut out, "", "Organization", org.name.as_deref().or(org.slug.as_deref()));
    }
    let description = dataset.description.as_deref().or(dataset.description_short.as_deref());
    if let Some(description) = description {
        let description = truncate(description, DESCRIPTION_LIMIT);
        push_field(&mut out, "", "Description", Some(description.as_str()));
    }
    if !dataset.tags.is_empty() {
        out.push_str(&format!("Tags: {}\n", dataset.tags.join(", ")));
    }
    push_field(&mut out, "", "License", dataset.license.as_deref());
    push_field(&mut out, "", "Created", dataset.created_at.as_deref());
    push_field(&mut out, "", "Last modified", dataset.last_modified.as_deref());
    push_field(&mut out, "", "Last update", dataset.last_update.as_deref());
    push_field(&mut out, "", "Update frequency", dataset.frequency.as_deref());
    out.push_str(&format!("Resources: {}\n", dataset.resources.len()));
    push_field(&mut out, "", "URL", dataset.page.as_deref());

    Ok(ToolResponse::text(out.trim_end()))
}

pub(super) async fn list_dataset_resources(
    client: &DataGouvClient,
    args: DatasetArgs,
) -> ServerResult<ToolResponse> {
    let dataset_id = required_id("list_dataset_resources", "dataset_id", &args.dataset_id)?;

    let dataset = match client.catalog().get_dataset_details(&dataset_id, None).await {
        Ok(dataset) => dataset,
        Err(err) => {
            return Ok(ToolResponse::error(format!(
                "Error fetching resources of dataset {dataset_id}: {err}"
            )));
        }
    };

    let title = or_unknown(dataset.title.as_deref(), &dataset_id);
    if dataset.resources.is_empty() {
        return Ok(ToolResponse::text(format!("Dataset '{title}' has no resources.")));
    }

    let mut out = format!("Resources of dataset '{title}' ({}):\n\n", dataset.resources.len());
    for (i, resource) in dataset.resources.iter().enumerate() {
        let title = or_unknown(resource.title.as_deref(), &resource.id);
        out.push_str(&format!("{}. {title}\n", i + 1));
        out.push_str(&format!("   ID: {}\n", resource.id));
        push_field(&mut out, "   ", "Format", resource.format.as_deref());
        if let Some(size) = resource.filesize {
            out.push_str(&format!("   Size: {}\n", format_size(size)));
        }
        push_field(&mut out, "   ", "URL", resource.url.as_deref());
        out.push('\n');
    }

    Ok(ToolResponse::text(out.trim_end()))
}
