use datagouv::{DataGouvClient, DataGouvError};
use datagouv_api::UpstreamError;
use serde::Deserialize;

use super::format::{DESCRIPTION_LIMIT, format_size, or_unknown, push_field, push_row, truncate};
use super::{ToolResponse, check_range, required_id};
use crate::server::ServerResult;

pub(crate) const DEFAULT_PREVIEW_ROWS: u32 = 20;
pub(crate) const MAX_PREVIEW_ROWS: u32 = 500;

fn default_max_rows() -> u32 {
    DEFAULT_PREVIEW_ROWS
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct ResourceArgs {
    resource_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct DownloadArgs {
    resource_id: String,
    #[serde(default = "default_max_rows")]
    max_rows: u32,
}

pub(super) async fn get_resource_info(
    client: &DataGouvClient,
    args: ResourceArgs,
) -> ServerResult<ToolResponse> {
    let resource_id = required_id("get_resource_info", "resource_id", &args.resource_id)?;

    // Both lookups share one session.
    let failure = |err: UpstreamError| {
        ToolResponse::error(format!("Error fetching resource {resource_id}: {err}"))
    };
    let session = match client.config().api_config.open_session() {
        Ok(session) => session,
        Err(err) => return Ok(failure(err)),
    };

    let resource = match client.catalog().get_resource_details(&resource_id, Some(&session)).await {
        Ok(resource) => resource,
        Err(err) => return Ok(failure(err)),
    };

    let mut out = format!("Resource: {}\n", or_unknown(resource.title.as_deref(), "Untitled"));
    out.push_str(&format!("ID: {}\n", resource.id));
    push_field(&mut out, "", "Format", resource.format.as_deref());
    if let Some(size) = resource.filesize {
        out.push_str(&format!("Size: {}\n", format_size(size)));
    }
    push_field(&mut out, "", "MIME type", resource.mime.as_deref());
    push_field(&mut out, "", "Type", resource.resource_type.as_deref());
    push_field(&mut out, "", "URL", resource.url.as_deref());
    push_field(&mut out, "", "Created", resource.created_at.as_deref());
    push_field(&mut out, "", "Last modified", resource.last_modified.as_deref());
    if let Some(description) = resource.description.as_deref() {
        let description = truncate(description, DESCRIPTION_LIMIT);
        push_field(&mut out, "", "Description", Some(description.as_str()));
    }

    if let Some(dataset_id) = resource.dataset_id.as_deref() {
        match client.catalog().get_dataset_metadata(dataset_id, Some(&session)).await {
            Ok(dataset) => out.push_str(&format!(
                "Dataset: {} ({dataset_id})\n",
                or_unknown(dataset.title.as_deref(), "Untitled")
            )),
            Err(err) => {
                tracing::debug!(dataset_id, error = %err, "parent dataset lookup failed");
                out.push_str(&format!("Dataset ID: {dataset_id}\n"));
            }
        }
    }

    out.push('\n');
    if resource.tabular_eligible {
        out.push_str("Tabular API: available. Use query_dataset_data to query its rows.");
    } else {
        out.push_str(
            "Tabular API: not available. Use download_and_parse_resource to preview the file.",
        );
    }

    Ok(ToolResponse::text(out))
}

pub(super) async fn download_and_parse_resource(
    client: &DataGouvClient,
    args: DownloadArgs,
) -> ServerResult<ToolResponse> {
    const TOOL: &str = "download_and_parse_resource";
    let resource_id = required_id(TOOL, "resource_id", &args.resource_id)?;
    let max_rows = check_range(TOOL, "max_rows", args.max_rows, 1, MAX_PREVIEW_ROWS)?;

    let parsed = match client.download_and_parse(&resource_id, max_rows as usize).await {
        Ok(parsed) => parsed,
        Err(err) => {
            tracing::warn!(resource_id = %resource_id, error = %err, "download and parse failed");
            let hint = match &err {
                DataGouvError::UnsupportedFormat { .. } => {
                    "\nOnly CSV, JSON and JSON Lines files (optionally gzipped) can be previewed."
                }
                DataGouvError::TooLarge { .. } => {
                    "\nTry query_dataset_data if the resource is served by the tabular API."
                }
                _ if err.as_upstream().and_then(UpstreamError::status) == Some(404) => {
                    "\nCheck the resource ID with list_dataset_resources."
                }
                _ => "",
            };
            return Ok(ToolResponse::error(format!(
                "Error downloading resource {resource_id}: {err}{hint}"
            )));
        }
    };

    let table = &parsed.table;
    let mut out = format!(
        "Resource: {} ({})\n",
        or_unknown(parsed.resource.title.as_deref(), "Untitled"),
        parsed.resource.id
    );
    let compression = if parsed.compressed { ", gzip-compressed" } else { "" };
    out.push_str(&format!("Format: {}{compression}\n", parsed.format));
    if let Some(delimiter) = table.delimiter {
        let shown = if delimiter == '\t' { "\\t".to_string() } else { delimiter.to_string() };
        out.push_str(&format!("Delimiter: '{shown}'\n"));
    }
    out.push_str(&format!("Downloaded: {}\n", format_size(parsed.downloaded_bytes)));
    out.push_str(&format!("Total rows: {}\n", table.total_rows));
    out.push_str(&format!("Columns ({}): {}\n\n", table.columns.len(), table.columns.join(", ")));

    if table.rows.is_empty() {
        out.push_str("The file contains no rows.");
        return Ok(ToolResponse::text(out));
    }

    for (i, row) in table.rows.iter().enumerate() {
        push_row(&mut out, i + 1, &table.columns, row);
    }
    if table.total_rows > table.rows.len() {
        out.push_str(&format!(
            "\nShowing {} of {} rows.",
            table.rows.len(),
            table.total_rows
        ));
    }

    Ok(ToolResponse::text(out.trim_end()))
}
