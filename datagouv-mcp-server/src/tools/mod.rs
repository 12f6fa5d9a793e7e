//! The seven data.gouv.fr tools exposed over MCP.
//!
//! Every tool renders its outcome as text. Upstream failures come back as a
//! [`ToolResponse`] flagged `isError`; only malformed arguments become
//! JSON-RPC errors.

mod datasets;
pub mod format;
mod metrics;
mod resources;
mod tabular;

use datagouv::DataGouvClient;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Value, json};

use crate::server::{ServerError, ServerResult};

pub(crate) const DEFAULT_PAGE_SIZE: u32 = 20;
pub(crate) const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Serialize)]
pub struct ToolDescriptor {
    name: &'static str,
    description: &'static str,
    #[serde(rename = "inputSchema")]
    input_schema: Value,
}

#[derive(Debug, Serialize)]
pub struct ToolResponse {
    content: Vec<ToolContent>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "isError")]
    is_error: Option<bool>,
}

impl ToolResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
            is_error: None,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
            is_error: Some(true),
        }
    }

    pub fn is_error(&self) -> bool {
        self.is_error.unwrap_or(false)
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum ToolContent {
    #[serde(rename = "text")]
    Text { text: String },
}

/// Run the named tool with raw JSON arguments.
pub async fn call_tool(
    client: &DataGouvClient,
    name: &str,
    arguments: Option<Value>,
) -> ServerResult<ToolResponse> {
    match name {
        "search_datasets" => {
            datasets::search_datasets(client, parse_arguments(name, arguments)?).await
        }
        "get_dataset_info" => {
            datasets::get_dataset_info(client, parse_arguments(name, arguments)?).await
        }
        "list_dataset_resources" => {
            datasets::list_dataset_resources(client, parse_arguments(name, arguments)?).await
        }
        "get_resource_info" => {
            resources::get_resource_info(client, parse_arguments(name, arguments)?).await
        }
        "query_dataset_data" => {
            tabular::query_dataset_data(client, parse_arguments(name, arguments)?).await
        }
        "download_and_parse_resource" => {
            resources::download_and_parse_resource(client, parse_arguments(name, arguments)?).await
        }
        "get_metrics" => metrics::get_metrics(client, parse_arguments(name, arguments)?).await,
        other => Err(ServerError::UnknownTool(other.to_string())),
    }
}

/// Missing arguments decode like an empty object, so defaults still apply.
fn parse_arguments<T: DeserializeOwned>(tool: &str, arguments: Option<Value>) -> ServerResult<T> {
    let arguments = match arguments {
        None | Some(Value::Null) => json!({}),
        Some(value) => value,
    };
    serde_json::from_value(arguments)
        .map_err(|err| ServerError::InvalidParams(format!("{tool}: {err}")))
}

/// Reject blank identifiers before any upstream call.
pub(crate) fn required_id(tool: &str, field: &str, value: &str) -> ServerResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ServerError::InvalidParams(format!("{tool}: {field} must not be empty")));
    }
    Ok(value.to_string())
}

pub(crate) fn check_range(
    tool: &str,
    field: &str,
    value: u32,
    min: u32,
    max: u32,
) -> ServerResult<u32> {
    if !(min..=max).contains(&value) {
        return Err(ServerError::InvalidParams(format!(
            "{tool}: {field} must be between {min} and {max}, got {value}"
        )));
    }
    Ok(value)
}

pub fn tool_descriptors() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor {
            name: "search_datasets",
            description: "Search data.gouv.fr datasets by keywords. Returns titles, organizations, tags, resource counts and links.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string", "description": "Search terms, e.g. 'qualité de l'air'"},
                    "page": {"type": "integer", "minimum": 1, "default": 1, "description": "Page number"},
                    "page_size": {
                        "type": "integer",
                        "minimum": 1,
                        "maximum": MAX_PAGE_SIZE,
                        "default": DEFAULT_PAGE_SIZE,
                        "description": "Results per page"
                    }
                },
                "required": ["query"],
                "additionalProperties": false
            }),
        },
        ToolDescriptor {
            name: "get_dataset_info",
            description: "Get detailed metadata for a dataset: description, organization, tags, license, dates and resource count.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "dataset_id": {"type": "string", "description": "Dataset ID or slug"}
                },
                "required": ["dataset_id"],
                "additionalProperties": false
            }),
        },
        ToolDescriptor {
            name: "list_dataset_resources",
            description: "List the files (resources) of a dataset with their IDs, formats and sizes.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "dataset_id": {"type": "string", "description": "Dataset ID or slug"}
                },
                "required": ["dataset_id"],
                "additionalProperties": false
            }),
        },
        ToolDescriptor {
            name: "get_resource_info",
            description: "Get metadata for a resource and its parent dataset, and whether its rows can be queried with query_dataset_data.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "resource_id": {"type": "string", "description": "Resource ID"}
                },
                "required": ["resource_id"],
                "additionalProperties": false
            }),
        },
        ToolDescriptor {
            name: "query_dataset_data",
            description: "Query rows of a tabular resource through the tabular API, with optional column filter and sort.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "resource_id": {"type": "string", "description": "Resource ID"},
                    "page": {"type": "integer", "minimum": 1, "default": 1},
                    "page_size": {
                        "type": "integer",
                        "minimum": 1,
                        "maximum": MAX_PAGE_SIZE,
                        "default": DEFAULT_PAGE_SIZE
                    },
                    "filter_column": {"type": "string", "description": "Column to filter on"},
                    "filter_operator": {
                        "type": "string",
                        "enum": tabular::operator_names(),
                        "default": "exact"
                    },
                    "filter_value": {"type": "string", "description": "Value compared against the column"},
                    "sort_column": {"type": "string", "description": "Column to sort by"},
                    "sort_direction": {"type": "string", "enum": ["asc", "desc"], "default": "asc"}
                },
                "required": ["resource_id"],
                "additionalProperties": false
            }),
        },
        ToolDescriptor {
            name: "download_and_parse_resource",
            description: "Download a resource file (CSV, JSON, JSON Lines, optionally gzipped) and preview its first rows. Use for files the tabular API does not serve.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "resource_id": {"type": "string", "description": "Resource ID"},
                    "max_rows": {
                        "type": "integer",
                        "minimum": 1,
                        "maximum": resources::MAX_PREVIEW_ROWS,
                        "default": resources::DEFAULT_PREVIEW_ROWS
                    }
                },
                "required": ["resource_id"],
                "additionalProperties": false
            }),
        },
        ToolDescriptor {
            name: "get_metrics",
            description: "Get monthly visits and downloads for a dataset and/or a resource. Production platform only.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "dataset_id": {"type": "string", "description": "Dataset ID"},
                    "resource_id": {"type": "string", "description": "Resource ID"},
                    "limit": {
                        "type": "integer",
                        "minimum": 1,
                        "maximum": metrics::MAX_MONTHS,
                        "default": 12,
                        "description": "Number of months"
                    }
                },
                "additionalProperties": false
            }),
        },
    ]
}
