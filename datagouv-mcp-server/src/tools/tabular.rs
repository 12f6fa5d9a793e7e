use datagouv::DataGouvClient;
use datagouv_api::models::{FilterOperator, RowQuery, SortDirection};
use serde::Deserialize;

use super::format::push_row;
use super::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, ToolResponse, check_range, required_id};
use crate::server::{ServerError, ServerResult};

const TOOL: &str = "query_dataset_data";

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct QueryArgs {
    resource_id: String,
    #[serde(default = "default_page")]
    page: u32,
    #[serde(default = "default_page_size")]
    page_size: u32,
    #[serde(default)]
    filter_column: Option<String>,
    #[serde(default)]
    filter_operator: Option<String>,
    #[serde(default)]
    filter_value: Option<String>,
    #[serde(default)]
    sort_column: Option<String>,
    #[serde(default)]
    sort_direction: Option<String>,
}

pub(super) fn operator_names() -> Vec<&'static str> {
    FilterOperator::ALL.iter().map(FilterOperator::as_str).collect()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl QueryArgs {
    fn into_query(self) -> ServerResult<(String, RowQuery)> {
        let resource_id = required_id(TOOL, "resource_id", &self.resource_id)?;
        let page = check_range(TOOL, "page", self.page, 1, u32::MAX)?;
        let page_size = check_range(TOOL, "page_size", self.page_size, 1, MAX_PAGE_SIZE)?;
        let invalid = |message: String| ServerError::InvalidParams(format!("{TOOL}: {message}"));

        let mut query = RowQuery::new(page, page_size);

        if let Some(column) = non_blank(self.filter_column) {
            let operator = match non_blank(self.filter_operator) {
                Some(op) => op.parse::<FilterOperator>().map_err(invalid)?,
                None => FilterOperator::default(),
            };
            // Filter values are free text; only whitespace-only values count as missing.
            let value = self.filter_value.filter(|v| !v.trim().is_empty());
            if operator.takes_value() && value.is_none() {
                return Err(invalid(format!(
                    "filter_value is required with operator '{operator}'"
                )));
            }
            query = query.with_filter(column, operator, value.filter(|_| operator.takes_value()));
        } else if non_blank(self.filter_value).is_some() {
            return Err(invalid("filter_value given without filter_column".to_string()));
        }

        if let Some(column) = non_blank(self.sort_column) {
            let direction = match non_blank(self.sort_direction) {
                Some(direction) => direction.parse::<SortDirection>().map_err(invalid)?,
                None => SortDirection::default(),
            };
            query = query.with_sort(column, direction);
        }

        Ok((resource_id, query))
    }
}

pub(super) async fn query_dataset_data(
    client: &DataGouvClient,
    args: QueryArgs,
) -> ServerResult<ToolResponse> {
    let (resource_id, query) = args.into_query()?;

    let page = match client.tabular().query_resource_rows(&resource_id, &query, None).await {
        Ok(page) => page,
        Err(err) => {
            let hint = if matches!(err.status(), Some(400) | Some(404)) {
                "\nThe resource may not be available through the tabular API. \
                 Check get_resource_info, or try download_and_parse_resource."
            } else {
                ""
            };
            return Ok(ToolResponse::error(format!(
                "Error querying resource {resource_id}: {err}{hint}"
            )));
        }
    };

    let total = page.meta.total;
    let mut out = format!("Resource {resource_id}: page {}", query.page);
    match total {
        Some(total) => out.push_str(&format!(" ({total} matching rows)\n")),
        None => out.push('\n'),
    }
    for filter in &query.filters {
        out.push_str(&format!("Filter: {} {}", filter.column, filter.operator));
        match &filter.value {
            Some(value) => out.push_str(&format!(" '{value}'\n")),
            None => out.push('\n'),
        }
    }
    if let Some(sort) = &query.sort {
        out.push_str(&format!("Sort: {} {}\n", sort.column, sort.direction.as_str()));
    }

    if page.data.is_empty() {
        out.push_str("\nNo rows found.");
        return Ok(ToolResponse::text(out));
    }

    let columns = page.columns();
    out.push_str(&format!("Columns: {}\n\n", columns.join(", ")));

    let offset = (query.page as usize - 1) * query.page_size as usize;
    for (i, row) in page.data.iter().enumerate() {
        push_row(&mut out, offset + i + 1, &columns, row);
    }

    if page.links.next.is_some() {
        out.push_str(&format!("\nMore rows available: use page={}.", query.page.saturating_add(1)));
    }

    Ok(ToolResponse::text(out.trim_end()))
}
