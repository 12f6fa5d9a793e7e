use datagouv::DataGouvClient;
use datagouv_api::UpstreamError;
use datagouv_api::metrics::DEFAULT_MONTHS;
use datagouv_api::models::MonthlyMetric;
use serde::Deserialize;

use super::{ToolResponse, check_range};
use crate::server::{ServerError, ServerResult};

pub(crate) const MAX_MONTHS: u32 = 60;

fn default_limit() -> u32 {
    DEFAULT_MONTHS
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct MetricsArgs {
    #[serde(default)]
    dataset_id: Option<String>,
    #[serde(default)]
    resource_id: Option<String>,
    #[serde(default = "default_limit")]
    limit: u32,
}

pub(super) async fn get_metrics(
    client: &DataGouvClient,
    args: MetricsArgs,
) -> ServerResult<ToolResponse> {
    const TOOL: &str = "get_metrics";
    let dataset_id = args.dataset_id.as_deref().map(str::trim).filter(|id| !id.is_empty());
    let resource_id = args.resource_id.as_deref().map(str::trim).filter(|id| !id.is_empty());
    if dataset_id.is_none() && resource_id.is_none() {
        return Err(ServerError::InvalidParams(format!(
            "{TOOL}: at least one of dataset_id or resource_id is required"
        )));
    }
    let limit = check_range(TOOL, "limit", args.limit, 1, MAX_MONTHS)?;

    let report = match client.metrics().get_metrics(dataset_id, resource_id, limit, None).await {
        Ok(report) => report,
        Err(UpstreamError::InvalidArgument(message)) => {
            return Err(ServerError::InvalidParams(format!("{TOOL}: {message}")));
        }
        Err(err) => {
            let mut text = format!("Error fetching metrics: {err}");
            if !client.environment().is_production() {
                text.push_str("\nMetrics are only published for the production platform.");
            }
            return Ok(ToolResponse::error(text));
        }
    };

    let mut sections = Vec::new();
    if let (Some(id), Some(series)) = (dataset_id, report.dataset.as_deref()) {
        sections.push(render_series(&format!("dataset {id}"), series, true));
    }
    if let (Some(id), Some(series)) = (resource_id, report.resource.as_deref()) {
        sections.push(render_series(&format!("resource {id}"), series, false));
    }

    Ok(ToolResponse::text(sections.join("\n\n")))
}

/// Render one series oldest month first. Upstream sends newest first.
fn render_series(subject: &str, series: &[MonthlyMetric], with_visits: bool) -> String {
    if series.is_empty() {
        return format!("No metrics found for {subject}.");
    }

    let mut out = format!("Metrics for {subject} ({} months):\n", series.len());
    if with_visits {
        out.push_str(&format!("{:<9}{:>10}{:>12}\n", "Month", "Visits", "Downloads"));
    } else {
        out.push_str(&format!("{:<9}{:>12}\n", "Month", "Downloads"));
    }

    let cell = |value: Option<u64>| value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string());
    let (mut visits, mut downloads) = (0u64, 0u64);
    for metric in series.iter().rev() {
        visits += metric.visits.unwrap_or(0);
        downloads += metric.downloads.unwrap_or(0);
        if with_visits {
            out.push_str(&format!(
                "{:<9}{:>10}{:>12}\n",
                metric.month,
                cell(metric.visits),
                cell(metric.downloads)
            ));
        } else {
            out.push_str(&format!("{:<9}{:>12}\n", metric.month, cell(metric.downloads)));
        }
    }

    if with_visits {
        out.push_str(&format!("{:<9}{:>10}{:>12}", "Total", visits, downloads));
    } else {
        out.push_str(&format!("{:<9}{:>12}", "Total", downloads));
    }
    out
}
