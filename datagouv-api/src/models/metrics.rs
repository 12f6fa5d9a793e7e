use serde::{Deserialize, Serialize};

/// One page of the metrics API
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawMetricsPage {
    #[serde(default)]
    pub data: Vec<RawMonthlyMetric>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawMonthlyMetric {
    pub metric_month: String,
    #[serde(default)]
    pub monthly_visit: Option<u64>,
    #[serde(default)]
    pub monthly_download_resource: Option<u64>,
}

impl From<RawMonthlyMetric> for MonthlyMetric {
    fn from(raw: RawMonthlyMetric) -> Self {
        MonthlyMetric {
            month: raw.metric_month,
            visits: raw.monthly_visit,
            downloads: raw.monthly_download_resource,
        }
    }
}

/// Usage counts for one calendar month
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyMetric {
    /// `YYYY-MM`
    pub month: String,
    pub visits: Option<u64>,
    pub downloads: Option<u64>,
}

/// Monthly series for a dataset and/or a resource, newest month first
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MetricsReport {
    pub dataset: Option<Vec<MonthlyMetric>>,
    pub resource: Option<Vec<MonthlyMetric>>,
}
