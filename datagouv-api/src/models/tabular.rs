use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Comparison applied to a column by the tabular API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    #[default]
    Exact,
    Differs,
    Contains,
    #[serde(rename = "notcontains")]
    NotContains,
    In,
    #[serde(rename = "notin")]
    NotIn,
    Less,
    Greater,
    StrictlyLess,
    StrictlyGreater,
    #[serde(rename = "isnull")]
    IsNull,
    #[serde(rename = "isnotnull")]
    IsNotNull,
}

impl FilterOperator {
    /// Every operator, in documentation order.
    pub const ALL: [FilterOperator; 12] = [
        FilterOperator::Exact,
        FilterOperator::Differs,
        FilterOperator::Contains,
        FilterOperator::NotContains,
        FilterOperator::In,
        FilterOperator::NotIn,
        FilterOperator::Less,
        FilterOperator::Greater,
        FilterOperator::StrictlyLess,
        FilterOperator::StrictlyGreater,
        FilterOperator::IsNull,
        FilterOperator::IsNotNull,
    ];

    /// Suffix appended to the column name in the query string.
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Exact => "exact",
            FilterOperator::Differs => "differs",
            FilterOperator::Contains => "contains",
            FilterOperator::NotContains => "notcontains",
            FilterOperator::In => "in",
            FilterOperator::NotIn => "notin",
            FilterOperator::Less => "less",
            FilterOperator::Greater => "greater",
            FilterOperator::StrictlyLess => "strictly_less",
            FilterOperator::StrictlyGreater => "strictly_greater",
            FilterOperator::IsNull => "isnull",
            FilterOperator::IsNotNull => "isnotnull",
        }
    }

    /// Null checks take no comparison value.
    pub fn takes_value(&self) -> bool {
        !matches!(self, FilterOperator::IsNull | FilterOperator::IsNotNull)
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterOperator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        FilterOperator::ALL
            .into_iter()
            .find(|op| op.as_str() == wanted)
            .ok_or_else(|| {
                let valid: Vec<&str> = FilterOperator::ALL.iter().map(|op| op.as_str()).collect();
                format!(
                    "Invalid filter operator: '{}'. Valid options: {}",
                    s,
                    valid.join(", ")
                )
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            _ => Err(format!(
                "Invalid sort direction: '{}'. Valid options: asc, desc",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnFilter {
    pub column: String,
    pub operator: FilterOperator,
    /// Ignored for null checks
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSort {
    pub column: String,
    pub direction: SortDirection,
}

/// Page, filters and ordering for a row query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowQuery {
    pub page: u32,
    pub page_size: u32,
    pub filters: Vec<ColumnFilter>,
    pub sort: Option<ColumnSort>,
}

impl Default for RowQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 20,
            filters: Vec::new(),
            sort: None,
        }
    }
}

impl RowQuery {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page,
            page_size,
            ..Self::default()
        }
    }

    pub fn with_filter(
        mut self,
        column: impl Into<String>,
        operator: FilterOperator,
        value: Option<String>,
    ) -> Self {
        self.filters.push(ColumnFilter {
            column: column.into(),
            operator,
            value,
        });
        self
    }

    pub fn with_sort(mut self, column: impl Into<String>, direction: SortDirection) -> Self {
        self.sort = Some(ColumnSort {
            column: column.into(),
            direction,
        });
        self
    }

    /// Query-string pairs understood by the tabular API.
    ///
    /// Page and page size are raised to at least 1. A filter on a column
    /// replaces an earlier filter with the same column and operator.
    pub fn params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("page".to_string(), self.page.max(1).to_string()),
            ("page_size".to_string(), self.page_size.max(1).to_string()),
        ];
        for filter in &self.filters {
            let key = format!("{}__{}", filter.column, filter.operator);
            let value = if filter.operator.takes_value() {
                filter.value.clone().unwrap_or_default()
            } else {
                String::new()
            };
            params.push((key, value));
        }
        if let Some(sort) = &self.sort {
            params.push((
                format!("{}__sort", sort.column),
                sort.direction.as_str().to_string(),
            ));
        }
        params
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TabularMeta {
    #[serde(default)]
    pub page: Option<u64>,
    #[serde(default)]
    pub page_size: Option<u64>,
    #[serde(default)]
    pub total: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TabularLinks {
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub prev: Option<String>,
    #[serde(default)]
    pub profile: Option<String>,
}

/// One page of rows from the tabular API
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TabularPage {
    #[serde(default)]
    pub data: Vec<Map<String, Value>>,
    #[serde(default)]
    pub meta: TabularMeta,
    #[serde(default)]
    pub links: TabularLinks,
}

impl TabularPage {
    /// Column names in the order of the first row.
    pub fn columns(&self) -> Vec<String> {
        self.data
            .first()
            .map(|row| row.keys().cloned().collect())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawProfileEnvelope {
    pub profile: ResourceProfile,
}

/// Column profile computed by the tabular pipeline
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResourceProfile {
    #[serde(default)]
    pub header: Vec<String>,
    /// Per-column statistics and detected types, keyed by column name
    #[serde(default)]
    pub columns: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operators_parse_case_insensitively() {
        assert_eq!("EXACT".parse(), Ok(FilterOperator::Exact));
        assert_eq!(
            "strictly_greater".parse(),
            Ok(FilterOperator::StrictlyGreater)
        );
        assert!("between".parse::<FilterOperator>().is_err());
    }

    #[test]
    fn params_encode_filters_and_sort() {
        let query = RowQuery::new(0, 0)
            .with_filter("region", FilterOperator::Exact, Some("Bretagne".into()))
            .with_filter("code", FilterOperator::IsNull, Some("ignored".into()))
            .with_sort("population", SortDirection::Desc);

        let params = query.params();
        assert_eq!(params[0], ("page".into(), "1".into()));
        assert_eq!(params[1], ("page_size".into(), "1".into()));
        assert!(params.contains(&("region__exact".into(), "Bretagne".into())));
        assert!(params.contains(&("code__isnull".into(), String::new())));
        assert!(params.contains(&("population__sort".into(), "desc".into())));
    }

    #[test]
    fn columns_follow_first_row() {
        let page: TabularPage = serde_json::from_value(serde_json::json!({
            "data": [{"__id": 1, "commune": "Brest"}],
            "meta": {"page": 1, "page_size": 20, "total": 1},
            "links": {}
        }))
        .unwrap();
        assert_eq!(page.columns(), vec!["__id", "commune"]);
    }
}
