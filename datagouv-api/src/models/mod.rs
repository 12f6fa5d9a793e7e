//! Payloads returned by the upstream clients
//!
//! Upstream JSON is decoded into private `Raw*` structs and projected into the
//! public types below, so callers never depend on upstream field quirks.

mod dataset;
mod metrics;
mod resource;
mod tabular;
mod tag;

pub use dataset::{
    DatasetDetails, DatasetMetadata, DatasetResources, DatasetSummary, OrganizationRef,
    ResourceRef, ResourceSummary, SearchPage,
};
pub use metrics::{MetricsReport, MonthlyMetric};
pub use resource::{ResourceDetails, ResourceMetadata, ResourceWithDataset};
pub use tabular::{
    ColumnFilter, ColumnSort, FilterOperator, ResourceProfile, RowQuery, SortDirection,
    TabularLinks, TabularMeta, TabularPage,
};
pub use tag::{TagRepr, normalize_tags};

pub(crate) use dataset::{RawDataset, RawSearchPage};
pub(crate) use metrics::RawMetricsPage;
pub(crate) use resource::RawResourceEnvelope;
pub(crate) use tabular::RawProfileEnvelope;
