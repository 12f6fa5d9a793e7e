//! Async clients for the data.gouv.fr open-data APIs
//!
//! - [`CatalogClient`]: datasets (API v1) and resources (API v2)
//! - [`TabularClient`]: row queries over resources loaded by the tabular pipeline
//! - [`MetricsClient`]: monthly visits and downloads
//!
//! All clients share a [`Configuration`] whose endpoints come from the
//! selected [`Environment`], and every operation returns an
//! [`UpstreamResult`] rather than panicking.

pub mod catalog;
pub mod config;
pub mod environment;
pub mod error;
pub mod metrics;
pub mod models;
pub mod session;
pub mod tabular;

pub use catalog::CatalogClient;
pub use config::Configuration;
pub use environment::{Endpoints, Environment};
pub use error::{UpstreamError, UpstreamResult};
pub use metrics::MetricsClient;
pub use session::{Connector, ReqwestConnector, Session, SessionHandle, Transport};
pub use tabular::TabularClient;
