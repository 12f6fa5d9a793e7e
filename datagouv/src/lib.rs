//! High-level data.gouv.fr client
//!
//! Wraps the catalog, tabular and metrics clients of [`datagouv_api`] behind a
//! single [`DataGouvClient`], and adds downloading and previewing of resource
//! files (CSV, JSON, JSON Lines, optionally gzip-compressed).

pub use datagouv_api as api;

pub mod client;
pub mod config;
pub mod error;
pub mod parse;

pub use client::{DataGouvClient, DownloadedResource, ParsedResource};
pub use config::DataGouvConfig;
pub use error::{DataGouvError, Result};
pub use parse::{FileFormat, ParsedTable};
