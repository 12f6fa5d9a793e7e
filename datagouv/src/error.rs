use datagouv_api::UpstreamError;
use thiserror::Error;

/// Errors that can occur when using the data.gouv.fr client
#[derive(Error, Debug)]
pub enum DataGouvError {
    /// Error from the catalog, tabular or metrics APIs
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// HTTP request error while fetching a file
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// I/O error while decompressing a file
    #[error("File operation failed: {0}")]
    IoError(#[from] std::io::Error),

    /// Invalid URL error
    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    /// Resource has nothing to download
    #[error("Resource not found: {message}")]
    ResourceNotFound { message: String },

    /// Download failed
    #[error("Download failed: {message}")]
    DownloadError { message: String },

    /// File exceeds the configured download limit
    #[error("File is larger than the {limit} byte download limit")]
    TooLarge { limit: u64 },

    /// File format the parser cannot read
    #[error("Unsupported file format: {format}")]
    UnsupportedFormat { format: String },

    /// File content does not match its format
    #[error("Could not parse {format} content: {message}")]
    ParseError { format: String, message: String },
}

impl DataGouvError {
    /// Create a new resource not found error
    pub fn resource_not_found<S: Into<String>>(message: S) -> Self {
        Self::ResourceNotFound {
            message: message.into(),
        }
    }

    /// Create a new download error
    pub fn download_error<S: Into<String>>(message: S) -> Self {
        Self::DownloadError {
            message: message.into(),
        }
    }

    pub fn unsupported_format<S: Into<String>>(format: S) -> Self {
        Self::UnsupportedFormat {
            format: format.into(),
        }
    }

    pub fn parse_error<F: Into<String>, S: Into<String>>(format: F, message: S) -> Self {
        Self::ParseError {
            format: format.into(),
            message: message.into(),
        }
    }

    /// The upstream API failure, if this error came from one
    pub fn as_upstream(&self) -> Option<&UpstreamError> {
        match self {
            Self::Upstream(err) => Some(err),
            _ => None,
        }
    }
}

/// Type alias for Results using DataGouvError
pub type Result<T> = std::result::Result<T, DataGouvError>;
