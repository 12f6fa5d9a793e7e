use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::environment::{Endpoints, Environment};
use crate::error::UpstreamResult;
use crate::session::{
    self, Connector, DEFAULT_TIMEOUT, ReqwestConnector, Session, SessionHandle, UpstreamRequest,
};

/// Environment variable holding an optional data.gouv.fr API key.
pub const API_KEY_VAR: &str = "DATAGOUV_API_KEY";

/// Configuration shared by the catalog, tabular and metrics clients
#[derive(Clone)]
pub struct Configuration {
    /// Deployment the endpoints were derived from
    pub environment: Environment,
    /// Upstream base URLs
    pub endpoints: Endpoints,
    /// User agent sent with every request
    pub user_agent: Option<String>,
    /// API key forwarded as `X-API-KEY`
    pub api_key: Option<String>,
    /// Timeout applied to sessions opened by the clients
    pub timeout: Duration,
    /// Opens sessions when the caller does not supply one
    pub connector: Arc<dyn Connector>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self::for_environment(Environment::default())
    }
}

impl Configuration {
    pub fn new() -> Configuration {
        Configuration::default()
    }

    /// Configuration targeting the given environment's endpoints.
    pub fn for_environment(environment: Environment) -> Self {
        Configuration {
            environment,
            endpoints: environment.endpoints(),
            user_agent: Some(concat!("datagouv-rs/", env!("CARGO_PKG_VERSION")).to_owned()),
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
            connector: Arc::new(ReqwestConnector),
        }
    }

    /// Read `DATAGOUV_ENV` and `DATAGOUV_API_KEY` from the process environment.
    pub fn from_env() -> Self {
        let mut config = Self::for_environment(Environment::from_env());
        if let Ok(key) = std::env::var(API_KEY_VAR)
            && !key.trim().is_empty()
        {
            config.api_key = Some(key.trim().to_string());
        }
        config
    }

    /// Override the upstream base URLs, e.g. to target a stub server.
    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn with_api_key<S: Into<String>>(mut self, api_key: S) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_user_agent<S: Into<String>>(mut self, user_agent: S) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = connector;
        self
    }

    /// Open a session callers can share across several client calls.
    pub fn open_session(&self) -> UpstreamResult<Session> {
        Session::open(self.connector.as_ref(), self.timeout)
    }

    pub(crate) fn acquire<'a>(
        &self,
        existing: Option<&'a Session>,
    ) -> UpstreamResult<SessionHandle<'a>> {
        session::acquire(self.connector.as_ref(), existing, self.timeout)
    }

    /// GET request carrying the configured credentials.
    pub(crate) fn request(&self, url: String) -> UpstreamRequest {
        let mut request = UpstreamRequest::get(url);
        request.api_key = self.api_key.clone();
        request.user_agent = self.user_agent.clone();
        request
    }
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("environment", &self.environment)
            .field("endpoints", &self.endpoints)
            .field("user_agent", &self.user_agent)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Percent-encode an identifier for use as a single path segment.
pub(crate) fn segment(id: &str) -> String {
    urlencoding::encode(id.trim()).into_owned()
}
