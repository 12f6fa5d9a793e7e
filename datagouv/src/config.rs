use datagouv_api::{Configuration as ApiConfiguration, Endpoints, Environment};
use std::sync::Arc;
use std::time::Duration;

/// Configuration for the data.gouv.fr client
#[derive(Debug, Clone)]
pub struct DataGouvConfig {
    /// Configuration of the catalog, tabular and metrics clients
    pub api_config: Arc<ApiConfiguration>,
    /// User agent for HTTP requests
    pub user_agent: String,
    /// Timeout for file downloads in seconds
    pub download_timeout_secs: u64,
    /// Largest file the download path accepts, in bytes
    pub max_download_bytes: u64,
}

impl Default for DataGouvConfig {
    fn default() -> Self {
        let user_agent = format!("datagouv-rs/{}", env!("CARGO_PKG_VERSION"));
        Self {
            api_config: Arc::new(ApiConfiguration::default().with_user_agent(user_agent.clone())),
            user_agent,
            download_timeout_secs: 300, // 5 minutes
            max_download_bytes: 50 * 1024 * 1024,
        }
    }
}

impl DataGouvConfig {
    /// Create a new configuration for the production platform
    pub fn new() -> Self {
        Self::default()
    }

    /// Target another environment's endpoints
    pub fn with_environment(self, environment: Environment) -> Self {
        let mut api_config = ApiConfiguration::for_environment(environment);
        api_config.user_agent = self.api_config.user_agent.clone();
        api_config.api_key = self.api_config.api_key.clone();
        api_config.timeout = self.api_config.timeout;
        api_config.connector = self.api_config.connector.clone();
        self.with_api_config(api_config)
    }

    /// Override the upstream base URLs
    pub fn with_endpoints(self, endpoints: Endpoints) -> Self {
        let api_config = (*self.api_config).clone().with_endpoints(endpoints);
        self.with_api_config(api_config)
    }

    /// Forward an API key with every catalog, tabular and metrics request
    pub fn with_api_key<S: Into<String>>(self, api_key: S) -> Self {
        let api_config = (*self.api_config).clone().with_api_key(api_key);
        self.with_api_config(api_config)
    }

    /// Set custom user agent
    pub fn with_user_agent<S: Into<String>>(mut self, user_agent: S) -> Self {
        self.user_agent = user_agent.into();
        let api_config = (*self.api_config)
            .clone()
            .with_user_agent(self.user_agent.clone());
        self.with_api_config(api_config)
    }

    /// Set the timeout of catalog, tabular and metrics calls
    pub fn with_api_timeout(self, timeout: Duration) -> Self {
        let api_config = (*self.api_config).clone().with_timeout(timeout);
        self.with_api_config(api_config)
    }

    /// Set download timeout
    pub fn with_download_timeout(mut self, timeout_secs: u64) -> Self {
        self.download_timeout_secs = timeout_secs;
        self
    }

    /// Set the download size limit
    pub fn with_max_download_bytes(mut self, max: u64) -> Self {
        self.max_download_bytes = max.max(1);
        self
    }

    fn with_api_config(mut self, api_config: ApiConfiguration) -> Self {
        self.api_config = Arc::new(api_config);
        self
    }

    pub fn environment(&self) -> Environment {
        self.api_config.environment
    }
}
