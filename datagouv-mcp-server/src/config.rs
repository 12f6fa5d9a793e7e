use std::net::SocketAddr;

use clap::Parser;
use datagouv::DataGouvConfig;
use datagouv_api::Environment;

/// Command-line and environment configuration of the server process
#[derive(Parser, Debug, Clone)]
#[command(name = "datagouv-mcp-server")]
#[command(about = "MCP server for the data.gouv.fr open-data platform")]
#[command(version)]
pub struct Args {
    /// Target platform: `demo` or `prod`
    #[arg(long, env = "DATAGOUV_ENV")]
    pub environment: Option<String>,

    /// API key forwarded to data.gouv.fr
    #[arg(long, env = "DATAGOUV_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// User agent sent with upstream requests
    #[arg(long, env = "DATAGOUV_USER_AGENT")]
    pub user_agent: Option<String>,

    /// Interface to listen on
    #[arg(long, env = "MCP_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "MCP_PORT", default_value_t = 8000)]
    pub port: u16,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// Default log filter when `RUST_LOG` is unset.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }

    pub fn environment(&self) -> Environment {
        Environment::resolve(self.environment.as_deref())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    /// Client configuration for the selected platform
    pub fn data_gouv_config(&self) -> DataGouvConfig {
        let mut config = DataGouvConfig::new().with_environment(self.environment());
        if let Some(key) = self.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
            config = config.with_api_key(key);
        }
        if let Some(ua) = self.user_agent.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
            config = config.with_user_agent(ua);
        }
        config
    }
}
