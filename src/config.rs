// Runtime configuration for the proxy and the dashboard client

use clap::Args;
use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.airtable.com/v0";
pub const DEFAULT_PROXY_URL: &str = "http://127.0.0.1:3000/api/airtable";
pub const DEFAULT_REFRESH_SECS: u64 = 30;

/// Credentials and location of the remote table
#[derive(Clone, Args)]
pub struct RemoteConfig {
    /// API key for the remote table service
    #[arg(long, env = "AIRTABLE_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Base identifier
    #[arg(long, env = "AIRTABLE_BASE_ID")]
    pub base_id: String,

    /// Table name within the base
    #[arg(long, env = "AIRTABLE_TABLE_NAME")]
    pub table_name: String,

    /// API root
    #[arg(long, env = "AIRTABLE_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,
}

impl std::fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("api_key", &"<redacted>")
            .field("base_id", &self.base_id)
            .field("table_name", &self.table_name)
            .field("api_url", &self.api_url)
            .finish()
    }
}

/// Proxy server settings
#[derive(Debug, Clone, Args)]
pub struct ServerConfig {
    /// Address to listen on
    #[arg(long, env = "TABLEDASH_LISTEN", default_value = "127.0.0.1:3000")]
    pub listen: SocketAddr,

    #[command(flatten)]
    pub remote: RemoteConfig,
}

/// How the dashboard reaches the proxy
#[derive(Debug, Clone, Args)]
pub struct ClientConfig {
    /// Proxy endpoint URL
    #[arg(long, env = "TABLEDASH_PROXY_URL", default_value = DEFAULT_PROXY_URL, global = true)]
    pub proxy_url: String,

    /// Built-in dataset profile (news or customer)
    #[arg(long, default_value = "news", global = true)]
    pub profile: String,

    /// YAML dataset profile, overrides --profile
    #[arg(long, global = true)]
    pub profile_file: Option<std::path::PathBuf>,
}

/// Interval between automatic refreshes
pub fn refresh_interval(secs: u64) -> Duration {
    Duration::from_secs(secs.max(1))
}
