//! Connection settings, from flags or `RECORDFORM_*` environment variables.

use clap::Args;
use recordform_client::{EntityClient, FileLayoutSource, HttpLayoutSource, Layouts};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

pub const DEFAULT_API_URL: &str = "http://localhost:5000";

#[derive(Debug, Clone, Args)]
pub struct ConnectionArgs {
    /// Records API base URL
    #[arg(long, env = "RECORDFORM_API_URL", default_value = DEFAULT_API_URL, global = true)]
    pub api_url: String,

    /// Tenant stamped on every saved record
    #[arg(long, env = "RECORDFORM_TENANT_ID", default_value = "", global = true)]
    pub tenant_id: String,

    /// Read layouts from this directory instead of the API
    #[arg(long, env = "RECORDFORM_LAYOUT_DIR", global = true)]
    pub layout_dir: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, env = "RECORDFORM_TIMEOUT_SECS", default_value_t = 30, global = true)]
    pub timeout_secs: u64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("api url must start with http:// or https://, got '{0}'")]
    ApiUrl(String),

    #[error("tenant id must be a GUID, got '{0}'")]
    TenantId(String),

    #[error("timeout must be at least one second")]
    Timeout,

    #[error(transparent)]
    Client(#[from] recordform_client::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutSourceConfig {
    Http,
    Directory(PathBuf),
}

/// Validated settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub api_url: String,
    pub tenant_id: String,
    pub layout_source: LayoutSourceConfig,
    pub timeout: Duration,
}

impl AppConfig {
    pub fn from_args(args: &ConnectionArgs) -> Result<Self, ConfigError> {
        let api_url = args.api_url.trim().to_string();
        if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
            return Err(ConfigError::ApiUrl(api_url));
        }

        let tenant_id = args.tenant_id.trim().to_string();
        if !tenant_id.is_empty() && Uuid::parse_str(&tenant_id).is_err() {
            return Err(ConfigError::TenantId(tenant_id));
        }

        if args.timeout_secs == 0 {
            return Err(ConfigError::Timeout);
        }

        let layout_source = match &args.layout_dir {
            Some(dir) => LayoutSourceConfig::Directory(dir.clone()),
            None => LayoutSourceConfig::Http,
        };

        Ok(Self {
            api_url,
            tenant_id,
            layout_source,
            timeout: Duration::from_secs(args.timeout_secs),
        })
    }

    pub fn client(&self) -> Result<EntityClient, ConfigError> {
        Ok(EntityClient::with_timeout(&self.api_url, self.timeout)?)
    }

    pub fn layouts(&self) -> Result<Layouts, ConfigError> {
        Ok(match &self.layout_source {
            LayoutSourceConfig::Http => {
                Layouts::Http(HttpLayoutSource::with_timeout(&self.api_url, self.timeout)?)
            }
            LayoutSourceConfig::Directory(dir) => Layouts::File(FileLayoutSource::new(dir)),
        })
    }
}
