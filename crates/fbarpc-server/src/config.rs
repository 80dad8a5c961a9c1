//! Deployment configuration.
//!
//! Settings come from serde defaults, overlaid by one section of an INI
//! deployment file. `KB_DEPLOYMENT_CONFIG` names the file and
//! `KB_SERVICE_NAME` names the section (default `fbaModelServices`):
//!
//! ```ini
//! [fbaModelServices]
//! bind = 0.0.0.0:7036
//! log_filter = fbarpc_server=debug,info
//! max_request_bytes = 1048576
//! dont_trust_x_ip_headers = true
//! max_jobs = 10000
//! ```

use config::{Config, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;

use fbarpc_common::protocol::error::{FbaError, Result};
use fbarpc_common::protocol::params::SERVICE_MODULE;

use crate::job_queue::DEFAULT_MAX_JOBS;

pub const DEPLOYMENT_CONFIG_ENV: &str = "KB_DEPLOYMENT_CONFIG";
pub const SERVICE_NAME_ENV: &str = "KB_SERVICE_NAME";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset
    pub log_filter: String,
    pub max_request_bytes: usize,
    pub dont_trust_x_ip_headers: bool,
    /// Most jobs the in-memory ledger keeps before dropping the oldest
    pub max_jobs: usize,
    /// Section the settings were read from
    #[serde(skip)]
    pub service_name: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:7036".to_string(),
            log_filter: "info".to_string(),
            max_request_bytes: 10 * 1024 * 1024,
            dont_trust_x_ip_headers: false,
            max_jobs: DEFAULT_MAX_JOBS,
            service_name: SERVICE_MODULE.to_string(),
        }
    }
}

impl ServerConfig {
    /// Loads settings from the deployment file named by the environment.
    ///
    /// Without `KB_DEPLOYMENT_CONFIG` the defaults are used as-is.
    pub fn from_env() -> Result<Self> {
        let service_name =
            std::env::var(SERVICE_NAME_ENV).unwrap_or_else(|_| SERVICE_MODULE.to_string());
        let path = std::env::var(DEPLOYMENT_CONFIG_ENV).ok();
        Self::load(path.as_deref().map(Path::new), &service_name)
    }

    /// Loads the `[service_name]` section of an INI file over the defaults.
    ///
    /// Section names match case-insensitively. A file without the section
    /// yields the defaults.
    pub fn load(path: Option<&Path>, service_name: &str) -> Result<Self> {
        let mut config = Self {
            service_name: service_name.to_string(),
            ..Self::default()
        };

        let Some(path) = path else {
            return Ok(config);
        };
        if !path.exists() {
            return Err(FbaError::Config(format!(
                "Deployment config not found: {}",
                path.display()
            )));
        }

        let sections: HashMap<String, config::Value> = Config::builder()
            .add_source(File::from(path).format(FileFormat::Ini))
            .build()
            .and_then(|settings| settings.try_deserialize())
            .map_err(|e| FbaError::Config(format!("{}: {}", path.display(), e)))?;

        if let Some((_, section)) = sections
            .into_iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(service_name))
        {
            config = section.try_deserialize::<Self>().map_err(|e| {
                FbaError::Config(format!("[{}] in {}: {}", service_name, path.display(), e))
            })?;
            config.service_name = service_name.to_string();
        }

        Ok(config)
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.bind
            .parse()
            .map_err(|e| FbaError::Config(format!("Invalid bind address {}: {}", self.bind, e)))
    }
}
