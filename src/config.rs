//! Configuration for tair-cts.
//!
//! The config file is YAML. Credentials and topology live under the
//! `Database.Tair` block; everything else is optional and defaulted, so a
//! minimal file carries only the four credential/topology keys:
//!
//! ```yaml
//! Database:
//!   Tair:
//!     access_key: "LTAI..."
//!     access_key_secret: "..."
//!     region_id: cn-hangzhou
//!     zone_id: cn-hangzhou-b
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::wait::WaitPolicy;

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Credentials and topology
    #[serde(rename = "Database")]
    pub database: DatabaseConfig,

    /// Provisioning tunables
    #[serde(default)]
    pub provision: ProvisionConfig,

    /// Compatibility-test tunables
    #[serde(default)]
    pub compat: CompatConfig,

    /// Polling intervals and deadlines
    #[serde(default)]
    pub wait: WaitConfig,
}

/// The `Database` block of the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// The `Tair` sub-block
    #[serde(rename = "Tair")]
    pub tair: TairConfig,
}

/// Account credentials and placement for the managed store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TairConfig {
    /// Account access key id
    pub access_key: String,
    /// Account access key secret
    pub access_key_secret: String,
    /// Region to provision in, e.g. `cn-hangzhou`
    pub region_id: String,
    /// Zone to provision in, e.g. `cn-hangzhou-b`
    pub zone_id: String,
}

/// Instance and network parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvisionConfig {
    /// Vendor instance class
    pub instance_class: String,
    /// Vendor storage engine type
    pub instance_type: String,
    /// Billing mode
    pub charge_type: String,
    /// CIDR used for both the VPC and its vswitch
    pub cidr_block: String,
    /// IP allow-list installed on the instance
    pub security_ips: String,
    /// Account password; a random one is generated when absent
    pub account_password: Option<String>,
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            instance_class: "tair.rdb.1g".to_string(),
            instance_type: "tair_rdb".to_string(),
            charge_type: "PostPaid".to_string(),
            cidr_block: "172.16.0.0/24".to_string(),
            security_ips: "10.0.0.0/8".to_string(),
            account_password: None,
        }
    }
}

/// How the external compatibility suite is invoked.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompatConfig {
    /// Command that launches the suite; connection arguments are appended
    pub runner: String,
    /// File the suite's stdout is written to
    pub results_file: PathBuf,
    /// Port the suite connects to
    pub port: u16,
}

impl Default for CompatConfig {
    fn default() -> Self {
        Self {
            runner: "python3 redis_compatibility_test.py".to_string(),
            results_file: PathBuf::from("test_result.txt"),
            port: 6379,
        }
    }
}

/// Deadlines for the three waits in the workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitConfig {
    /// Poll for the instance to reach `Normal` after creation
    pub ready: WaitPolicy,
    /// Poll for the instance to disappear after deletion
    pub release: WaitPolicy,
    /// Retry window for network deletes that hit dependency conflicts
    pub network_delete: WaitPolicy,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            ready: WaitPolicy::new(Duration::from_secs(10), Duration::from_secs(30 * 60)),
            release: WaitPolicy::new(Duration::from_secs(10), Duration::from_secs(10 * 60)),
            network_delete: WaitPolicy::new(Duration::from_secs(10), Duration::from_secs(2 * 60)),
        }
    }
}

impl Config {
    /// Loads and validates a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::config_load(path, e.to_string()))?;
        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| Error::config_load(path, e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the values a later step would otherwise fail on obscurely.
    pub fn validate(&self) -> Result<()> {
        let tair = &self.database.tair;
        for (key, value) in [
            ("Database.Tair.access_key", &tair.access_key),
            ("Database.Tair.access_key_secret", &tair.access_key_secret),
            ("Database.Tair.region_id", &tair.region_id),
            ("Database.Tair.zone_id", &tair.zone_id),
        ] {
            if value.trim().is_empty() {
                return Err(Error::invalid_config(key, "must not be empty"));
            }
        }
        if self.compat.runner.trim().is_empty() {
            return Err(Error::invalid_config("compat.runner", "must not be empty"));
        }
        if self.wait.ready.interval.is_zero() {
            return Err(Error::invalid_config(
                "wait.ready.interval",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}
