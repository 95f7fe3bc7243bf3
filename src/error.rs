//! Error types for tair-cts.
//!
//! Every failure the workflow can hit maps to a variant here, so the exit
//! status of the process can distinguish "provisioning failed" from "the
//! compatibility suite failed" from "a config key is missing".

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for tair-cts operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for tair-cts.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Error loading the config file.
    #[error("Failed to load config '{path}': {message}")]
    ConfigLoad {
        /// Path to the config file
        path: PathBuf,
        /// Error message
        message: String,
    },

    /// A config value is missing or invalid.
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidConfig {
        /// Configuration key
        key: String,
        /// Error message
        message: String,
    },

    // ========================================================================
    // Cloud API Errors
    // ========================================================================
    /// The HTTP request to the cloud API could not be completed.
    #[error("Request for '{action}' failed: {source}")]
    Request {
        /// API action that was being invoked
        action: String,
        /// Transport-level error
        #[source]
        source: reqwest::Error,
    },

    /// The cloud API rejected the call with a structured error body.
    #[error("API call '{action}' failed with {code}: {message} (status {status}, request {request_id})")]
    Api {
        /// API action that was invoked
        action: String,
        /// HTTP status code
        status: u16,
        /// Vendor error code, e.g. `InvalidParameter`
        code: String,
        /// Vendor error message
        message: String,
        /// Vendor request id for support tickets
        request_id: String,
    },

    /// A successful API response did not carry a field the workflow needs.
    #[error("Response for '{action}' is missing field '{field}'")]
    MissingResponseField {
        /// API action that was invoked
        action: String,
        /// Name of the absent field
        field: String,
    },

    // ========================================================================
    // Workflow Errors
    // ========================================================================
    /// The instance never reached the `Normal` status within the deadline.
    #[error("Instance '{instance_id}' did not become ready within {timeout_secs} seconds")]
    ReadyTimeout {
        /// Instance identifier
        instance_id: String,
        /// Deadline in seconds
        timeout_secs: u64,
    },

    /// A teardown step did not complete within the deadline.
    #[error("Teardown of {resource} '{id}' did not complete within {timeout_secs} seconds")]
    CleanupTimeout {
        /// Resource kind (instance, vswitch, vpc)
        resource: String,
        /// Resource identifier
        id: String,
        /// Deadline in seconds
        timeout_secs: u64,
    },

    /// The compatibility test was invoked before credentials were configured.
    #[error("Instance credentials are not set; configure must run before the compatibility test")]
    CredentialsUnset,

    // ========================================================================
    // Compatibility Test Errors
    // ========================================================================
    /// The compatibility-test runner string could not be parsed.
    #[error("Invalid compatibility-test runner command '{command}': {message}")]
    InvalidRunner {
        /// Configured runner string
        command: String,
        /// Error message
        message: String,
    },

    /// The compatibility-test executable could not be launched.
    #[error("Failed to launch compatibility test '{command}': {source}")]
    TestSpawn {
        /// Command that was launched
        command: String,
        /// Underlying launch error
        #[source]
        source: std::io::Error,
    },

    /// The compatibility suite ran and reported failures.
    #[error("Compatibility test failed with exit code {exit_code}")]
    TestFailed {
        /// Exit code of the test process
        exit_code: i32,
    },

    // ========================================================================
    // IO / Serialization Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error.
    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// JSON parsing error (malformed API response body).
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl Error {
    /// Creates a new config-load error.
    pub fn config_load(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ConfigLoad {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new invalid-config error.
    pub fn invalid_config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            key: key.into(),
            message: message.into(),
        }
    }

    /// True if this is a vendor-side error that a delete may run into while
    /// a dependent resource is still being released. Teardown retries these
    /// within its deadline instead of aborting.
    pub fn is_dependency_conflict(&self) -> bool {
        match self {
            Error::Api { code, .. } => {
                code.contains("Dependency")
                    || code.contains("InUse")
                    || code.contains("IncorrectStatus")
                    || code.contains("TaskConflict")
            }
            _ => false,
        }
    }

    /// Returns the error code for CLI exit status.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::TestFailed { .. } | Error::TestSpawn { .. } | Error::InvalidRunner { .. } => 2,
            Error::Request { .. }
            | Error::Api { .. }
            | Error::MissingResponseField { .. }
            | Error::JsonParse(_) => 3,
            Error::ConfigLoad { .. } | Error::InvalidConfig { .. } | Error::YamlParse(_) => 4,
            Error::ReadyTimeout { .. } | Error::CleanupTimeout { .. } => 5,
            _ => 1,
        }
    }
}
