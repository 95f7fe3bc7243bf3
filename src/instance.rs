//! The transient record describing the provisioned instance.
//!
//! An [`InstanceInfo`] is populated incrementally: network and instance
//! identifiers at creation time, credentials once `configure` has reset the
//! account password. It lives for one workflow run and is discarded after
//! teardown.

use serde::Serialize;

use crate::error::{Error, Result};

/// Account credentials for the provisioned instance.
///
/// The account name equals the instance id, which is the vendor's default
/// account on a fresh Tair instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    /// Account name
    pub account: String,
    /// Account password
    #[serde(skip_serializing)]
    pub password: String,
}

/// Identifiers of everything the workflow created, in the order it was
/// created. Teardown consumes them in reverse.
#[derive(Debug, Clone, Serialize)]
pub struct InstanceInfo {
    /// Managed store instance id, e.g. `r-bp1zxszhcgatnx****`
    pub instance_id: String,
    /// Display name given to the instance
    pub instance_name: String,
    /// Region the resources live in, e.g. `cn-hangzhou`
    pub region_id: String,
    /// Zone the vswitch and instance live in, e.g. `cn-hangzhou-b`
    pub zone_id: String,
    /// Virtual network id
    pub vpc_id: String,
    /// Subnet (vswitch) id
    pub vswitch_id: String,
    /// Private address the compatibility suite connects to
    pub private_ip: String,
    /// Set by `configure`, absent until then
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Credentials>,
}

impl InstanceInfo {
    /// Returns the configured credentials, or [`Error::CredentialsUnset`] if
    /// `configure` has not run yet.
    pub fn credentials(&self) -> Result<&Credentials> {
        self.credentials.as_ref().ok_or(Error::CredentialsUnset)
    }
}
