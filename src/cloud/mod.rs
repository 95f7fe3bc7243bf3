//! Cloud API boundary.
//!
//! The workflow talks to the vendor exclusively through the [`CloudClient`]
//! trait, so tests can substitute a recording mock for the real
//! [`AliyunClient`](aliyun::AliyunClient).

use async_trait::async_trait;

use crate::error::Result;

pub mod aliyun;
mod sign;

/// Status of a managed store instance as reported by the describe call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstanceStatus {
    /// Instance is still being created
    Creating,
    /// Instance is ready to serve traffic
    Normal,
    /// A configuration change is being applied
    Changing,
    /// Instance has been released
    Released,
    /// Any status this tool does not model
    Unknown(String),
}

impl InstanceStatus {
    /// Parses the vendor's `InstanceStatus` string.
    pub fn from_api(s: &str) -> Self {
        match s {
            "Creating" => Self::Creating,
            "Normal" => Self::Normal,
            "Changing" => Self::Changing,
            "Released" => Self::Released,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// True once the instance accepts connections.
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Normal)
    }

    /// True once the instance no longer exists on the vendor side.
    pub fn is_released(&self) -> bool {
        matches!(self, Self::Released)
    }
}

impl std::fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Creating => write!(f, "Creating"),
            Self::Normal => write!(f, "Normal"),
            Self::Changing => write!(f, "Changing"),
            Self::Released => write!(f, "Released"),
            Self::Unknown(s) => write!(f, "{s}"),
        }
    }
}

/// Parameters for creating a managed store instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateInstanceRequest {
    /// Region to create the instance in
    pub region_id: String,
    /// Zone to create the instance in
    pub zone_id: String,
    /// Virtual network the instance attaches to
    pub vpc_id: String,
    /// Subnet the instance attaches to
    pub vswitch_id: String,
    /// Display name for the instance
    pub instance_name: String,
    /// Vendor instance class, e.g. `tair.rdb.1g`
    pub instance_class: String,
    /// Vendor storage engine type, e.g. `tair_rdb`
    pub instance_type: String,
    /// Billing mode, e.g. `PostPaid`
    pub charge_type: String,
}

/// Identifiers returned by a successful instance creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedInstance {
    /// Instance id
    pub instance_id: String,
    /// Private address inside the vswitch
    pub private_ip: String,
}

/// The operations the provisioning workflow needs from the vendor.
///
/// One method per remote call; no retries at this layer. Failures surface as
/// [`Error::Api`](crate::error::Error::Api) or
/// [`Error::Request`](crate::error::Error::Request) and abort the workflow.
#[async_trait]
pub trait CloudClient: Send + Sync {
    /// Creates a virtual network; returns its id.
    async fn create_vpc(&self, region_id: &str, name: &str, cidr_block: &str) -> Result<String>;

    /// Creates a subnet inside `vpc_id`; returns its id.
    async fn create_vswitch(
        &self,
        region_id: &str,
        zone_id: &str,
        vpc_id: &str,
        name: &str,
        cidr_block: &str,
    ) -> Result<String>;

    /// Deletes a subnet. May fail with a dependency conflict while the
    /// instance is still being released.
    async fn delete_vswitch(&self, region_id: &str, vswitch_id: &str) -> Result<()>;

    /// Deletes a virtual network.
    async fn delete_vpc(&self, region_id: &str, vpc_id: &str) -> Result<()>;

    /// Creates a managed store instance.
    async fn create_instance(&self, request: &CreateInstanceRequest) -> Result<CreatedInstance>;

    /// Releases a managed store instance. The release is asynchronous on the
    /// vendor side; poll [`describe_instance_status`](Self::describe_instance_status)
    /// for completion.
    async fn delete_instance(&self, instance_id: &str) -> Result<()>;

    /// Replaces the instance's IP allow-list.
    async fn modify_security_ips(&self, instance_id: &str, security_ips: &str) -> Result<()>;

    /// Resets an account password on the instance.
    async fn reset_account_password(
        &self,
        instance_id: &str,
        account: &str,
        password: &str,
    ) -> Result<()>;

    /// Queries the instance status. `Ok(None)` means the vendor no longer
    /// reports the instance at all.
    async fn describe_instance_status(
        &self,
        region_id: &str,
        instance_id: &str,
    ) -> Result<Option<InstanceStatus>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parsing() {
        assert_eq!(InstanceStatus::from_api("Normal"), InstanceStatus::Normal);
        assert_eq!(
            InstanceStatus::from_api("Creating"),
            InstanceStatus::Creating
        );
        assert_eq!(
            InstanceStatus::from_api("Flushing"),
            InstanceStatus::Unknown("Flushing".to_string())
        );
    }

    #[test]
    fn test_only_normal_is_ready() {
        assert!(InstanceStatus::Normal.is_ready());
        assert!(!InstanceStatus::Creating.is_ready());
        assert!(!InstanceStatus::Changing.is_ready());
        assert!(!InstanceStatus::Unknown("Flushing".to_string()).is_ready());
    }

    #[test]
    fn test_display_round_trips_known_statuses() {
        for s in ["Creating", "Normal", "Changing", "Released", "Flushing"] {
            assert_eq!(InstanceStatus::from_api(s).to_string(), s);
        }
    }
}
