//! Aliyun implementation of the [`CloudClient`] boundary.
//!
//! The vendor exposes an RPC-style OpenAPI: plain GET requests whose query
//! string carries the action, its parameters, and an HMAC-SHA1 signature
//! (see [`sign`](super::sign)). Two products are involved: R-KVStore for the
//! managed Tair instance and VPC for the network resources.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use super::sign;
use super::{CloudClient, CreateInstanceRequest, CreatedInstance, InstanceStatus};
use crate::error::{Error, Result};

const KVSTORE_ENDPOINT: &str = "https://r-kvstore.aliyuncs.com";
const KVSTORE_API_VERSION: &str = "2015-01-01";
const VPC_API_VERSION: &str = "2016-04-28";

/// Signed HTTP client for the Aliyun R-KVStore and VPC APIs.
pub struct AliyunClient {
    http: reqwest::Client,
    access_key_id: String,
    access_key_secret: String,
    kvstore_endpoint: String,
    vpc_endpoint: Option<String>,
}

impl AliyunClient {
    /// Creates a client for the given account keys.
    pub fn new(access_key_id: impl Into<String>, access_key_secret: impl Into<String>) -> Result<Self> {
        // No overall timeout on the default client; a stalled API call would
        // otherwise hang the whole run.
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|source| Error::Request {
                action: "InitHttpClient".to_string(),
                source,
            })?;
        Ok(Self {
            http,
            access_key_id: access_key_id.into().trim().to_string(),
            access_key_secret: access_key_secret.into().trim().to_string(),
            kvstore_endpoint: KVSTORE_ENDPOINT.to_string(),
            vpc_endpoint: None,
        })
    }

    /// Overrides both product endpoints. Used by tests to point the client at
    /// a local mock server.
    pub fn with_endpoints(mut self, kvstore: impl Into<String>, vpc: impl Into<String>) -> Self {
        self.kvstore_endpoint = kvstore.into();
        self.vpc_endpoint = Some(vpc.into());
        self
    }

    fn vpc_endpoint(&self, region_id: &str) -> String {
        match &self.vpc_endpoint {
            Some(endpoint) => endpoint.clone(),
            None => format!("https://vpc.{region_id}.aliyuncs.com"),
        }
    }

    /// Issues one signed API call and decodes the JSON response.
    async fn invoke<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        version: &str,
        action: &str,
        params: &[(&str, &str)],
    ) -> Result<T> {
        let mut query = BTreeMap::new();
        query.insert("Format".to_string(), "JSON".to_string());
        query.insert("Version".to_string(), version.to_string());
        query.insert("AccessKeyId".to_string(), self.access_key_id.clone());
        query.insert("SignatureMethod".to_string(), "HMAC-SHA1".to_string());
        query.insert("SignatureVersion".to_string(), "1.0".to_string());
        query.insert(
            "SignatureNonce".to_string(),
            Uuid::new_v4().to_string(),
        );
        query.insert(
            "Timestamp".to_string(),
            Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        );
        query.insert("Action".to_string(), action.to_string());
        for (key, value) in params {
            query.insert((*key).to_string(), (*value).to_string());
        }
        let signature = sign::signature(&query, &self.access_key_secret);
        query.insert("Signature".to_string(), signature);

        debug!(action, endpoint, "invoking API");
        let response = self
            .http
            .get(endpoint)
            .query(&query)
            .send()
            .await
            .map_err(|source| Error::Request {
                action: action.to_string(),
                source,
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|source| Error::Request {
            action: action.to_string(),
            source,
        })?;

        if !status.is_success() {
            let err: ApiErrorBody = serde_json::from_str(&body).unwrap_or_default();
            return Err(Error::Api {
                action: action.to_string(),
                status: status.as_u16(),
                code: err.code.unwrap_or_else(|| "Unknown".to_string()),
                message: err.message.unwrap_or(body),
                request_id: err.request_id.unwrap_or_default(),
            });
        }

        Ok(serde_json::from_str(&body)?)
    }

    fn missing(action: &str, field: &str) -> Error {
        Error::MissingResponseField {
            action: action.to_string(),
            field: field.to_string(),
        }
    }
}

#[async_trait]
impl CloudClient for AliyunClient {
    async fn create_vpc(&self, region_id: &str, name: &str, cidr_block: &str) -> Result<String> {
        let response: CreateVpcResponse = self
            .invoke(
                &self.vpc_endpoint(region_id),
                VPC_API_VERSION,
                "CreateVpc",
                &[
                    ("RegionId", region_id),
                    ("VpcName", name),
                    ("CidrBlock", cidr_block),
                ],
            )
            .await?;
        response
            .vpc_id
            .ok_or_else(|| Self::missing("CreateVpc", "VpcId"))
    }

    async fn create_vswitch(
        &self,
        region_id: &str,
        zone_id: &str,
        vpc_id: &str,
        name: &str,
        cidr_block: &str,
    ) -> Result<String> {
        let response: CreateVSwitchResponse = self
            .invoke(
                &self.vpc_endpoint(region_id),
                VPC_API_VERSION,
                "CreateVSwitch",
                &[
                    ("RegionId", region_id),
                    ("ZoneId", zone_id),
                    ("VpcId", vpc_id),
                    ("VSwitchName", name),
                    ("CidrBlock", cidr_block),
                ],
            )
            .await?;
        response
            .v_switch_id
            .ok_or_else(|| Self::missing("CreateVSwitch", "VSwitchId"))
    }

    async fn delete_vswitch(&self, region_id: &str, vswitch_id: &str) -> Result<()> {
        let _: AckResponse = self
            .invoke(
                &self.vpc_endpoint(region_id),
                VPC_API_VERSION,
                "DeleteVSwitch",
                &[("RegionId", region_id), ("VSwitchId", vswitch_id)],
            )
            .await?;
        Ok(())
    }

    async fn delete_vpc(&self, region_id: &str, vpc_id: &str) -> Result<()> {
        let _: AckResponse = self
            .invoke(
                &self.vpc_endpoint(region_id),
                VPC_API_VERSION,
                "DeleteVpc",
                &[
                    ("RegionId", region_id),
                    ("VpcId", vpc_id),
                    ("ForceDelete", "true"),
                ],
            )
            .await?;
        Ok(())
    }

    async fn create_instance(&self, request: &CreateInstanceRequest) -> Result<CreatedInstance> {
        let response: CreateTairInstanceResponse = self
            .invoke(
                &self.kvstore_endpoint,
                KVSTORE_API_VERSION,
                "CreateTairInstance",
                &[
                    ("RegionId", &request.region_id),
                    ("ZoneId", &request.zone_id),
                    ("VpcId", &request.vpc_id),
                    ("VSwitchId", &request.vswitch_id),
                    ("InstanceName", &request.instance_name),
                    ("InstanceClass", &request.instance_class),
                    ("InstanceType", &request.instance_type),
                    ("ChargeType", &request.charge_type),
                    ("AutoPay", "true"),
                    ("AutoUseCoupon", "true"),
                ],
            )
            .await?;
        let instance_id = response
            .instance_id
            .ok_or_else(|| Self::missing("CreateTairInstance", "InstanceId"))?;
        let private_ip = response
            .private_ip
            .ok_or_else(|| Self::missing("CreateTairInstance", "PrivateIp"))?;
        Ok(CreatedInstance {
            instance_id,
            private_ip,
        })
    }

    async fn delete_instance(&self, instance_id: &str) -> Result<()> {
        let _: AckResponse = self
            .invoke(
                &self.kvstore_endpoint,
                KVSTORE_API_VERSION,
                "DeleteInstance",
                &[("InstanceId", instance_id)],
            )
            .await?;
        Ok(())
    }

    async fn modify_security_ips(&self, instance_id: &str, security_ips: &str) -> Result<()> {
        let _: AckResponse = self
            .invoke(
                &self.kvstore_endpoint,
                KVSTORE_API_VERSION,
                "ModifySecurityIps",
                &[
                    ("InstanceId", instance_id),
                    ("SecurityIps", security_ips),
                ],
            )
            .await?;
        Ok(())
    }

    async fn reset_account_password(
        &self,
        instance_id: &str,
        account: &str,
        password: &str,
    ) -> Result<()> {
        let _: AckResponse = self
            .invoke(
                &self.kvstore_endpoint,
                KVSTORE_API_VERSION,
                "ResetAccountPassword",
                &[
                    ("InstanceId", instance_id),
                    ("AccountName", account),
                    ("AccountPassword", password),
                ],
            )
            .await?;
        Ok(())
    }

    async fn describe_instance_status(
        &self,
        region_id: &str,
        instance_id: &str,
    ) -> Result<Option<InstanceStatus>> {
        let response: DescribeInstancesOverviewResponse = self
            .invoke(
                &self.kvstore_endpoint,
                KVSTORE_API_VERSION,
                "DescribeInstancesOverview",
                &[("RegionId", region_id), ("InstanceIds", instance_id)],
            )
            .await?;
        let status = response
            .instances
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|instance| instance.instance_status)
            .map(|s| InstanceStatus::from_api(&s));
        Ok(status)
    }
}

// ============================================================================
// Response bodies
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct ApiErrorBody {
    code: Option<String>,
    message: Option<String>,
    request_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CreateVpcResponse {
    vpc_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CreateVSwitchResponse {
    v_switch_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CreateTairInstanceResponse {
    instance_id: Option<String>,
    private_ip: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeInstancesOverviewResponse {
    instances: Option<Vec<InstanceOverview>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InstanceOverview {
    instance_status: Option<String>,
}

/// Calls like DeleteInstance only return a request id.
#[derive(Debug, Deserialize)]
struct AckResponse {
    #[serde(rename = "RequestId")]
    #[allow(dead_code)]
    request_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pascal_case_response_mapping() {
        let vpc: CreateVpcResponse =
            serde_json::from_str(r#"{"RequestId":"x","VpcId":"vpc-123"}"#).unwrap();
        assert_eq!(vpc.vpc_id.as_deref(), Some("vpc-123"));

        let vsw: CreateVSwitchResponse =
            serde_json::from_str(r#"{"VSwitchId":"vsw-456"}"#).unwrap();
        assert_eq!(vsw.v_switch_id.as_deref(), Some("vsw-456"));

        let created: CreateTairInstanceResponse = serde_json::from_str(
            r#"{"InstanceId":"r-abc123","PrivateIp":"172.16.0.8","OrderId":123}"#,
        )
        .unwrap();
        assert_eq!(created.instance_id.as_deref(), Some("r-abc123"));
        assert_eq!(created.private_ip.as_deref(), Some("172.16.0.8"));
    }

    #[test]
    fn test_describe_body_with_and_without_instances() {
        let body: DescribeInstancesOverviewResponse = serde_json::from_str(
            r#"{"Instances":[{"InstanceId":"r-abc123","InstanceStatus":"Creating"}]}"#,
        )
        .unwrap();
        let instances = body.instances.unwrap();
        let status = instances[0].instance_status.as_deref();
        assert_eq!(status, Some("Creating"));

        let empty: DescribeInstancesOverviewResponse =
            serde_json::from_str(r#"{"Instances":[],"TotalCount":0}"#).unwrap();
        assert!(empty.instances.unwrap().is_empty());
    }

    #[test]
    fn test_error_body_tolerates_missing_fields() {
        let err: ApiErrorBody = serde_json::from_str(r#"{"Code":"Throttling"}"#).unwrap();
        assert_eq!(err.code.as_deref(), Some("Throttling"));
        assert!(err.message.is_none());
    }
}
