//! HTTP-level tests of the Aliyun client against a local mock server.

use std::collections::HashMap;

use wiremock::matchers::{method, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tair_cts::cloud::aliyun::AliyunClient;
use tair_cts::cloud::{CloudClient, CreateInstanceRequest, InstanceStatus};
use tair_cts::error::Error;

fn client_for(server: &MockServer) -> AliyunClient {
    AliyunClient::new("testing-key", "testing-secret")
        .unwrap()
        .with_endpoints(server.uri(), server.uri())
}

async fn query_of_last_request(server: &MockServer) -> HashMap<String, String> {
    let requests = server.received_requests().await.unwrap();
    let last = requests.last().unwrap();
    last.url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

#[tokio::test]
async fn create_vpc_sends_a_signed_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("Action", "CreateVpc"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"RequestId": "R1", "VpcId": "vpc-789"})),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let vpc_id = client
        .create_vpc("cn-hangzhou", "cts-vpc", "172.16.0.0/24")
        .await
        .unwrap();
    assert_eq!(vpc_id, "vpc-789");

    let query = query_of_last_request(&server).await;
    assert_eq!(query["Format"], "JSON");
    assert_eq!(query["Version"], "2016-04-28");
    assert_eq!(query["AccessKeyId"], "testing-key");
    assert_eq!(query["SignatureMethod"], "HMAC-SHA1");
    assert_eq!(query["SignatureVersion"], "1.0");
    assert_eq!(query["RegionId"], "cn-hangzhou");
    assert_eq!(query["VpcName"], "cts-vpc");
    assert_eq!(query["CidrBlock"], "172.16.0.0/24");
    assert!(!query["SignatureNonce"].is_empty());
    assert!(!query["Signature"].is_empty());
    // ISO 8601 UTC, e.g. 2026-08-30T12:34:56Z
    assert!(query["Timestamp"].ends_with('Z'));
}

#[tokio::test]
async fn instance_calls_use_the_kvstore_api_version() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("Action", "CreateTairInstance"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            serde_json::json!({"InstanceId": "r-xyz", "PrivateIp": "172.16.0.21"}),
        ))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let created = client
        .create_instance(&CreateInstanceRequest {
            region_id: "cn-hangzhou".to_string(),
            zone_id: "cn-hangzhou-b".to_string(),
            vpc_id: "vpc-1".to_string(),
            vswitch_id: "vsw-1".to_string(),
            instance_name: "cts-instance".to_string(),
            instance_class: "tair.rdb.1g".to_string(),
            instance_type: "tair_rdb".to_string(),
            charge_type: "PostPaid".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(created.instance_id, "r-xyz");
    assert_eq!(created.private_ip, "172.16.0.21");

    let query = query_of_last_request(&server).await;
    assert_eq!(query["Version"], "2015-01-01");
    assert_eq!(query["InstanceClass"], "tair.rdb.1g");
    assert_eq!(query["ChargeType"], "PostPaid");
    assert_eq!(query["AutoPay"], "true");
}

#[tokio::test]
async fn vendor_error_body_becomes_an_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "RequestId": "R-ERR",
            "Code": "InvalidParameter.ZoneId",
            "Message": "The specified zone does not exist.",
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client
        .create_vpc("cn-hangzhou", "cts-vpc", "172.16.0.0/24")
        .await
        .unwrap_err();
    match err {
        Error::Api {
            action,
            status,
            code,
            message,
            request_id,
        } => {
            assert_eq!(action, "CreateVpc");
            assert_eq!(status, 400);
            assert_eq!(code, "InvalidParameter.ZoneId");
            assert_eq!(message, "The specified zone does not exist.");
            assert_eq!(request_id, "R-ERR");
        }
        other => panic!("expected Error::Api, got {other:?}"),
    }
}

#[tokio::test]
async fn non_json_error_body_still_surfaces() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.delete_instance("r-xyz").await.unwrap_err();
    match err {
        Error::Api {
            status,
            code,
            message,
            ..
        } => {
            assert_eq!(status, 503);
            assert_eq!(code, "Unknown");
            assert_eq!(message, "upstream unavailable");
        }
        other => panic!("expected Error::Api, got {other:?}"),
    }
    // transport and vendor errors share the same exit status
    assert_eq!(
        client.delete_instance("r-xyz").await.unwrap_err().exit_code(),
        3
    );
}

#[tokio::test]
async fn describe_maps_status_and_absence() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("InstanceIds", "r-here"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "Instances": [{"InstanceId": "r-here", "InstanceStatus": "Creating"}],
            "TotalCount": 1,
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("InstanceIds", "r-gone"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "Instances": [],
            "TotalCount": 0,
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let status = client
        .describe_instance_status("cn-hangzhou", "r-here")
        .await
        .unwrap();
    assert_eq!(status, Some(InstanceStatus::Creating));

    let status = client
        .describe_instance_status("cn-hangzhou", "r-gone")
        .await
        .unwrap();
    assert_eq!(status, None);
}

#[tokio::test]
async fn delete_vpc_forces_deletion() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("Action", "DeleteVpc"))
        .and(query_param("ForceDelete", "true"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"RequestId": "R2"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.delete_vpc("cn-hangzhou", "vpc-789").await.unwrap();
}

#[tokio::test]
async fn create_without_private_ip_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"InstanceId": "r-xyz"})),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client
        .create_instance(&CreateInstanceRequest {
            region_id: "cn-hangzhou".to_string(),
            zone_id: "cn-hangzhou-b".to_string(),
            vpc_id: "vpc-1".to_string(),
            vswitch_id: "vsw-1".to_string(),
            instance_name: "cts-instance".to_string(),
            instance_class: "tair.rdb.1g".to_string(),
            instance_type: "tair_rdb".to_string(),
            charge_type: "PostPaid".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::MissingResponseField { ref field, .. } if field == "PrivateIp"
    ));
}
