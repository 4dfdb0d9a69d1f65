//! Common test utilities for groupsync-engine integration tests.

#![allow(dead_code)]

use secrecy::SecretString;
use serde_json::{json, Value};
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use groupsync_graph::{AuthContext, ClientAuth, Credentials, GraphClient, TokenAudience};

pub const TEST_TENANT: &str = "test-tenant";

/// Builds a Graph client wired against a mock server and mounts the token
/// endpoint.
pub async fn test_client(server: &MockServer) -> GraphClient {
    Mock::given(method("POST"))
        .and(path(format!("/{TEST_TENANT}/oauth2/v2.0/token")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "test-access-token",
            "expires_in": 3600,
            "token_type": "Bearer"
        })))
        .mount(server)
        .await;

    let credentials = Credentials {
        tenant_id: TEST_TENANT.to_string(),
        client_id: "test-client".to_string(),
        auth: ClientAuth::Secret(SecretString::from("test-secret".to_string())),
    };

    let auth = Arc::new(AuthContext::with_login_endpoint(
        credentials,
        TokenAudience::Graph,
        &server.uri(),
    ));
    GraphClient::with_base_url(auth, &server.uri()).expect("client construction")
}

/// Builds an `OData` page envelope with no next link.
pub fn single_page(items: Vec<Value>) -> Value {
    json!({ "value": items })
}

/// Mounts a group lookup returning the given display name.
pub async fn mock_group(server: &MockServer, id: &str, display_name: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/groups/{id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": id,
            "displayName": display_name
        })))
        .mount(server)
        .await;
}

/// Mounts a transitive membership listing for one leaf type.
pub async fn mock_transitive_members(
    server: &MockServer,
    group_id: &str,
    segment: &str,
    member_ids: &[&str],
) {
    let items: Vec<Value> = member_ids.iter().map(|id| json!({ "id": id })).collect();
    Mock::given(method("GET"))
        .and(path(format!("/groups/{group_id}/transitiveMembers/{segment}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(single_page(items)))
        .mount(server)
        .await;
}

/// Mounts an owned-device listing for a user.
pub async fn mock_owned_devices(server: &MockServer, user_id: &str, devices: Vec<Value>) {
    Mock::given(method("GET"))
        .and(path(format!(
            "/users/{user_id}/ownedDevices/microsoft.graph.device"
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(single_page(devices)))
        .mount(server)
        .await;
}

/// Test data factory for fully-attributed device records.
pub fn test_device(id: &str, os: &str, trust: &str, compliant: bool, enabled: bool) -> Value {
    json!({
        "id": id,
        "displayName": format!("DEVICE-{id}"),
        "operatingSystem": os,
        "deviceId": format!("hw-{id}"),
        "trustType": trust,
        "isCompliant": compliant,
        "accountEnabled": enabled
    })
}

/// Returned PATCH bodies (member reference arrays) in arrival order.
pub async fn patch_bodies(server: &MockServer) -> Vec<Vec<String>> {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.method.as_str() == "PATCH")
        .map(|r| {
            let body: Value = serde_json::from_slice(&r.body).unwrap();
            body["members@odata.bind"]
                .as_array()
                .unwrap()
                .iter()
                .map(|v| v.as_str().unwrap().to_string())
                .collect()
        })
        .collect()
}
