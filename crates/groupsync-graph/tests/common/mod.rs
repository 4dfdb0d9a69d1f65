//! Common test utilities for groupsync-graph integration tests.

#![allow(dead_code)]

use secrecy::SecretString;
use serde_json::{json, Value};
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use groupsync_graph::{AuthContext, ClientAuth, Credentials, GraphClient, TokenAudience};

pub const TEST_TENANT: &str = "test-tenant";

/// Builds a Graph client wired against a mock server for both the login
/// and resource endpoints.
pub fn test_client(server: &MockServer) -> (Arc<AuthContext>, GraphClient) {
    test_client_with_refresh_limit(server, groupsync_graph::REFRESH_LIMIT)
}

/// Same as [`test_client`] with a custom reauthentication ceiling.
pub fn test_client_with_refresh_limit(
    server: &MockServer,
    limit: u32,
) -> (Arc<AuthContext>, GraphClient) {
    let credentials = Credentials {
        tenant_id: TEST_TENANT.to_string(),
        client_id: "test-client".to_string(),
        auth: ClientAuth::Secret(SecretString::from("test-secret".to_string())),
    };

    let auth = Arc::new(
        AuthContext::with_login_endpoint(credentials, TokenAudience::Graph, &server.uri())
            .with_refresh_limit(limit),
    );
    let client = GraphClient::with_base_url(Arc::clone(&auth), &server.uri())
        .expect("client construction");

    (auth, client)
}

/// Mounts the OAuth2 token endpoint returning a fixed bearer token.
pub async fn mock_token_endpoint(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(format!("/{TEST_TENANT}/oauth2/v2.0/token")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "test-access-token",
            "expires_in": 3600,
            "token_type": "Bearer"
        })))
        .mount(server)
        .await;
}

/// Builds an `OData` page envelope.
pub fn odata_page(items: Vec<Value>, next_link: Option<&str>) -> Value {
    let mut body = json!({ "value": items });
    if let Some(link) = next_link {
        body["@odata.nextLink"] = json!(link);
    }
    body
}

/// Test data factory for id-only member entries.
pub fn member_id(id: &str) -> Value {
    json!({ "id": id })
}

/// Test data factory for device records.
pub fn test_device(id: &str, os: &str, trust: &str) -> Value {
    json!({
        "id": id,
        "displayName": format!("DEVICE-{id}"),
        "operatingSystem": os,
        "deviceId": format!("hw-{id}"),
        "trustType": trust,
        "profileType": "RegisteredDevice",
        "managementType": "MDM",
        "enrollmentType": "AzureDomainJoined",
        "isCompliant": true,
        "accountEnabled": true
    })
}
