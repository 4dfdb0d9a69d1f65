//! Mutation tests: batched member adds and single-member removes.

mod common;

use common::*;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Respond, ResponseTemplate};

use groupsync_graph::GraphError;

/// Returns the member reference arrays of all PATCH requests seen by the
/// server, in arrival order.
async fn patch_batches(server: &MockServer) -> Vec<Vec<String>> {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.method.as_str() == "PATCH")
        .map(|r| {
            let body: serde_json::Value = serde_json::from_slice(&r.body).unwrap();
            body["members@odata.bind"]
                .as_array()
                .unwrap()
                .iter()
                .map(|v| v.as_str().unwrap().to_string())
                .collect()
        })
        .collect()
}

/// 45 object ids produce exactly three ordered batches of 20/20/5.
#[tokio::test]
async fn add_members_splits_into_ordered_batches() {
    let server = MockServer::start().await;
    mock_token_endpoint(&server).await;

    Mock::given(method("PATCH"))
        .and(path("/groups/grp-1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(3)
        .mount(&server)
        .await;

    let ids: Vec<String> = (0..45).map(|i| format!("obj-{i:02}")).collect();

    let (_auth, client) = test_client(&server);
    client.add_members("grp-1", &ids).await.unwrap();

    let batches = patch_batches(&server).await;
    assert_eq!(batches.len(), 3);
    assert_eq!(batches[0].len(), 20);
    assert_eq!(batches[1].len(), 20);
    assert_eq!(batches[2].len(), 5);

    // Original order is preserved across batches.
    assert!(batches[0][0].ends_with("/directoryObjects/obj-00"));
    assert!(batches[1][0].ends_with("/directoryObjects/obj-20"));
    assert!(batches[2][4].ends_with("/directoryObjects/obj-44"));
}

struct FailSecondBatch {
    calls: Arc<AtomicU32>,
}

impl Respond for FailSecondBatch {
    fn respond(&self, _request: &wiremock::Request) -> ResponseTemplate {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            ResponseTemplate::new(204)
        } else {
            ResponseTemplate::new(403)
        }
    }
}

/// A failing batch aborts the remaining batches and reports its index.
#[tokio::test]
async fn add_members_aborts_after_failed_batch() {
    let server = MockServer::start().await;
    mock_token_endpoint(&server).await;

    let calls = Arc::new(AtomicU32::new(0));
    Mock::given(method("PATCH"))
        .and(path("/groups/grp-1"))
        .respond_with(FailSecondBatch {
            calls: Arc::clone(&calls),
        })
        .mount(&server)
        .await;

    let ids: Vec<String> = (0..45).map(|i| format!("obj-{i:02}")).collect();

    let (_auth, client) = test_client(&server);
    let err = client.add_members("grp-1", &ids).await.unwrap_err();

    match err {
        GraphError::BatchFailed { batch_index, .. } => assert_eq!(batch_index, 1),
        other => panic!("expected BatchFailed, got {other:?}"),
    }

    // The third batch was never issued.
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

/// An empty id list issues no mutating call at all.
#[tokio::test]
async fn add_members_empty_is_noop() {
    let server = MockServer::start().await;
    mock_token_endpoint(&server).await;

    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let (_auth, client) = test_client(&server);
    client.add_members("grp-1", &[]).await.unwrap();
}

/// Removing a direct member succeeds and reports the removal.
#[tokio::test]
async fn remove_member_direct() {
    let server = MockServer::start().await;
    mock_token_endpoint(&server).await;

    Mock::given(method("DELETE"))
        .and(path("/groups/grp-1/members/obj-1/$ref"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let (_auth, client) = test_client(&server);
    assert!(client.remove_member("grp-1", "obj-1").await.unwrap());
}

/// A member present only through a nested group cannot be removed; the
/// directory answers 404 and the call is a logged no-op.
#[tokio::test]
async fn remove_member_nested_only_is_noop() {
    let server = MockServer::start().await;
    mock_token_endpoint(&server).await;

    Mock::given(method("DELETE"))
        .and(path("/groups/grp-1/members/obj-nested/$ref"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let (_auth, client) = test_client(&server);
    assert!(!client.remove_member("grp-1", "obj-nested").await.unwrap());
}
