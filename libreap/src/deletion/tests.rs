use super::*;
use crate::catalog::Repository;
use crate::client::ManifestEntry;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Provider that counts refreshes and always hands out the same new token.
struct CountingProvider {
    token: Option<String>,
    calls: AtomicUsize,
}

impl CountingProvider {
    fn new(token: &str) -> Self {
        Self {
            token: Some(token.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialProvider for CountingProvider {
    async fn access_token(&self) -> Option<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.token.clone()
    }

    async fn project_id(&self) -> Option<String> {
        Some("test_project_id".to_string())
    }
}

fn image(repository_url: &str, digest: &str, tags: &[&str]) -> Image {
    let entry = ManifestEntry {
        image_size_bytes: 451960514,
        tag: tags.iter().map(|t| t.to_string()).collect(),
        time_uploaded_ms: 1673607900397,
        ..ManifestEntry::default()
    };
    Image::from_manifest(&Repository::new(repository_url), digest, entry).unwrap()
}

fn stale() -> Credentials {
    Credentials::bearer("stale")
}

#[test]
fn test_delete_outcome_is_deleted() {
    assert!(DeleteOutcome::Deleted.is_deleted());
    assert!(
        !DeleteOutcome::Failed {
            status: StatusCode::FORBIDDEN
        }
        .is_deleted()
    );
}

#[tokio::test]
async fn test_delete_multiple_tags() {
    let mut server = mockito::Server::new_async().await;
    let repo = format!("{}/v2/test_project_id/a", server.url());
    let tag_1 = server
        .mock("DELETE", "/v2/test_project_id/a/manifests/19db44a6_1")
        .with_status(200)
        .create_async()
        .await;
    let tag_2 = server
        .mock("DELETE", "/v2/test_project_id/a/manifests/tag_2")
        .with_status(202)
        .create_async()
        .await;

    let client = Client::new().unwrap();
    let provider = CountingProvider::new("fresh");
    let mut deleter = Deleter::new(&client, &provider, stale());

    let deleted = deleter
        .delete_tags(&image(&repo, "sha256:1430", &["19db44a6_1", "tag_2"]))
        .await
        .unwrap();

    tag_1.assert_async().await;
    tag_2.assert_async().await;
    assert_eq!(deleted, 2);
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn test_delete_no_tags_issues_no_requests() {
    let mut server = mockito::Server::new_async().await;
    let repo = format!("{}/v2/test_project_id/a", server.url());
    let any_delete = server
        .mock("DELETE", mockito::Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let client = Client::new().unwrap();
    let provider = CountingProvider::new("fresh");
    let mut deleter = Deleter::new(&client, &provider, stale());

    let deleted = deleter
        .delete_tags(&image(&repo, "sha256:1430", &[]))
        .await
        .unwrap();

    any_delete.assert_async().await;
    assert_eq!(deleted, 0);
}

#[tokio::test]
async fn test_tag_401_then_success_refreshes_once() {
    let mut server = mockito::Server::new_async().await;
    let repo = format!("{}/v2/test_project_id/a", server.url());
    let rejected = server
        .mock("DELETE", "/v2/test_project_id/a/manifests/v1")
        .match_header("authorization", "Bearer stale")
        .with_status(401)
        .expect(1)
        .create_async()
        .await;
    let accepted = server
        .mock("DELETE", "/v2/test_project_id/a/manifests/v1")
        .match_header("authorization", "Bearer fresh")
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    let client = Client::new().unwrap();
    let provider = CountingProvider::new("fresh");
    let mut deleter = Deleter::new(&client, &provider, stale());

    let deleted = deleter
        .delete_tags(&image(&repo, "sha256:1430", &["v1"]))
        .await
        .unwrap();

    rejected.assert_async().await;
    accepted.assert_async().await;
    assert_eq!(deleted, 1);
    assert_eq!(provider.calls(), 1);
    assert_eq!(deleter.refreshes(), 1);
    assert_eq!(deleter.credentials(), &Credentials::bearer("fresh"));
}

#[tokio::test]
async fn test_tag_401_twice_fails_after_single_refresh() {
    let mut server = mockito::Server::new_async().await;
    let repo = format!("{}/v2/test_project_id/a", server.url());
    let rejected = server
        .mock("DELETE", "/v2/test_project_id/a/manifests/v1")
        .with_status(401)
        .expect(2)
        .create_async()
        .await;

    let client = Client::new().unwrap();
    let provider = CountingProvider::new("fresh");
    let mut deleter = Deleter::new(&client, &provider, stale());

    let deleted = deleter
        .delete_tags(&image(&repo, "sha256:1430", &["v1"]))
        .await
        .unwrap();

    rejected.assert_async().await;
    assert_eq!(deleted, 0);
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn test_each_request_gets_its_own_retry() {
    let mut server = mockito::Server::new_async().await;
    let repo = format!("{}/v2/test_project_id/a", server.url());
    // every request is rejected: two attempts per tag, one refresh per tag
    let rejected = server
        .mock("DELETE", mockito::Matcher::Regex(r"^/v2/test_project_id/a/manifests/".into()))
        .with_status(401)
        .expect(4)
        .create_async()
        .await;

    let client = Client::new().unwrap();
    let provider = CountingProvider::new("fresh");
    let mut deleter = Deleter::new(&client, &provider, stale());

    let deleted = deleter
        .delete_tags(&image(&repo, "sha256:1430", &["v1", "v2"]))
        .await
        .unwrap();

    rejected.assert_async().await;
    assert_eq!(deleted, 0);
    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn test_refresh_without_token_falls_back_to_anonymous() {
    let mut server = mockito::Server::new_async().await;
    let repo = format!("{}/v2/test_project_id/a", server.url());
    let _first = server
        .mock("DELETE", "/v2/test_project_id/a/manifests/v1")
        .match_header("authorization", "Bearer stale")
        .with_status(401)
        .create_async()
        .await;
    let anonymous = server
        .mock("DELETE", "/v2/test_project_id/a/manifests/v1")
        .match_header("authorization", mockito::Matcher::Missing)
        .with_status(401)
        .expect(1)
        .create_async()
        .await;

    let client = Client::new().unwrap();
    let provider = CountingProvider {
        token: None,
        calls: AtomicUsize::new(0),
    };
    let mut deleter = Deleter::new(&client, &provider, stale());

    let outcome = deleter.delete_reference(&repo, "v1").await.unwrap();

    anonymous.assert_async().await;
    assert_eq!(
        outcome,
        DeleteOutcome::Failed {
            status: StatusCode::UNAUTHORIZED
        }
    );
    assert!(deleter.credentials().is_anonymous());
}

#[tokio::test]
async fn test_forbidden_is_not_retried() {
    let mut server = mockito::Server::new_async().await;
    let repo = format!("{}/v2/test_project_id/a", server.url());
    let forbidden = server
        .mock("DELETE", "/v2/test_project_id/a/manifests/sha256:1430")
        .with_status(403)
        .expect(1)
        .create_async()
        .await;

    let client = Client::new().unwrap();
    let provider = CountingProvider::new("fresh");
    let mut deleter = Deleter::new(&client, &provider, stale());

    let deleted = deleter
        .delete_image(&image(&repo, "sha256:1430", &[]))
        .await
        .unwrap();

    forbidden.assert_async().await;
    assert!(!deleted);
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn test_delete_image_success() {
    let mut server = mockito::Server::new_async().await;
    let repo = format!("{}/v2/test_project_id/a", server.url());
    let mock = server
        .mock("DELETE", "/v2/test_project_id/a/manifests/sha256:1430")
        .with_status(202)
        .create_async()
        .await;

    let client = Client::new().unwrap();
    let provider = CountingProvider::new("fresh");
    let mut deleter = Deleter::new(&client, &provider, stale());

    let deleted = deleter
        .delete_image(&image(&repo, "sha256:1430", &["v1"]))
        .await
        .unwrap();

    mock.assert_async().await;
    assert!(deleted);
}

#[tokio::test]
async fn test_delete_image_401_then_success() {
    let mut server = mockito::Server::new_async().await;
    let repo = format!("{}/v2/test_project_id/a", server.url());
    let _rejected = server
        .mock("DELETE", "/v2/test_project_id/a/manifests/sha256:1430")
        .match_header("authorization", "Bearer stale")
        .with_status(401)
        .create_async()
        .await;
    let accepted = server
        .mock("DELETE", "/v2/test_project_id/a/manifests/sha256:1430")
        .match_header("authorization", "Bearer fresh")
        .with_status(200)
        .create_async()
        .await;

    let client = Client::new().unwrap();
    let provider = CountingProvider::new("fresh");
    let mut deleter = Deleter::new(&client, &provider, stale());

    let deleted = deleter
        .delete_image(&image(&repo, "sha256:1430", &[]))
        .await
        .unwrap();

    accepted.assert_async().await;
    assert!(deleted);
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn test_partial_tag_failure_still_deletes_manifest() {
    let mut server = mockito::Server::new_async().await;
    let repo = format!("{}/v2/test_project_id/a", server.url());
    let _tag_ok = server
        .mock("DELETE", "/v2/test_project_id/a/manifests/v1")
        .with_status(200)
        .create_async()
        .await;
    let _tag_forbidden = server
        .mock("DELETE", "/v2/test_project_id/a/manifests/v2")
        .with_status(403)
        .create_async()
        .await;
    let manifest = server
        .mock("DELETE", "/v2/test_project_id/a/manifests/sha256:1430")
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    let client = Client::new().unwrap();
    let provider = CountingProvider::new("fresh");
    let mut deleter = Deleter::new(&client, &provider, stale());

    let outcome = deleter
        .delete(&image(&repo, "sha256:1430", &["v1", "v2"]))
        .await
        .unwrap();

    manifest.assert_async().await;
    assert_eq!(
        outcome,
        DeletionOutcome {
            tags_deleted: 1,
            image_deleted: true,
        }
    );
}

#[tokio::test]
async fn test_tags_are_deleted_before_manifest_in_order() {
    let mut server = mockito::Server::new_async().await;
    let repo = format!("{}/v2/test_project_id/a", server.url());
    let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let recorder = Arc::clone(&seen);
    let mock = server
        .mock("DELETE", mockito::Matcher::Any)
        .with_status(202)
        .with_body_from_request(move |request| {
            recorder.lock().unwrap().push(request.path().to_string());
            Vec::new()
        })
        .expect(4)
        .create_async()
        .await;

    let client = Client::new().unwrap();
    let provider = CountingProvider::new("fresh");
    let mut deleter = Deleter::new(&client, &provider, stale());

    let outcome = deleter
        .delete(&image(&repo, "sha256:1430", &["c", "a", "b"]))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(outcome.tags_deleted, 3);
    assert!(outcome.image_deleted);
    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            "/v2/test_project_id/a/manifests/c",
            "/v2/test_project_id/a/manifests/a",
            "/v2/test_project_id/a/manifests/b",
            "/v2/test_project_id/a/manifests/sha256:1430",
        ]
    );
}

#[tokio::test]
async fn test_dry_run_sends_nothing_and_counts_everything() {
    let mut server = mockito::Server::new_async().await;
    let repo = format!("{}/v2/test_project_id/a", server.url());
    let any_delete = server
        .mock("DELETE", mockito::Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let client = Client::new().unwrap();
    let provider = CountingProvider::new("fresh");
    let mut deleter = Deleter::new(&client, &provider, stale()).with_dry_run(true);

    let outcome = deleter
        .delete(&image(&repo, "sha256:1430", &["v1", "v2"]))
        .await
        .unwrap();

    any_delete.assert_async().await;
    assert_eq!(
        outcome,
        DeletionOutcome {
            tags_deleted: 2,
            image_deleted: true,
        }
    );
}

#[tokio::test]
async fn test_transport_failure_propagates() {
    let client = Client::with_config(crate::client::ClientConfig::new().with_timeout(1)).unwrap();
    let provider = CountingProvider::new("fresh");
    let mut deleter = Deleter::new(&client, &provider, stale());

    let result = deleter
        .delete(&image("http://127.0.0.1:9/v2/p/a", "sha256:1430", &["v1"]))
        .await;

    assert!(result.is_err());
}
