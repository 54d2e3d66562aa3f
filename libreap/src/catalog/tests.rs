use super::*;

fn bearer() -> Credentials {
    Credentials::bearer("test_access_token")
}

#[test]
fn test_repository_from_catalog() {
    let repo = Repository::from_catalog(
        "https://gcr.io/v2",
        "agile-analytics-prod-d7e7/app-engine-tmp/app/api/ttl-18h",
    );
    assert_eq!(
        repo.url(),
        "https://gcr.io/v2/agile-analytics-prod-d7e7/app-engine-tmp/app/api/ttl-18h"
    );
    assert_eq!(repo.to_string(), repo.url());
}

#[test]
fn test_is_owned_by_substring() {
    let repo = Repository::new("https://eu.gcr.io/v2/test_project_id/a");

    assert!(repo.is_owned_by(Some("test_project_id")));
    assert!(!repo.is_owned_by(Some("other_project")));
    assert!(!repo.is_owned_by(None));
}

#[test]
fn test_is_owned_by_empty_id_matches_everything() {
    let repo = Repository::new("https://gcr.io/v2/anyone/app");
    assert!(repo.is_owned_by(Some("")));
}

#[test]
fn test_is_owned_by_overmatches_prefixed_project() {
    // Ownership is a substring test: "proj" also claims "proj-other"
    let foreign = Repository::new("https://gcr.io/v2/proj-other/app");
    assert!(foreign.is_owned_by(Some("proj")));

    // and matches anywhere in the URL, not only the project segment
    let nested = Repository::new("https://gcr.io/v2/someone/proj/app");
    assert!(nested.is_owned_by(Some("proj")));
}

#[tokio::test]
async fn test_collect_single_source() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/v2/_catalog")
        .with_status(200)
        .with_body(r#"{"repositories":["test_project_id/a","test_project_id/b"]}"#)
        .create_async()
        .await;

    let client = Client::new().unwrap();
    let base = format!("{}/v2", server.url());
    let repos = collect_repositories(&client, &[base.clone()], Some("test_project_id"), &bearer())
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(
        repos,
        vec![
            Repository::new(format!("{}/test_project_id/a", base)),
            Repository::new(format!("{}/test_project_id/b", base)),
        ]
    );
}

#[tokio::test]
async fn test_collect_two_sources_preserves_order_and_filters() {
    let mut us = mockito::Server::new_async().await;
    let mut eu = mockito::Server::new_async().await;
    let _us_mock = us
        .mock("GET", "/v2/_catalog")
        .with_status(200)
        .with_body(r#"{"repositories":["test_project_id/a","unrelated/x"]}"#)
        .create_async()
        .await;
    let _eu_mock = eu
        .mock("GET", "/v2/_catalog")
        .with_status(200)
        .with_body(r#"{"repositories":["test_project_id/b"]}"#)
        .create_async()
        .await;

    let client = Client::new().unwrap();
    let us_base = format!("{}/v2", us.url());
    let eu_base = format!("{}/v2/", eu.url());
    let repos = collect_repositories(
        &client,
        &[us_base.clone(), eu_base],
        Some("test_project_id"),
        &bearer(),
    )
    .await
    .unwrap();

    let urls: Vec<&str> = repos.iter().map(Repository::url).collect();
    assert_eq!(
        urls,
        vec![
            format!("{}/test_project_id/a", us_base),
            format!("{}/v2/test_project_id/b", eu.url()),
        ]
    );
}

#[tokio::test]
async fn test_collect_without_project_id_keeps_nothing() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/v2/_catalog")
        .with_status(200)
        .with_body(r#"{"repositories":["test_project_id/a"]}"#)
        .create_async()
        .await;

    let client = Client::new().unwrap();
    let base = format!("{}/v2", server.url());
    let repos = collect_repositories(&client, &[base], None, &bearer())
        .await
        .unwrap();

    assert!(repos.is_empty());
}

#[tokio::test]
async fn test_collect_propagates_catalog_failure() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/v2/_catalog")
        .with_status(401)
        .create_async()
        .await;

    let client = Client::new().unwrap();
    let base = format!("{}/v2", server.url());
    let result = collect_repositories(&client, &[base], Some("p"), &bearer()).await;

    assert!(result.is_err());
}
