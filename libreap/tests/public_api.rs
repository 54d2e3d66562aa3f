use libreap::{Config, ReapError, Reaper, ReaperBuilder, RunSummary, StaticCredentialProvider};

#[test]
fn test_reaper_builder_defaults() {
    let reaper = ReaperBuilder::new()
        .credential_provider(StaticCredentialProvider::new("token", "proj"))
        .build()
        .unwrap();

    assert_eq!(
        reaper.registries(),
        ["https://gcr.io/v2", "https://eu.gcr.io/v2"]
    );
    assert_eq!(reaper.policy().keep_count, 5);
    assert!(!reaper.is_dry_run());
}

#[test]
fn test_reaper_builder_requires_credential_provider() {
    let result = Reaper::builder().registry("https://gcr.io/v2").build();
    assert!(matches!(result, Err(ReapError::Config { .. })));
}

#[test]
fn test_reaper_builder_rejects_registry_without_scheme() {
    let result = Reaper::builder()
        .registry("gcr.io/v2")
        .credential_provider(StaticCredentialProvider::default())
        .build();
    assert!(matches!(result, Err(ReapError::Config { .. })));
}

#[test]
fn test_reaper_builder_registry_replaces_defaults() {
    let reaper = Reaper::builder()
        .registry("http://localhost:5000/v2")
        .keep_count(2)
        .dry_run(true)
        .credential_provider(StaticCredentialProvider::default())
        .build()
        .unwrap();

    assert_eq!(reaper.registries(), ["http://localhost:5000/v2"]);
    assert_eq!(reaper.policy().keep_count, 2);
    assert!(reaper.is_dry_run());
}

#[test]
fn test_reaper_from_default_config() {
    let reaper = Reaper::from_config(&Config::default()).unwrap();
    assert_eq!(reaper.registries().len(), 2);
}

#[test]
fn test_run_summary_display() {
    let summary = RunSummary {
        tags_deleted: 4,
        images_deleted: 2,
        images_considered: 12,
    };
    assert_eq!(
        summary.to_string(),
        "Finished managing container images. Deleted 2/12 (16.67%). Also deleted 4 tags."
    );
}

#[test]
fn test_run_summary_percent_with_nothing_considered() {
    let summary = RunSummary::default();
    assert_eq!(summary.percent_deleted(), 0.0);
    assert!(summary.to_string().contains("Deleted 0/0 (0.00%)"));
}

#[test]
fn test_run_summary_serializes_counts() {
    let summary = RunSummary {
        tags_deleted: 1,
        images_deleted: 3,
        images_considered: 4,
    };
    let value = serde_json::to_value(summary).unwrap();
    assert_eq!(value["tags_deleted"], 1);
    assert_eq!(value["images_deleted"], 3);
    assert_eq!(value["images_considered"], 4);
}

#[test]
fn test_version_is_set() {
    assert!(!libreap::version().is_empty());
}
