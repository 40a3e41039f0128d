use chanharvest::{HarvestError, HarvestOptions};
use std::fs;
use std::time::Duration;

fn valid() -> HarvestOptions {
    HarvestOptions::default()
        .with_credentials(["k1"])
        .with_queries(["tech influencer"])
}

#[test]
fn defaults_match_documented_values() {
    let o = HarvestOptions::default();
    assert_eq!(o.target, 5000);
    assert_eq!(o.checkpoint_every, 100);
    assert_eq!(o.page_size, 50);
    assert_eq!(o.min_subscribers, 5000);
    assert_eq!(o.rate_limit_backoff, Duration::from_secs(10));
    assert_eq!(o.remote_error_backoff, Duration::from_secs(5));
    assert_eq!(o.max_consecutive_failures, None);
    assert!(valid().validate().is_ok());
}

/// Every invalid shape is reported as a configuration error.
#[test]
fn validate_rejects_unusable_options() {
    let cases = vec![
        valid().with_credentials(Vec::<String>::new()),
        valid().with_credentials(["k1", "  "]),
        valid().with_queries(Vec::<String>::new()),
        valid().with_queries(["ok", ""]),
        valid().with_output(""),
        valid().with_target(0),
        valid().with_checkpoint_interval(0),
        valid().with_page_size(0),
        valid().with_page_size(51),
        valid().with_max_consecutive_failures(Some(0)),
    ];
    for (i, o) in cases.into_iter().enumerate() {
        match o.validate() {
            Err(HarvestError::Configuration(_)) => {}
            other => panic!("case {i}: expected configuration error, got {other:?}"),
        }
    }
}

/// JSON config: given keys override defaults, the rest stay as they were.
#[test]
fn json_file_overrides_defaults() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("harvest.json");
    fs::write(
        &path,
        r#"{
            "credentials": ["A", "B"],
            "queries": ["tech influencer", "food blogger"],
            "output": "out/partial.csv",
            "target": 250,
            "rate_limit_backoff_secs": 2,
            "max_consecutive_failures": 20
        }"#,
    )
    .unwrap();

    let o = HarvestOptions::from_json_file(&path).unwrap();
    assert_eq!(o.credentials, vec!["A", "B"]);
    assert_eq!(o.queries, vec!["tech influencer", "food blogger"]);
    assert_eq!(o.output, std::path::PathBuf::from("out/partial.csv"));
    assert_eq!(o.target, 250);
    assert_eq!(o.rate_limit_backoff, Duration::from_secs(2));
    assert_eq!(o.remote_error_backoff, Duration::from_secs(5));
    assert_eq!(o.max_consecutive_failures, Some(20));
    assert_eq!(o.checkpoint_every, 100);
    assert!(o.validate().is_ok());
}

#[test]
fn json_file_with_unknown_key_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("harvest.json");
    fs::write(&path, r#"{"credentials": ["A"], "max_influencers": 10}"#).unwrap();

    let err = HarvestOptions::from_json_file(&path).unwrap_err();
    assert!(matches!(err.downcast_ref::<HarvestError>(), Some(HarvestError::Configuration(_))));
}

/// Environment overlay (single test: process env is shared across threads).
#[test]
fn env_overlay_parses_lists_and_numbers() {
    std::env::set_var("HARVEST_API_KEYS", "k1, k2;k3");
    std::env::set_var("HARVEST_QUERIES", "tech influencer; fitness influencer\nmusic creator");
    std::env::set_var("HARVEST_TARGET", "42");
    std::env::set_var("HARVEST_PAGE_SIZE", "25");

    let o = HarvestOptions::default().merge_env().unwrap();
    assert_eq!(o.credentials, vec!["k1", "k2", "k3"]);
    assert_eq!(o.queries, vec!["tech influencer", "fitness influencer", "music creator"]);
    assert_eq!(o.target, 42);
    assert_eq!(o.page_size, 25);

    std::env::set_var("HARVEST_TARGET", "lots");
    let err = HarvestOptions::default().merge_env().unwrap_err();
    assert!(matches!(err, HarvestError::Configuration(_)));

    for k in ["HARVEST_API_KEYS", "HARVEST_QUERIES", "HARVEST_TARGET", "HARVEST_PAGE_SIZE"] {
        std::env::remove_var(k);
    }
}
