//! Config loading and defaults integration tests

use std::path::Path;

use logos_daemon::config::{Config, ConfigError, Credentials, ORIGINAL_POST_FLOOR_SECS};
use tempfile::TempDir;

#[test]
fn test_missing_file_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let config = Config::load(&dir.path().join("absent.toml")).unwrap();

    assert_eq!(config.cadence.max_posts_per_day, 8);
    assert_eq!(config.cadence.min_seconds_between_posts, 1800);
    assert_eq!(config.store.max_handled_ids, 50);
    assert_eq!(config.hunter.min_chars, 60);
    assert!((config.hunter.chance - 0.3).abs() < f64::EPSILON);
    assert!(!config.agent.dry_run);
    assert!(!config.agent.reply_only_if_mentioned);
    assert!(!config.reactions.downvote_enabled);
    assert!(!config.prophet.topics.is_empty());
}

#[test]
fn test_partial_file_keeps_other_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("logos-daemon.toml");
    std::fs::write(
        &path,
        r#"
[agent]
dry_run = true
seed = 42

[cadence]
max_posts_per_day = 3

[feed]
search_queries = ["free will"]
"#,
    )
    .unwrap();

    let config = Config::load(&path).unwrap();

    assert!(config.agent.dry_run);
    assert_eq!(config.agent.seed, Some(42));
    assert_eq!(config.cadence.max_posts_per_day, 3);
    assert_eq!(config.cadence.min_seconds_between_posts, 1800);
    assert_eq!(config.feed.search_queries, vec!["free will".to_string()]);
    assert_eq!(config.feed.limit, 20);
}

#[test]
fn test_original_interval_cannot_go_below_floor() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("fast.toml");
    std::fs::write(&path, "[prophet]\noriginal_post_interval_secs = 5\n").unwrap();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.prophet.original_post_interval_secs, 5);
    assert_eq!(config.prophet.effective_interval_secs(), ORIGINAL_POST_FLOOR_SECS);
}

#[test]
fn test_invalid_values_are_rejected() {
    let dir = TempDir::new().unwrap();

    let cases = [
        "[hunter]\nchance = 1.5\n",
        "[reactions]\nlike_chance = -0.1\n",
        "[cadence]\nmax_posts_per_day = 0\n",
        "[store]\nmax_handled_ids = 0\n",
        "[agent]\nloop_interval_secs = 0\n",
    ];

    for (i, body) in cases.iter().enumerate() {
        let path = dir.path().join(format!("bad-{}.toml", i));
        std::fs::write(&path, body).unwrap();
        assert!(
            matches!(Config::load(&path), Err(ConfigError::Invalid(_))),
            "expected rejection for {:?}",
            body
        );
    }
}

#[test]
fn test_malformed_toml_is_a_parse_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "[cadence\nmax_posts_per_day = 3").unwrap();

    assert!(matches!(
        Config::load(Path::new(&path)),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn test_credentials_require_both_keys() {
    let ok = Credentials::new(Some(" mb-key ".into()), Some("gm-key".into())).unwrap();
    assert_eq!(ok.moltbook_api_key, "mb-key");
    assert!(!format!("{:?}", ok).contains("gm-key"));

    assert!(matches!(
        Credentials::new(None, Some("gm-key".into())),
        Err(ConfigError::MissingCredential("MOLTBOOK_API_KEY"))
    ));
    assert!(matches!(
        Credentials::new(Some("mb-key".into()), Some("   ".into())),
        Err(ConfigError::MissingCredential("GEMINI_API_KEY"))
    ));
}
