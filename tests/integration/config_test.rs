use tempfile::TempDir;
use workpulse::core::config::Config;
use workpulse::core::orchestrator::{EngineConfig, WorkloadLabel};

#[test]
fn test_config_default() {
    let config = Config::default();
    assert_eq!(config.engine.runtime, "python3");
    assert_eq!(config.engine.timeout_secs, 60);
    assert_eq!(config.schedule.workload_interval_secs, 30);
    assert_eq!(config.policy.theme_confidence_threshold, 0.7);
    assert_eq!(config.classifier.rules[0].label, WorkloadLabel::Gaming);
    assert!(config.notifications.enabled);
}

#[test]
fn test_config_load_nonexistent_returns_default() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::load_from(&temp_dir.path().join("missing.json")).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_config_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("config.json");

    let mut config = Config::default();
    config.set("policy.theme_cooldown_secs", "900").unwrap();
    config.set("notifications.enabled", "false").unwrap();
    config.save_to(&path).unwrap();

    let loaded = Config::load_from(&path).unwrap();
    assert_eq!(loaded, config);
    assert_eq!(loaded.policy.theme_cooldown_secs, 900);
    assert!(!loaded.notifications.enabled);
}

#[test]
fn test_corrupt_config_falls_back_to_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.json");
    std::fs::write(&path, "{ not json").unwrap();

    assert_eq!(Config::load_from(&path).unwrap(), Config::default());
}

#[test]
fn test_partial_config_fills_missing_sections() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.json");
    std::fs::write(&path, r#"{"schedule": {"recommendation_interval_secs": 600}}"#).unwrap();

    let config = Config::load_from(&path).unwrap();
    assert_eq!(config.schedule.recommendation_interval_secs, 600);
    assert_eq!(config.schedule.metrics_interval_secs, 1);
    assert_eq!(config.engine, EngineConfig::default());

    // Cooldown covers two polling intervals
    let settings = config.orchestrator_settings();
    assert_eq!(settings.policy.theme_cooldown_secs, 1200);
}

#[test]
fn test_set_list_value() {
    let mut config = Config::default();
    config
        .set("theme.command", r#"["theme-ctl", "{theme}"]"#)
        .unwrap();
    assert_eq!(config.theme.command, vec!["theme-ctl", "{theme}"]);
}
