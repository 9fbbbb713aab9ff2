use workpulse::core::orchestrator::{
    parse_engine_output, Priority, RecommendationKind, RecommendationPayload, WorkloadLabel,
};
use workpulse::WorkpulseError;

#[test]
fn test_full_engine_document() {
    let doc = r#"{
        "theme_recommendation": {"theme": "dark-gaming", "reason": "Optimized for gaming workload", "workload": "gaming"},
        "performance_recommendation": {"cpu_governor": "performance", "io_scheduler": "mq-deadline", "swappiness": 10, "reason": "Gaming performance optimization"},
        "cleanup_recommendation": {"actions": ["clear_cache", "clean_temp"], "priority": "high", "disk_usage": 91.2, "memory_usage": 40.0},
        "break_recommendation": {"recommend_break": true, "session_duration": 2.5, "break_type": "long", "message": "Time for a break!"},
        "workload_optimization": {"suggestions": ["Close unnecessary applications"], "priority": "medium"},
        "predicted_apps": ["steam", "discord"],
        "confidence_score": 0.85
    }"#;

    let recs = parse_engine_output(doc).unwrap();
    let kinds: Vec<_> = recs.iter().map(|r| r.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            RecommendationKind::Theme,
            RecommendationKind::Performance,
            RecommendationKind::Cleanup,
            RecommendationKind::Break,
            RecommendationKind::WorkloadOptimization,
        ]
    );
    assert!(recs.iter().all(|r| r.confidence == 0.85));

    match &recs[0].payload {
        RecommendationPayload::Theme(theme) => {
            assert_eq!(theme.theme, "dark-gaming");
            assert_eq!(theme.workload, WorkloadLabel::Gaming);
        }
        other => panic!("unexpected payload {:?}", other),
    }
    match &recs[2].payload {
        RecommendationPayload::Cleanup(cleanup) => {
            assert_eq!(cleanup.priority, Priority::High);
            assert_eq!(cleanup.actions.len(), 2);
            assert_eq!(cleanup.disk_usage, Some(91.2));
        }
        other => panic!("unexpected payload {:?}", other),
    }
}

#[test]
fn test_missing_required_field_is_an_error() {
    let err = parse_engine_output(r#"{"theme_recommendation": {"workload": "gaming", "reason": "x"}}"#)
        .unwrap_err();

    match err {
        WorkpulseError::MissingField { kind, field } => {
            assert_eq!(kind, "theme");
            assert_eq!(field, "theme");
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_break_without_duration_is_an_error() {
    let err = parse_engine_output(r#"{"break_recommendation": {"recommend_break": true}}"#)
        .unwrap_err();
    assert!(matches!(err, WorkpulseError::MissingField { .. }));
}

#[test]
fn test_break_not_recommended_needs_no_duration() {
    let recs = parse_engine_output(r#"{"break_recommendation": {"recommend_break": false}}"#)
        .unwrap();
    assert_eq!(recs.len(), 1);
}

#[test]
fn test_text_output_is_malformed() {
    let err = parse_engine_output("🎨 Theme: dark-gaming").unwrap_err();
    assert!(err.is_transient());
}

#[test]
fn test_unknown_workload_in_theme() {
    let err = parse_engine_output(
        r#"{"theme_recommendation": {"theme": "x", "workload": "cooking", "reason": "y"}}"#,
    )
    .unwrap_err();
    assert!(matches!(err, WorkpulseError::UnknownWorkload(_)));
}
