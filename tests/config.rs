use vorogrow::VoronoiConfig;

#[test]
fn test_json_round_trip() {
    let config = VoronoiConfig {
        tolerance: 1e-4,
        seed: 42,
        check_invariants: true,
    };
    let json = serde_json::to_string(&config).unwrap();
    let back: VoronoiConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back, config);
}

#[test]
fn test_missing_fields_take_defaults() {
    let config: VoronoiConfig = serde_json::from_str(r#"{ "seed": 7 }"#).unwrap();
    assert_eq!(config.seed, 7);
    assert_eq!(config.tolerance, VoronoiConfig::default().tolerance);
    assert!(!config.check_invariants);
}
