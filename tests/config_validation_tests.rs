//! Config Validation Tests
//!
//! Typo detection, required declarations and range validation of the
//! gearbox config, exercised independently from the engines.

use gearbox_twin::config::validation::{
    known_config_keys, suggest_correction, validate_physical_ranges, validate_unknown_keys,
};
use gearbox_twin::config::{ConfigError, GearboxConfig};

/// Reference config as a mutable TOML tree.
fn reference_tree() -> toml::Value {
    GearboxConfig::reference()
        .to_toml()
        .expect("Reference config should serialize")
        .parse()
        .expect("Serialized reference should parse")
}

fn parse_tree(tree: &toml::Value) -> Result<GearboxConfig, ConfigError> {
    GearboxConfig::from_toml_str(&toml::to_string(tree).unwrap())
}

fn missing_key(result: Result<GearboxConfig, ConfigError>) -> String {
    match result {
        Err(ConfigError::MissingDeclaration(key)) => key,
        other => panic!("Expected a missing declaration, got {other:?}"),
    }
}

// ============================================================================
// Typo Detection
// ============================================================================

#[test]
fn typo_in_simulation_key_warns_with_suggestion() {
    let toml_str = r#"
[simulation]
sampel_rate = 5000.0
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert_eq!(warnings.len(), 1, "Expected exactly 1 warning");
    assert!(warnings[0].field.contains("sampel_rate"));
    assert_eq!(warnings[0].suggestion.as_deref(), Some("simulation.sample_rate"));
    assert!(warnings[0].to_string().contains("did you mean"));
}

#[test]
fn typo_in_chance_factor_warns() {
    let toml_str = r#"
[gear_in.degradation.chances]
neighboring = 10.0
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert_eq!(warnings.len(), 1);
    assert_eq!(
        warnings[0].suggestion.as_deref(),
        Some("gear_in.degradation.chances.neighbouring")
    );
}

#[test]
fn typo_inside_bearing_array_warns_once() {
    let toml_str = r#"
[[bearings]]
nmae = "Bearing 1"

[[bearings]]
nmae = "Bearing 2"
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert_eq!(warnings.len(), 1, "Array entries share one key path");
    assert_eq!(warnings[0].suggestion.as_deref(), Some("bearings.name"));
}

#[test]
fn reference_serialization_produces_zero_warnings() {
    let toml_str = GearboxConfig::reference().to_toml().unwrap();
    let warnings = validate_unknown_keys(&toml_str);
    assert!(
        warnings.is_empty(),
        "Reference serialization should produce 0 unknown-key warnings, got: {:?}",
        warnings.iter().map(|w| &w.field).collect::<Vec<_>>()
    );
}

#[test]
fn empty_toml_produces_zero_warnings() {
    assert!(validate_unknown_keys("").is_empty());
}

#[test]
fn suggest_correction_returns_none_for_garbage() {
    let known = known_config_keys();
    let s = suggest_correction("zzz_completely_invalid_xyz_12345", &known);
    assert!(s.is_none(), "Garbage string should not match anything");
}

#[test]
fn typo_does_not_fail_loading() {
    let mut tree = reference_tree();
    tree["simulation"]
        .as_table_mut()
        .unwrap()
        .insert("fixed_strat".to_string(), toml::Value::Boolean(false));
    let config = parse_tree(&tree).expect("Unknown keys only warn");
    assert!(config.simulation.fixed_start, "Misspelled key must not take effect");
}

// ============================================================================
// Required Declarations
// ============================================================================

#[test]
fn missing_sample_rate_is_named() {
    let mut tree = reference_tree();
    tree["simulation"].as_table_mut().unwrap().remove("sample_rate");
    assert_eq!(missing_key(parse_tree(&tree)), "simulation.sample_rate");
}

#[test]
fn missing_method_parameter_is_named() {
    let mut tree = reference_tree();
    tree["gear_in"]["amplitude"] = "method = \"gaussian\"\nmu = 1.0".parse().unwrap();
    assert_eq!(missing_key(parse_tree(&tree)), "gear_in.amplitude.sigma");
}

#[test]
fn missing_woehler_exponent_is_named() {
    let mut tree = reference_tree();
    tree["gear_out"]["degradation"]["woehler"]
        .as_table_mut()
        .unwrap()
        .remove("k");
    assert_eq!(missing_key(parse_tree(&tree)), "gear_out.degradation.woehler.k");
}

#[test]
fn missing_bearing_fault_source_is_indexed() {
    let mut tree = reference_tree();
    tree["bearings"][1].as_table_mut().unwrap().remove("outer_ring");
    assert_eq!(missing_key(parse_tree(&tree)), "bearings[1].outer_ring");
}

#[test]
fn missing_polynomial_exponent_is_named() {
    let mut tree = reference_tree();
    tree["gear_in"]["torque_scale"] = r#"
method = "polynomial"
scale_min = 0.0
scale_max = 1.0
value_min = 0.0
value_max = 400.0
"#
    .parse()
    .unwrap();
    assert_eq!(missing_key(parse_tree(&tree)), "gear_in.torque_scale.exponent");
}

#[test]
fn degradation_signal_section_is_optional() {
    let mut tree = reference_tree();
    tree["gear_out"].as_table_mut().unwrap().remove("degradation_signal");
    let config = parse_tree(&tree).unwrap();
    assert!(config.gear_out.degradation_signal.torque_influence);
}

// ============================================================================
// Range Validation
// ============================================================================

#[test]
fn reference_config_has_no_range_errors() {
    let (errors, _) = validate_physical_ranges(&GearboxConfig::reference());
    assert!(errors.is_empty(), "Unexpected errors: {errors:?}");
}

#[test]
fn more_failing_teeth_than_teeth_is_error() {
    let mut config = GearboxConfig::reference();
    config.gear_in.degradation.failing_teeth = 30;
    let (errors, _) = validate_physical_ranges(&config);
    assert!(errors.iter().any(|e| e.contains("failing_teeth")));
}

#[test]
fn harmonic_weight_mismatch_is_error() {
    let mut config = GearboxConfig::reference();
    config.bearings[0].inner_ring.harmonics_fac = Some(vec![1.0, 2.0]);
    let (errors, _) = validate_physical_ranges(&config);
    assert!(
        errors.iter().any(|e| e.contains("bearings[0].inner_ring")),
        "Expected a harmonics error, got {errors:?}"
    );
}

#[test]
fn negative_chance_factor_is_error() {
    let mut config = GearboxConfig::reference();
    config.gear_out.degradation.chances.opposite = -1.0;
    let (errors, _) = validate_physical_ranges(&config);
    assert!(errors.iter().any(|e| e.contains("chances.opposite")));
}

#[test]
fn all_range_errors_surface_together() {
    let mut tree = reference_tree();
    tree["simulation"]["sample_rate"] = toml::Value::Float(-1.0);
    tree["gear_in"]["degradation"]["failing_teeth"] = toml::Value::Integer(99);
    match parse_tree(&tree) {
        Err(ConfigError::Validation(errors)) => {
            assert!(errors.len() >= 2, "Expected every problem reported: {errors:?}");
        }
        other => panic!("Expected validation error, got {other:?}"),
    }
}

// ============================================================================
// File Loading
// ============================================================================

#[test]
fn config_file_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gearbox.toml");
    let mut config = GearboxConfig::reference();
    config.simulation.seed = Some(11);
    config.save_to_file(&path).unwrap();

    let loaded = GearboxConfig::load_from_file(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn malformed_file_is_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "[simulation\nsample_rate = ").unwrap();
    match GearboxConfig::load_from_file(&path) {
        Err(ConfigError::Parse(p, _)) => assert_eq!(p, path),
        other => panic!("Expected parse error, got {other:?}"),
    }
}
