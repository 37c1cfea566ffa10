//! Config validation: required declarations, unknown-key detection with
//! Levenshtein suggestions, and physical range checks.
//!
//! Three passes over a config document:
//!
//! 1. Walk the raw TOML key tree and warn about unknown keys with
//!    "did you mean?" suggestions. Warnings never break a config.
//! 2. Check every required key, including keys that depend on a selected
//!    `method`, and fail on the first one missing.
//! 3. After serde deserialization, range-check the typed values and
//!    collect every violation.

use std::collections::HashSet;
use std::fmt::Write as _;

use super::gearbox_config::{
    ConfigError, CurveFitGrid, DegradationConfig, FaultSourceConfig, GearConfig, GearboxConfig,
    SampleDistribution,
};
use crate::signal::{AmplitudeModel, ScaleModel};

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

const SIMULATION_KEYS: &[&str] = &[
    "rotational_frequency_in",
    "sample_interval",
    "sample_rate",
    "seed",
    "fixed_start",
    "max_state0_attempts",
];
const AMPLITUDE_KEYS: &[&str] = &["method", "constant", "constants", "mu", "sigma"];
const SCALE_KEYS: &[&str] = &[
    "method",
    "scale_min",
    "scale_max",
    "value_min",
    "value_max",
    "norm_divisor",
    "exponent",
];
const DISTRIBUTION_KEYS: &[&str] = &["distribution", "mean", "std", "low", "high"];
const PULSE_KEYS: &[&str] = &["type", "bandwidth", "bandwidth_reference_db"];
const FAULT_SOURCES: &[&str] = &["inner_ring", "rolling_element", "outer_ring"];

fn push_table(keys: &mut HashSet<String>, prefix: &str, fields: &[&str]) {
    keys.insert(prefix.to_string());
    for f in fields {
        keys.insert(format!("{prefix}.{f}"));
    }
}

/// Every valid dotted key path of [`GearboxConfig`].
///
/// Array-of-table entries (`[[bearings]]`) appear without an index.
/// Keep in sync with the records in `gearbox_config.rs`.
pub fn known_config_keys() -> HashSet<String> {
    let mut keys = HashSet::new();
    push_table(&mut keys, "simulation", SIMULATION_KEYS);

    for gear in ["gear_in", "gear_out"] {
        push_table(&mut keys, gear, &["no_teeth", "harmonics", "harmonics_fac"]);
        push_table(&mut keys, &format!("{gear}.signal"), PULSE_KEYS);
        push_table(&mut keys, &format!("{gear}.amplitude"), AMPLITUDE_KEYS);
        push_table(&mut keys, &format!("{gear}.noise"), AMPLITUDE_KEYS);
        push_table(&mut keys, &format!("{gear}.torque_scale"), SCALE_KEYS);

        let deg = format!("{gear}.degradation");
        push_table(&mut keys, &deg, &["failing_teeth"]);
        push_table(&mut keys, &format!("{deg}.chances"), &["neighbouring", "opposite", "keep_order"]);
        for d in ["n0", "a0", "neol", "aeol"] {
            push_table(&mut keys, &format!("{deg}.{d}"), DISTRIBUTION_KEYS);
        }
        push_table(&mut keys, &format!("{deg}.woehler"), &["k", "n_ref", "torque_ref"]);
        push_table(&mut keys, &format!("{deg}.grid"), &["theta1", "theta2", "theta3"]);

        let sig = format!("{gear}.degradation_signal");
        push_table(&mut keys, &sig, &["torque_influence"]);
        push_table(&mut keys, &format!("{sig}.scale"), SCALE_KEYS);
        push_table(&mut keys, &format!("{sig}.noise"), AMPLITUDE_KEYS);
    }

    push_table(&mut keys, "bearings", &["name", "shaft", "no_elements"]);
    for part in FAULT_SOURCES {
        let p = format!("bearings.{part}");
        push_table(&mut keys, &p, &["harmonics", "harmonics_fac"]);
        push_table(&mut keys, &format!("{p}.amplitude"), AMPLITUDE_KEYS);
        push_table(&mut keys, &format!("{p}.noise"), AMPLITUDE_KEYS);
        push_table(&mut keys, &format!("{p}.torque_scale"), SCALE_KEYS);
    }
    keys
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Recursively walks a `toml::Value` tree and collects all dotted key paths.
///
/// For example, a table `{ a = { b = 1, c = 2 } }` yields
/// `["a", "a.b", "a.c"]`. Tables inside arrays share their array's path.
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            match v {
                toml::Value::Table(_) => keys.extend(walk_toml_keys(v, &path)),
                toml::Value::Array(items) => {
                    for item in items.iter().filter(|i| i.is_table()) {
                        for key in walk_toml_keys(item, &path) {
                            if !keys.contains(&key) {
                                keys.push(key);
                            }
                        }
                    }
                }
                _ => {}
            }
        }
    }
    keys
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

/// Compute the Levenshtein edit distance between two strings.
fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a.chars().count();
    }

    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0; b_chars.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_chars.len()]
}

/// Suggest the closest known key for an unknown key, if within edit distance 3.
///
/// Ties resolve to the lexicographically smallest key so suggestions are stable.
pub fn suggest_correction(unknown: &str, known: &HashSet<String>) -> Option<String> {
    known
        .iter()
        .map(|k| (levenshtein(unknown, k), k))
        .filter(|(dist, _)| *dist <= 3)
        .min()
        .map(|(_, k)| k.clone())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Parse a raw TOML string and return warnings for any unknown config keys.
///
/// Parse errors are left to the typed deserialization that follows.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let value: toml::Value = match raw_toml.parse() {
        Ok(v) => v,
        Err(_) => return Vec::new(),
    };

    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key))
        .map(|key| ValidationWarning {
            suggestion: suggest_correction(&key, &known),
            message: format!("Unknown config key '{key}'"),
            field: key,
        })
        .collect()
}

// ============================================================================
// Required Declarations
// ============================================================================

fn require<'a>(
    table: &'a toml::Value,
    prefix: &str,
    key: &str,
) -> Result<&'a toml::Value, ConfigError> {
    table.get(key).ok_or_else(|| {
        ConfigError::MissingDeclaration(if prefix.is_empty() {
            key.to_string()
        } else {
            format!("{prefix}.{key}")
        })
    })
}

fn require_all(table: &toml::Value, prefix: &str, keys: &[&str]) -> Result<(), ConfigError> {
    for key in keys {
        require(table, prefix, key)?;
    }
    Ok(())
}

fn method_of<'a>(
    table: &'a toml::Value,
    prefix: &str,
    tag: &str,
) -> Result<&'a str, ConfigError> {
    // a non-string tag is a type error for serde to report
    Ok(require(table, prefix, tag)?.as_str().unwrap_or_default())
}

fn check_amplitude(table: &toml::Value, prefix: &str) -> Result<(), ConfigError> {
    match method_of(table, prefix, "method")? {
        "constant" => require_all(table, prefix, &["constant"]),
        "constant_repeat" => require_all(table, prefix, &["constants"]),
        "gaussian" | "gaussian_repeat" => require_all(table, prefix, &["mu", "sigma"]),
        _ => Ok(()),
    }
}

fn check_scale(table: &toml::Value, prefix: &str) -> Result<(), ConfigError> {
    const BOUNDS: &[&str] = &["scale_min", "scale_max", "value_min", "value_max"];
    match method_of(table, prefix, "method")? {
        "linear" | "exponential" => require_all(table, prefix, BOUNDS),
        "polynomial" => {
            require_all(table, prefix, BOUNDS)?;
            require_all(table, prefix, &["exponent"])
        }
        _ => Ok(()),
    }
}

fn check_distribution(table: &toml::Value, prefix: &str) -> Result<(), ConfigError> {
    match method_of(table, prefix, "distribution")? {
        "normal" | "lognormal" => require_all(table, prefix, &["mean", "std"]),
        "uniform" => require_all(table, prefix, &["low", "high"]),
        _ => Ok(()),
    }
}

/// Require `key` on `table` and run `check` on its value.
fn check_child(
    table: &toml::Value,
    prefix: &str,
    key: &str,
    check: fn(&toml::Value, &str) -> Result<(), ConfigError>,
) -> Result<(), ConfigError> {
    let child = require(table, prefix, key)?;
    check(child, &format!("{prefix}.{key}"))
}

fn check_gear(gear: &toml::Value, prefix: &str) -> Result<(), ConfigError> {
    require_all(gear, prefix, &["no_teeth", "harmonics"])?;
    let signal = require(gear, prefix, "signal")?;
    require(signal, &format!("{prefix}.signal"), "type")?;
    check_child(gear, prefix, "amplitude", check_amplitude)?;
    check_child(gear, prefix, "noise", check_amplitude)?;
    check_child(gear, prefix, "torque_scale", check_scale)?;

    let deg_prefix = format!("{prefix}.degradation");
    let deg = require(gear, prefix, "degradation")?;
    require(deg, &deg_prefix, "failing_teeth")?;
    let chances = require(deg, &deg_prefix, "chances")?;
    require_all(chances, &format!("{deg_prefix}.chances"), &["neighbouring", "opposite", "keep_order"])?;
    for d in ["n0", "a0", "neol", "aeol"] {
        check_child(deg, &deg_prefix, d, check_distribution)?;
    }
    let woehler = require(deg, &deg_prefix, "woehler")?;
    require_all(woehler, &format!("{deg_prefix}.woehler"), &["k", "n_ref", "torque_ref"])?;
    let grid = require(deg, &deg_prefix, "grid")?;
    require_all(grid, &format!("{deg_prefix}.grid"), &["theta1", "theta2", "theta3"])?;

    // optional section; a declared model must still be complete
    if let Some(sig) = gear.get("degradation_signal") {
        let sig_prefix = format!("{prefix}.degradation_signal");
        if sig.get("scale").is_some() {
            check_child(sig, &sig_prefix, "scale", check_scale)?;
        }
        if sig.get("noise").is_some() {
            check_child(sig, &sig_prefix, "noise", check_amplitude)?;
        }
    }
    Ok(())
}

/// Fail with [`ConfigError::MissingDeclaration`] on the first absent required key.
pub fn check_required_declarations(raw: &toml::Value) -> Result<(), ConfigError> {
    let sim = require(raw, "", "simulation")?;
    require_all(sim, "simulation", &["rotational_frequency_in", "sample_interval", "sample_rate"])?;

    for gear in ["gear_in", "gear_out"] {
        check_gear(require(raw, "", gear)?, gear)?;
    }

    if let Some(bearings) = raw.get("bearings").and_then(toml::Value::as_array) {
        for (i, bearing) in bearings.iter().enumerate() {
            let prefix = format!("bearings[{i}]");
            require_all(bearing, &prefix, &["name", "shaft", "no_elements"])?;
            for part in FAULT_SOURCES {
                let source = require(bearing, &prefix, part)?;
                let p = format!("{prefix}.{part}");
                require(source, &p, "harmonics")?;
                check_child(source, &p, "amplitude", check_amplitude)?;
                check_child(source, &p, "noise", check_amplitude)?;
                check_child(source, &p, "torque_scale", check_scale)?;
            }
        }
    }
    Ok(())
}

// ============================================================================
// Physical Range Validation
// ============================================================================

fn check_positive(value: f64, field: &str, errors: &mut Vec<String>) {
    if !(value.is_finite() && value > 0.0) {
        errors.push(format!("{field} = {value} must be a finite value > 0"));
    }
}

fn check_amplitude_model(model: &AmplitudeModel, field: &str, errors: &mut Vec<String>) {
    match model {
        AmplitudeModel::ConstantRepeat { constants } if constants.is_empty() => {
            errors.push(format!("{field}.constants must not be empty"));
        }
        AmplitudeModel::Gaussian { sigma, .. } | AmplitudeModel::GaussianRepeat { sigma, .. }
            if !(sigma.is_finite() && *sigma >= 0.0) =>
        {
            errors.push(format!("{field}.sigma = {sigma} must be finite and >= 0"));
        }
        _ => {}
    }
}

fn check_scale_model(model: &ScaleModel, field: &str, errors: &mut Vec<String>) {
    let Some(bounds) = model.bounds() else {
        return;
    };
    if matches!(model, ScaleModel::Polynomial(_)) && bounds.exponent.is_none() {
        errors.push(format!("{field}.exponent is required by the polynomial method"));
    }
    if bounds.norm_divisor == 0.0 || !bounds.norm_divisor.is_finite() {
        errors.push(format!("{field}.norm_divisor must be finite and non-zero"));
    }
    if model.apply(&[bounds.value_min], crate::signal::scale::ScaleBase::Zeros).is_err() {
        errors.push(format!(
            "{field}: value_min ({}) and value_max ({}) map onto the same point",
            bounds.value_min, bounds.value_max
        ));
    }
}

fn check_harmonics(harmonics: &[u32], fac: Option<&Vec<f64>>, field: &str, errors: &mut Vec<String>) {
    if harmonics.is_empty() {
        errors.push(format!("{field}.harmonics must not be empty"));
    }
    if harmonics.contains(&0) {
        errors.push(format!("{field}.harmonics must be orders >= 1"));
    }
    if let Some(fac) = fac {
        if fac.len() != harmonics.len() {
            errors.push(format!(
                "{field}.harmonics_fac has {} weights for {} harmonics",
                fac.len(),
                harmonics.len()
            ));
        }
    }
}

fn check_distribution_model(dist: &SampleDistribution, field: &str, errors: &mut Vec<String>) {
    match *dist {
        SampleDistribution::Normal { std, .. } | SampleDistribution::Lognormal { std, .. }
            if !(std.is_finite() && std >= 0.0) =>
        {
            errors.push(format!("{field}.std = {std} must be finite and >= 0"));
        }
        SampleDistribution::Uniform { low, high } if !(low < high) => {
            errors.push(format!("{field}: uniform bounds need low < high, got [{low}, {high})"));
        }
        _ => {}
    }
}

fn check_grid(grid: &CurveFitGrid, field: &str, errors: &mut Vec<String>) {
    for (name, range) in [("theta1", grid.theta1), ("theta2", grid.theta2), ("theta3", grid.theta3)] {
        let [start, stop, step] = range;
        if !(step > 0.0 && stop > start) || CurveFitGrid::axis(range).is_empty() {
            errors.push(format!(
                "{field}.{name} = [{start}, {stop}, {step}] must be a non-empty ascending range"
            ));
        }
    }
}

fn check_degradation(deg: &DegradationConfig, no_teeth: u32, field: &str, errors: &mut Vec<String>) {
    if deg.failing_teeth > no_teeth {
        errors.push(format!(
            "{field}.failing_teeth = {} exceeds no_teeth = {no_teeth}",
            deg.failing_teeth
        ));
    }
    for (name, value) in [
        ("neighbouring", deg.chances.neighbouring),
        ("opposite", deg.chances.opposite),
        ("keep_order", deg.chances.keep_order),
    ] {
        if !(value.is_finite() && value >= 0.0) {
            errors.push(format!("{field}.chances.{name} = {value} must be finite and >= 0"));
        }
    }
    for (name, dist) in [("n0", &deg.n0), ("a0", &deg.a0), ("neol", &deg.neol), ("aeol", &deg.aeol)] {
        check_distribution_model(dist, &format!("{field}.{name}"), errors);
    }
    check_positive(deg.woehler.k, &format!("{field}.woehler.k"), errors);
    check_positive(deg.woehler.n_ref, &format!("{field}.woehler.n_ref"), errors);
    check_positive(deg.woehler.torque_ref, &format!("{field}.woehler.torque_ref"), errors);
    check_grid(&deg.grid, &format!("{field}.grid"), errors);
}

fn check_gear_config(gear: &GearConfig, field: &str, errors: &mut Vec<String>) {
    if gear.no_teeth == 0 {
        errors.push(format!("{field}.no_teeth must be >= 1"));
    }
    check_harmonics(&gear.harmonics, gear.harmonics_fac.as_ref(), field, errors);
    let pulse = gear.signal.gauss_pulse();
    check_positive(pulse.bandwidth, &format!("{field}.signal.bandwidth"), errors);
    if !(pulse.bandwidth_reference_db < 0.0) {
        errors.push(format!(
            "{field}.signal.bandwidth_reference_db = {} must be < 0",
            pulse.bandwidth_reference_db
        ));
    }
    check_amplitude_model(&gear.amplitude, &format!("{field}.amplitude"), errors);
    check_amplitude_model(&gear.noise, &format!("{field}.noise"), errors);
    check_scale_model(&gear.torque_scale, &format!("{field}.torque_scale"), errors);
    check_degradation(&gear.degradation, gear.no_teeth, &format!("{field}.degradation"), errors);
    check_scale_model(
        &gear.degradation_signal.scale,
        &format!("{field}.degradation_signal.scale"),
        errors,
    );
    check_amplitude_model(
        &gear.degradation_signal.noise,
        &format!("{field}.degradation_signal.noise"),
        errors,
    );
}

fn check_fault_source(source: &FaultSourceConfig, field: &str, errors: &mut Vec<String>) {
    check_harmonics(&source.harmonics, source.harmonics_fac.as_ref(), field, errors);
    check_amplitude_model(&source.amplitude, &format!("{field}.amplitude"), errors);
    check_amplitude_model(&source.noise, &format!("{field}.noise"), errors);
    check_scale_model(&source.torque_scale, &format!("{field}.torque_scale"), errors);
}

/// Validate physical ranges on a parsed [`GearboxConfig`].
///
/// Returns (errors, warnings). Errors are impossible values that must
/// prevent construction; warnings are suspicious but not fatal.
pub fn validate_physical_ranges(config: &GearboxConfig) -> (Vec<String>, Vec<ValidationWarning>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let sim = &config.simulation;
    check_positive(sim.rotational_frequency_in, "simulation.rotational_frequency_in", &mut errors);
    check_positive(sim.sample_interval, "simulation.sample_interval", &mut errors);
    check_positive(sim.sample_rate, "simulation.sample_rate", &mut errors);
    if sim.max_state0_attempts == 0 {
        errors.push("simulation.max_state0_attempts must be >= 1".to_string());
    }

    check_gear_config(&config.gear_in, "gear_in", &mut errors);
    check_gear_config(&config.gear_out, "gear_out", &mut errors);

    let mut names = HashSet::new();
    for (i, bearing) in config.bearings.iter().enumerate() {
        let field = format!("bearings[{i}]");
        if bearing.no_elements == 0 {
            errors.push(format!("{field}.no_elements must be >= 1"));
        }
        check_fault_source(&bearing.inner_ring, &format!("{field}.inner_ring"), &mut errors);
        check_fault_source(&bearing.rolling_element, &format!("{field}.rolling_element"), &mut errors);
        check_fault_source(&bearing.outer_ring, &format!("{field}.outer_ring"), &mut errors);
        if !names.insert(bearing.name.as_str()) {
            warnings.push(ValidationWarning {
                field: format!("{field}.name"),
                message: format!("Bearing name '{}' is used more than once", bearing.name),
                suggestion: None,
            });
        }
    }

    // Mesh harmonics above Nyquist alias into the band of interest
    if errors.is_empty() {
        let nyquist = sim.sample_rate / 2.0;
        for (field, gear, freq) in [
            ("gear_in", &config.gear_in, sim.rotational_frequency_in),
            ("gear_out", &config.gear_out, config.rotational_frequency_out()),
        ] {
            let top = gear.harmonics.iter().copied().max().unwrap_or(1);
            let highest = freq * f64::from(gear.no_teeth) * f64::from(top);
            if highest > nyquist {
                let mut message = String::new();
                let _ = write!(
                    message,
                    "{field}: harmonic {top} of the mesh frequency ({highest:.1} Hz) exceeds Nyquist ({nyquist:.1} Hz)"
                );
                warnings.push(ValidationWarning {
                    field: format!("{field}.harmonics"),
                    message,
                    suggestion: None,
                });
            }
        }
    }

    (errors, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein_basics() {
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("same", "same"), 0);
    }

    #[test]
    fn test_walk_includes_array_tables_once() {
        let value: toml::Value = "[[bearings]]\nname = \"a\"\n[[bearings]]\nname = \"b\"\n"
            .parse()
            .unwrap();
        let keys = walk_toml_keys(&value, "");
        assert_eq!(keys, vec!["bearings".to_string(), "bearings.name".to_string()]);
    }

    #[test]
    fn test_reference_keys_are_all_known() {
        let toml_str = GearboxConfig::reference().to_toml().unwrap();
        let warnings = validate_unknown_keys(&toml_str);
        assert!(warnings.is_empty(), "Reference config produced warnings: {warnings:?}");
    }

    #[test]
    fn test_reference_has_no_range_errors() {
        let (errors, _) = validate_physical_ranges(&GearboxConfig::reference());
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn test_failing_teeth_cannot_exceed_tooth_count() {
        let mut config = GearboxConfig::reference();
        config.gear_in.degradation.failing_teeth = 22;
        let (errors, _) = validate_physical_ranges(&config);
        assert!(errors.iter().any(|e| e.contains("failing_teeth")));
    }

    #[test]
    fn test_nyquist_warning() {
        let mut config = GearboxConfig::reference();
        config.simulation.sample_rate = 1000.0;
        let (errors, warnings) = validate_physical_ranges(&config);
        assert!(errors.is_empty());
        assert!(warnings.iter().any(|w| w.message.contains("Nyquist")));
    }
}
