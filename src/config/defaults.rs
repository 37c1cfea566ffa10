//! System-wide default constants.
//!
//! Centralises fixed model constants and guards. Grouped by subsystem.

// ============================================================================
// Configuration loading
// ============================================================================

/// Environment variable naming a gearbox TOML file.
pub const CONFIG_ENV_VAR: &str = "GEARBOX_CONFIG";

/// Config file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "gearbox.toml";

// ============================================================================
// Degradation
// ============================================================================

/// Default retry limit for drawing and fitting the initial tooth states.
pub const MAX_STATE0_ATTEMPTS: u32 = 100;

/// Seed counter ceiling; the counter restarts once it reaches this value.
pub const SEED_COUNTER_CEILING: u64 = 1 << 16;

/// Exclusive upper bound of the seed counter step, drawn from `[1, SEED_STEP_MAX)`.
pub const SEED_STEP_MAX: u64 = 10;

/// Retry limit for an inverse-CDF draw that matched no bucket.
pub const MAX_CHANCE_DRAW_RETRIES: u32 = 1_000;

/// Seed offset of the output gear's degradation stream relative to the input gear.
pub const GEAR_OUT_SEED_OFFSET: u64 = 1;

/// Decimal places of the output gear's load-cycle reference.
pub const OUTPUT_LOAD_CYCLE_DECIMALS: i32 = 3;

// ============================================================================
// Vibration
// ============================================================================

/// Load-contact-angle factor of the bearing fault frequency formulas.
pub const BEARING_CONTACT_FACTOR: f64 = 0.425;

/// Exclusive upper bound of the per-run vibration seed.
pub const VIBRATION_RUN_SEED_MAX: u64 = 1 << 16;

// ============================================================================
// Simulation binary
// ============================================================================

/// Constant torque (Nm) used when no torque profile is supplied.
pub const DEFAULT_TORQUE_NM: f64 = 200.0;
