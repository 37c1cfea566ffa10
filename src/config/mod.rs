//! Gearbox Configuration Module
//!
//! Typed description of a gearbox (shaft speed, gears, bearings, fatigue
//! models) loaded from TOML.
//!
//! ## Loading Order
//!
//! 1. `GEARBOX_CONFIG` environment variable (path to TOML file)
//! 2. `gearbox.toml` in the current working directory
//! 3. The built-in reference gearbox
//!
//! ## Usage
//!
//! ```ignore
//! let config = GearboxConfig::load();
//! let mut gearbox = GearboxOrchestrator::new(config);
//! ```
//!
//! Unknown keys only produce warnings. Missing required keys fail with
//! [`ConfigError::MissingDeclaration`]; impossible values fail with
//! [`ConfigError::Validation`].

mod gearbox_config;
mod reference;
pub mod defaults;
pub mod validation;

pub use gearbox_config::*;
