#![deny(unsafe_code)]
//! # eisv-core
//!
//! Ties the EISV subsystems into one per-agent pipeline:
//!
//! - [`GovernanceConfig`]: TOML configuration with defaults for every section,
//! - [`GovernanceCore`]: dynamics step, governor verdict, resonance bus, and
//!   dialectic recovery whose resolutions reconfigure the governor.

pub mod config;
pub mod error;
pub mod pipeline;

pub use config::{GovernanceConfig, ResonanceConfig};
pub use error::ConfigError;
pub use pipeline::{AgentCycle, CycleReport, GovernanceCore};
