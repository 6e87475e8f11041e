//! Configuration management for the tournament engine
//!
//! This module handles configuration loading from TOML files and environment
//! variables, validation, and default values for every engine component.

pub mod app;
pub mod pairing;
pub mod rating;
pub mod scoring;

// Re-export commonly used types
pub use app::{validate_config, AppConfig, ServiceSettings};
pub use pairing::PairingConfig;
pub use rating::{KFactors, RatingConfig};
pub use scoring::{MatchPoints, ScoringConfig};
