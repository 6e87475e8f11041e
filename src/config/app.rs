//! Main application configuration
//!
//! This module defines the top-level configuration for the tournament engine,
//! including TOML file loading, environment variable overrides and validation.

use crate::category::CategoryTable;
use crate::config::pairing::PairingConfig;
use crate::config::rating::RatingConfig;
use crate::config::scoring::ScoringConfig;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub rating: RatingConfig,
    pub scoring: ScoringConfig,
    pub pairing: PairingConfig,
    pub categories: CategoryTable,
}

/// Service-level settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging and metrics
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "club-tournament".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: AppConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<()> {
        // Service settings
        if let Ok(name) = env::var("SERVICE_NAME") {
            self.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            self.service.log_level = log_level;
        }

        // Rating settings
        if let Ok(k) = env::var("RATING_K_BEGINNER") {
            self.rating.k_factors.beginner = k
                .parse()
                .map_err(|_| anyhow!("Invalid RATING_K_BEGINNER value: {}", k))?;
        }
        if let Ok(k) = env::var("RATING_K_INTERMEDIATE") {
            self.rating.k_factors.intermediate = k
                .parse()
                .map_err(|_| anyhow!("Invalid RATING_K_INTERMEDIATE value: {}", k))?;
        }
        if let Ok(k) = env::var("RATING_K_EXPERT") {
            self.rating.k_factors.expert = k
                .parse()
                .map_err(|_| anyhow!("Invalid RATING_K_EXPERT value: {}", k))?;
        }
        if let Ok(impact) = env::var("RATING_DS_IMPACT") {
            self.rating.ds_impact = impact
                .parse()
                .map_err(|_| anyhow!("Invalid RATING_DS_IMPACT value: {}", impact))?;
        }
        if let Ok(divider) = env::var("RATING_DIVIDER") {
            self.rating.rating_divider = divider
                .parse()
                .map_err(|_| anyhow!("Invalid RATING_DIVIDER value: {}", divider))?;
        }

        // Scoring settings
        if let Ok(threshold) = env::var("DOMINANCE_THRESHOLD") {
            self.scoring.dominance_threshold = threshold
                .parse()
                .map_err(|_| anyhow!("Invalid DOMINANCE_THRESHOLD value: {}", threshold))?;
        }
        if let Ok(score) = env::var("FORFEIT_WIN_SCORE") {
            self.scoring.forfeit_win_score = score
                .parse()
                .map_err(|_| anyhow!("Invalid FORFEIT_WIN_SCORE value: {}", score))?;
        }

        // Pairing settings
        if let Ok(window) = env::var("PAIRING_REMATCH_WINDOW") {
            self.pairing.rematch_window = window
                .parse()
                .map_err(|_| anyhow!("Invalid PAIRING_REMATCH_WINDOW value: {}", window))?;
        }

        Ok(())
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // Validate log level
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    if config.service.name.is_empty() {
        return Err(anyhow!("Service name cannot be empty"));
    }

    config.rating.validate()?;
    config.scoring.validate()?;

    if config.pairing.rematch_window == 0 {
        return Err(anyhow!("Rematch window must be greater than 0"));
    }

    Ok(())
}
