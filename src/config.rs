//! Engine configuration.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use crate::logic::rating::K_FACTOR;
use crate::models::{FinalSetRule, ScoringRules, DEFAULT_RATING};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Scoring, rating and retry settings shared by the engines.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Best-of-N sets (odd).
    pub best_of: u8,
    pub final_set: FinalSetRule,
    /// Elo K-factor.
    pub k_factor: f64,
    /// Rating for players created without one.
    pub default_rating: i32,
    /// How many times the service re-runs an operation that lost a concurrent update.
    pub max_commit_retries: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            best_of: 3,
            final_set: FinalSetRule::Tiebreak,
            k_factor: K_FACTOR,
            default_rating: DEFAULT_RATING,
            max_commit_retries: 3,
        }
    }
}

impl EngineConfig {
    /// Load configuration from `TENNIS_*` environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let final_set = match std::env::var("TENNIS_FINAL_SET") {
            Ok(v) => match v.to_lowercase().as_str() {
                "tiebreak" => FinalSetRule::Tiebreak,
                "advantage" => FinalSetRule::Advantage,
                _ => {
                    return Err(ConfigError::Invalid {
                        var: "TENNIS_FINAL_SET".to_string(),
                        reason: format!("expected 'tiebreak' or 'advantage', got '{v}'"),
                    })
                }
            },
            Err(_) => defaults.final_set,
        };
        let config = Self {
            best_of: parse_env_or("TENNIS_BEST_OF", defaults.best_of),
            final_set,
            k_factor: parse_env_or("TENNIS_K_FACTOR", defaults.k_factor),
            default_rating: parse_env_or("TENNIS_DEFAULT_RATING", defaults.default_rating),
            max_commit_retries: parse_env_or("TENNIS_MAX_RETRIES", defaults.max_commit_retries),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.best_of == 0 || self.best_of % 2 == 0 {
            return Err(ConfigError::Invalid {
                var: "TENNIS_BEST_OF".to_string(),
                reason: format!("must be odd and positive, got {}", self.best_of),
            });
        }
        if !(self.k_factor.is_finite() && self.k_factor > 0.0) {
            return Err(ConfigError::Invalid {
                var: "TENNIS_K_FACTOR".to_string(),
                reason: format!("must be greater than 0, got {}", self.k_factor),
            });
        }
        Ok(())
    }

    pub fn scoring_rules(&self) -> ScoringRules {
        ScoringRules {
            best_of: self.best_of,
            final_set: self.final_set,
        }
    }
}

fn parse_env_or<T: std::str::FromStr>(var: &str, default: T) -> T {
    std::env::var(var)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
