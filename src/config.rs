// Central configuration — plain data consumed by the engine, never owned.
//
// Defaults cover everything; an optional JSON file (PALISADE_CONFIG) and a
// handful of environment variables override them. Secrets only come from
// env vars. A .env file is loaded automatically at CLI startup via dotenvy.

use std::env;
use std::fs;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::council::CouncilConfig;
use crate::provider::ProviderKind;
use crate::types::ModerationCategory;

/// Fast-path thresholds, always-verify rules, provider wiring, and council
/// settings for one `Moderator` instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationConfig {
    /// Adjusted severity at or above this fast-path denies (default 0.85)
    pub block_threshold: f64,
    /// Adjusted severity at or below this (with no detected terms)
    /// fast-path allows (default 0.10)
    pub allow_threshold: f64,
    /// Local confidence below this cannot fast-path (default 0.7)
    pub confidence_floor: f64,
    /// Categories that always require remote verification when scored above
    /// `always_verify_score` locally
    pub always_verify: Vec<ModerationCategory>,
    pub always_verify_score: f64,
    /// Known cross-lingual homophone traps: short tokens that read as slurs
    /// in one language but are benign in another. Never auto-denied without
    /// context.
    pub homophone_traps: Vec<String>,
    /// Merged severity at or above this denies at the api tier (default 0.7)
    pub remote_deny_threshold: f64,
    /// Merged severity at or below this allows at the api tier (default 0.3)
    pub remote_allow_threshold: f64,
    /// Primary remote classifier (None means local-only with escalation)
    pub primary_provider: Option<ProviderKind>,
    pub council_members: Vec<ProviderKind>,
    pub council: CouncilConfig,
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            block_threshold: 0.85,
            allow_threshold: 0.10,
            confidence_floor: 0.7,
            always_verify: vec![
                ModerationCategory::SelfHarm,
                ModerationCategory::ChildSafety,
                ModerationCategory::Threats,
            ],
            always_verify_score: 0.3,
            homophone_traps: vec![
                // Benign in Swedish/Norwegian ("ended", trade apprentice)
                // or German, slur-adjacent in English
                "slut".to_string(),
                "fag".to_string(),
                "bitte".to_string(),
            ],
            remote_deny_threshold: 0.7,
            remote_allow_threshold: 0.3,
            primary_provider: None,
            council_members: Vec::new(),
            council: CouncilConfig::default(),
        }
    }
}

impl ModerationConfig {
    /// Load configuration: defaults, then the optional JSON file named by
    /// PALISADE_CONFIG, then individual env-var overrides.
    pub fn load() -> Result<Self> {
        let mut config = match env::var("PALISADE_CONFIG") {
            Ok(path) => {
                let raw = fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read config file {path}"))?;
                serde_json::from_str(&raw)
                    .with_context(|| format!("Failed to parse config file {path}"))?
            }
            Err(_) => Self::default(),
        };

        if let Ok(url) = env::var("PALISADE_PROVIDER_URL") {
            config.primary_provider = Some(ProviderKind::Http {
                name: env::var("PALISADE_PROVIDER_NAME").unwrap_or_else(|_| "primary".to_string()),
                endpoint: url,
                api_key: env::var("PALISADE_PROVIDER_KEY").ok(),
                qps: env::var("PALISADE_PROVIDER_QPS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(1.0),
            });
        }
        if let Some(v) = parse_env("PALISADE_BLOCK_THRESHOLD")? {
            config.block_threshold = v;
        }
        if let Some(v) = parse_env("PALISADE_ALLOW_THRESHOLD")? {
            config.allow_threshold = v;
        }
        if let Some(v) = parse_env("PALISADE_CONFIDENCE_FLOOR")? {
            config.confidence_floor = v;
        }

        config.validate()?;
        Ok(config)
    }

    /// Sanity-check threshold ordering and ranges.
    pub fn validate(&self) -> Result<()> {
        for (name, v) in [
            ("block_threshold", self.block_threshold),
            ("allow_threshold", self.allow_threshold),
            ("confidence_floor", self.confidence_floor),
            ("always_verify_score", self.always_verify_score),
        ] {
            if !(0.0..=1.0).contains(&v) {
                anyhow::bail!("{name} must be in [0, 1], got {v}");
            }
        }
        if self.allow_threshold >= self.block_threshold {
            anyhow::bail!(
                "allow_threshold ({}) must be below block_threshold ({})",
                self.allow_threshold,
                self.block_threshold
            );
        }
        if self.council.escalate_min > self.council.escalate_max {
            anyhow::bail!("council escalate_min must not exceed escalate_max");
        }
        Ok(())
    }

    /// Check that a primary provider is configured.
    /// Call this before operations that require the remote tier.
    pub fn require_provider(&self) -> Result<()> {
        if self.primary_provider.is_none() {
            anyhow::bail!(
                "No primary provider configured. Set PALISADE_PROVIDER_URL\n\
                 or add primary_provider to the config file."
            );
        }
        Ok(())
    }
}

fn parse_env(name: &str) -> Result<Option<f64>> {
    match env::var(name) {
        Ok(raw) => {
            let v = raw
                .parse::<f64>()
                .with_context(|| format!("{name} must be a number, got {raw:?}"))?;
            Ok(Some(v))
        }
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(ModerationConfig::default().validate().is_ok());
    }

    #[test]
    fn inverted_thresholds_rejected() {
        let config = ModerationConfig {
            allow_threshold: 0.9,
            block_threshold: 0.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn out_of_range_rejected() {
        let config = ModerationConfig {
            confidence_floor: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
