// =============================================================================
// Engine Configuration — detector tuning with atomic JSON persistence
// =============================================================================
//
// Every tunable parameter of the regime engine lives here. All fields carry
// `#[serde(default)]` so that adding new fields never breaks loading an older
// config file, and persistence uses an atomic tmp + rename pattern to prevent
// corruption on crash.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::htf_bias::HtfRule;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_warmup_bars() -> u64 {
    50
}

fn default_persist_n() -> u32 {
    3
}

fn default_transition_bars() -> u32 {
    5
}

fn default_width_window() -> usize {
    200
}

fn default_timeframes() -> Vec<String> {
    vec!["1m".to_string(), "5m".to_string(), "15m".to_string()]
}

// =============================================================================
// EngineConfig
// =============================================================================

/// Shared configuration applied to every per-timeframe detector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Bars (by sequence index) during which no regime is committed; the
    /// indicators still run so they are warm when the gate lifts.
    #[serde(default = "default_warmup_bars")]
    pub warmup_bars: u64,

    /// Consecutive confirmations required before a regime change commits.
    #[serde(default = "default_persist_n")]
    pub persist_n: u32,

    /// Length of the post-commit "in transition" window, in bars.
    #[serde(default = "default_transition_bars")]
    pub transition_bars: u32,

    /// Capacity of the band-width history feeding the adaptive volatility
    /// threshold.
    #[serde(default = "default_width_window")]
    pub width_window: usize,

    /// Higher-timeframe bias rule; `None` disables the cross-timeframe filter.
    #[serde(default)]
    pub htf_rule: Option<HtfRule>,

    /// Timeframes the manager sets a detector up for.
    #[serde(default = "default_timeframes")]
    pub timeframes: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            warmup_bars: default_warmup_bars(),
            persist_n: default_persist_n(),
            transition_bars: default_transition_bars(),
            width_window: default_width_window(),
            htf_rule: None,
            timeframes: default_timeframes(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// A missing or malformed file is an error so the caller can fall back to
    /// defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read engine config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse engine config from {}", path.display()))?;

        info!(
            path = %path.display(),
            warmup = config.warmup_bars,
            persist_n = config.persist_n,
            timeframes = ?config.timeframes,
            "engine config loaded"
        );

        Ok(config)
    }

    /// Persist the current configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content =
            serde_json::to_string_pretty(self).context("failed to serialise engine config")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "engine config saved (atomic)");
        Ok(())
    }
}
