// =============================================================================
// Regime Detector — per-timeframe orchestrator
// =============================================================================
//
// Drives one timeframe's bar stream through the full pipeline:
//
//   bar -> HTF bias -> indicator update -> classification
//       -> HTF opposition filter -> persistence filter -> snapshot
//
// During warmup (bar.index < warmup_bars) the indicators still advance so
// they are warm the moment the gate lifts, but classification and the state
// machine are skipped entirely and every snapshot is forced to "warming_up"
// with zero confidence.
//
// The snapshot history is append-only and unbounded for the life of a run;
// retention is the caller's concern.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::EngineConfig;
use crate::htf_bias::HtfBiasCalculator;
use crate::indicators::calculators::{self, IndicatorValues};
use crate::indicators::state::IndicatorState;
use crate::regime::classifier;
use crate::regime::state_machine::RegimeStateMachine;
use crate::types::{Bar, Direction, HtfBias, RegimeLabel};

/// Volatility threshold used until the band-width history has enough samples.
const DEFAULT_BB_THRESHOLD: f64 = 0.04;

/// Percentile of the band-width history used as the adaptive threshold.
const BB_THRESHOLD_PERCENTILE: f64 = 70.0;

/// One immutable record per processed bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegimeSnapshot {
    /// Bar open time, epoch milliseconds.
    pub timestamp: i64,
    pub bar_index: u64,
    pub regime: RegimeLabel,
    pub confidence: f64,
    pub indicators: IndicatorValues,
    pub is_transition: bool,
    pub htf_bias: HtfBias,
}

/// Aggregate statistics over the committed (non-warmup) snapshot history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegimeStats {
    /// Snapshots per regime label.
    pub counts: BTreeMap<String, u64>,
    /// Mean confidence per regime label.
    pub mean_confidence: BTreeMap<String, f64>,
    /// Mean length of consecutive same-label runs, in bars.
    pub duration_mean: f64,
    pub duration_max: u64,
    pub duration_min: u64,
    /// Number of committed regime changes.
    pub total_transitions: u64,
}

/// Per-timeframe regime detection engine.
pub struct RegimeDetector {
    config: EngineConfig,
    indicators: IndicatorState,
    htf: HtfBiasCalculator,
    state_machine: RegimeStateMachine,
    history: Vec<RegimeSnapshot>,
}

impl RegimeDetector {
    pub fn new(config: EngineConfig) -> Self {
        let indicators = IndicatorState::new(config.width_window);
        let htf = HtfBiasCalculator::new(config.htf_rule);
        let state_machine = RegimeStateMachine::new(config.persist_n, config.transition_bars);
        Self {
            config,
            indicators,
            htf,
            state_machine,
            history: Vec::new(),
        }
    }

    /// Total bars processed so far.
    pub fn bars_processed(&self) -> u64 {
        self.history.len() as u64
    }

    /// Full append-only snapshot history, oldest first.
    pub fn history(&self) -> &[RegimeSnapshot] {
        &self.history
    }

    /// The most recent snapshot, if any bar has been processed.
    pub fn latest(&self) -> Option<&RegimeSnapshot> {
        self.history.last()
    }

    /// Process one bar and append the resulting snapshot.
    pub fn process(&mut self, bar: &Bar) -> RegimeSnapshot {
        // HTF bias always advances, warmup included, so the bias is settled
        // by the time the warmup gate lifts.
        let htf_bias = self.htf.update(bar);

        let values = calculators::update(&mut self.indicators, bar);

        if bar.index < self.config.warmup_bars {
            self.indicators.commit_close(bar.close);
            let snapshot = RegimeSnapshot {
                timestamp: bar.timestamp,
                bar_index: bar.index,
                regime: RegimeLabel::WarmingUp,
                confidence: 0.0,
                indicators: values,
                is_transition: false,
                htf_bias,
            };
            self.history.push(snapshot);
            return snapshot;
        }

        let bb_threshold = self.adaptive_bb_threshold();
        let result = classifier::classify(&values, bar.close, bb_threshold);

        // Cross-timeframe filter: a direction directly opposing the HTF bias
        // is demoted to neutral; the classified volatility is kept.
        let direction = match (htf_bias, result.direction) {
            (HtfBias::Bull, Direction::Bear) | (HtfBias::Bear, Direction::Bull) => {
                Direction::Neutral
            }
            (_, d) => d,
        };
        let proposed = RegimeLabel::Regime(direction, result.volatility);

        let (committed, is_transition) = self.state_machine.update(proposed);

        self.indicators.commit_close(bar.close);

        let snapshot = RegimeSnapshot {
            timestamp: bar.timestamp,
            bar_index: bar.index,
            regime: committed,
            confidence: result.confidence,
            indicators: values,
            is_transition,
            htf_bias,
        };

        debug!(
            index = bar.index,
            regime = %committed,
            proposed = %proposed,
            score = result.directional_score,
            confidence = format!("{:.2}", result.confidence),
            bb_threshold = format!("{:.4}", bb_threshold),
            htf_bias = %htf_bias,
            "bar processed"
        );

        self.history.push(snapshot);
        snapshot
    }

    /// Adaptive Bollinger-width threshold: the 70th percentile of the
    /// band-width history, excluding the width appended for the current bar.
    fn adaptive_bb_threshold(&self) -> f64 {
        let widths = self.indicators.widths.to_ordered_vec();
        if widths.len() < 2 {
            return DEFAULT_BB_THRESHOLD;
        }
        percentile(&widths[..widths.len() - 1], BB_THRESHOLD_PERCENTILE)
    }

    /// Aggregate statistics over the non-warmup history.
    pub fn stats(&self) -> RegimeStats {
        let committed: Vec<&RegimeSnapshot> = self
            .history
            .iter()
            .filter(|s| s.regime != RegimeLabel::WarmingUp)
            .collect();

        let mut counts: BTreeMap<String, u64> = BTreeMap::new();
        let mut confidence_sums: BTreeMap<String, f64> = BTreeMap::new();
        for snap in &committed {
            let label = snap.regime.to_string();
            *counts.entry(label.clone()).or_insert(0) += 1;
            *confidence_sums.entry(label).or_insert(0.0) += snap.confidence;
        }

        let mean_confidence = confidence_sums
            .into_iter()
            .map(|(label, sum)| {
                let n = counts[&label] as f64;
                (label, sum / n)
            })
            .collect();

        // Coalesce consecutive equal labels into runs.
        let mut runs: Vec<u64> = Vec::new();
        let mut prev: Option<RegimeLabel> = None;
        for snap in &committed {
            if prev == Some(snap.regime) {
                if let Some(last) = runs.last_mut() {
                    *last += 1;
                }
            } else {
                runs.push(1);
                prev = Some(snap.regime);
            }
        }

        let (duration_mean, duration_max, duration_min) = if runs.is_empty() {
            (0.0, 0, 0)
        } else {
            let sum: u64 = runs.iter().sum();
            (
                sum as f64 / runs.len() as f64,
                *runs.iter().max().unwrap_or(&0),
                *runs.iter().min().unwrap_or(&0),
            )
        };

        let total_transitions = runs.len().saturating_sub(1) as u64;

        RegimeStats {
            counts,
            mean_confidence,
            duration_mean,
            duration_max,
            duration_min,
            total_transitions,
        }
    }

    /// Serialize config, stats and the full history to a JSON document at
    /// `path`. I/O failures are fatal to the caller; there is no retry.
    pub fn export(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let document = self.export_document();

        let content = serde_json::to_string_pretty(&document)
            .context("failed to serialise export document")?;
        std::fs::write(path, content)
            .with_context(|| format!("failed to write export to {}", path.display()))?;
        Ok(())
    }

    /// Build the export document without touching the filesystem.
    pub fn export_document(&self) -> ExportDocument {
        let history = self
            .history
            .iter()
            .map(|snap| ExportSnapshot {
                timestamp: format_timestamp(snap.timestamp),
                bar_index: snap.bar_index,
                regime: snap.regime.to_string(),
                confidence: snap.confidence,
                indicators: snap.indicators,
                is_transition: snap.is_transition,
                htf_bias: snap.htf_bias.to_string(),
            })
            .collect();

        ExportDocument {
            config: ExportConfig {
                warmup_bars: self.config.warmup_bars,
                persist_n: self.config.persist_n,
                transition_bars: self.config.transition_bars,
                htf_rule: self.config.htf_rule.map(|r| r.to_string()),
                total_bars: self.bars_processed(),
            },
            stats: self.stats(),
            history,
        }
    }
}

/// Run-configuration section of the export document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    pub warmup_bars: u64,
    pub persist_n: u32,
    pub transition_bars: u32,
    pub htf_rule: Option<String>,
    pub total_bars: u64,
}

/// One flattened history entry of the export document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportSnapshot {
    /// RFC 3339 UTC string.
    pub timestamp: String,
    pub bar_index: u64,
    pub regime: String,
    pub confidence: f64,
    pub indicators: IndicatorValues,
    pub is_transition: bool,
    pub htf_bias: String,
}

/// Top-level export document: config, stats, full history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportDocument {
    pub config: ExportConfig,
    pub stats: RegimeStats,
    pub history: Vec<ExportSnapshot>,
}

fn format_timestamp(epoch_ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(epoch_ms)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| epoch_ms.to_string())
}

/// Linear-interpolation percentile of `values` (`pct` in [0, 100]).
fn percentile(values: &[f64], pct: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let rank = (pct / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    let frac = rank - lo as f64;
    sorted[lo] * (1.0 - frac) + sorted[hi] * frac
}
