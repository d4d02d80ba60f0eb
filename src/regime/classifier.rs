// =============================================================================
// Regime Classifier — stateless directional / volatility scoring
// =============================================================================
//
// Maps one indicator snapshot plus the current close to a directional score,
// a volatility flag and an adaptive confidence.
//
// Score contributions (integer, summed):
//   close vs EMA50    +2 / -2   (only when EMA50 AND EMA200 are present)
//   close vs EMA200   +3 / -3   (same gate — avoids partial double counting)
//   RSI > 55 / < 45   +2 / -2
//   RSI > 70 / < 30   +1 / -1   (additional, on top of the previous row)
//   MACD hist sign    +2 / -2   (when present)
//   EMA20 slope sign  +1 /  0 / -1
//
// Confidence divides |score| by the weight the *present* indicators could at
// most have contributed, so sparse early snapshots yield low confidence
// instead of fabricated certainty.

use crate::indicators::calculators::IndicatorValues;
use crate::types::{Direction, Volatility};

/// ATR-ratio level above which volatility counts as expanding.
const ATR_EXPANSION_THRESHOLD: f64 = 1.1;

/// Outcome of one classification pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassificationResult {
    pub direction: Direction,
    pub volatility: Volatility,
    /// Adaptive confidence in [0, 1].
    pub confidence: f64,
    pub directional_score: i32,
}

/// Sum the integer directional contributions for the given snapshot.
pub fn directional_score(indicators: &IndicatorValues, close: f64) -> i32 {
    let mut score = 0;

    if let (Some(ema50), Some(ema200)) = (indicators.ema50, indicators.ema200) {
        if close > ema50 {
            score += 2;
        } else if close < ema50 {
            score -= 2;
        }
        if close > ema200 {
            score += 3;
        } else if close < ema200 {
            score -= 3;
        }
    }

    if let Some(rsi) = indicators.rsi {
        if rsi > 55.0 {
            score += 2;
        } else if rsi < 45.0 {
            score -= 2;
        }
        if rsi > 70.0 {
            score += 1;
        } else if rsi < 30.0 {
            score -= 1;
        }
    }

    if let Some(hist) = indicators.macd_histogram {
        if hist > 0.0 {
            score += 2;
        } else if hist < 0.0 {
            score -= 2;
        }
    }

    if let Some(slope) = indicators.ema_slope_sign {
        score += slope as i32;
    }

    score
}

/// Confidence = |score| / (maximum weight of the indicators actually present),
/// capped at 1.0. Zero when nothing contributed.
pub fn adaptive_confidence(score: i32, indicators: &IndicatorValues) -> f64 {
    let mut total_weight = 0;

    if indicators.ema50.is_some() && indicators.ema200.is_some() {
        total_weight += 5;
    }
    if indicators.rsi.is_some() {
        total_weight += 3;
    }
    if indicators.macd_histogram.is_some() {
        total_weight += 2;
    }
    // Slope only carries weight when it actually points somewhere.
    if matches!(indicators.ema_slope_sign, Some(s) if s != 0) {
        total_weight += 1;
    }

    if total_weight == 0 {
        return 0.0;
    }
    (score.unsigned_abs() as f64 / total_weight as f64).min(1.0)
}

/// Full classification: direction by score sign, volatility by ATR ratio or
/// Bollinger width against the adaptive threshold.
pub fn classify(
    indicators: &IndicatorValues,
    close: f64,
    bb_threshold: f64,
) -> ClassificationResult {
    let score = directional_score(indicators, close);
    let confidence = adaptive_confidence(score, indicators);

    let direction = if score > 0 {
        Direction::Bull
    } else if score < 0 {
        Direction::Bear
    } else {
        Direction::Neutral
    };

    let atr_expanding = matches!(indicators.atr_ratio, Some(r) if r > ATR_EXPANSION_THRESHOLD);
    let bands_expanding = matches!(indicators.bollinger_width, Some(w) if w > bb_threshold);
    let volatility = if atr_expanding || bands_expanding {
        Volatility::Expansion
    } else {
        Volatility::Contraction
    };

    ClassificationResult {
        direction,
        volatility,
        confidence,
        directional_score: score,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn empty_values() -> IndicatorValues {
        IndicatorValues {
            rsi: None,
            atr_ratio: None,
            bollinger_width: None,
            macd_histogram: None,
            ema20: None,
            ema50: None,
            ema200: None,
            ema_slope_sign: None,
        }
    }

    fn full_bull_values() -> IndicatorValues {
        IndicatorValues {
            rsi: Some(75.0),
            atr_ratio: Some(1.0),
            bollinger_width: Some(0.01),
            macd_histogram: Some(0.5),
            ema20: Some(105.0),
            ema50: Some(100.0),
            ema200: Some(95.0),
            ema_slope_sign: Some(1),
        }
    }

    // ---- directional_score -------------------------------------------------

    #[test]
    fn score_zero_on_empty_snapshot() {
        assert_eq!(directional_score(&empty_values(), 100.0), 0);
    }

    #[test]
    fn score_full_bull_stack() {
        // +2 (>EMA50) +3 (>EMA200) +2 (RSI>55) +1 (RSI>70) +2 (MACD) +1 (slope)
        assert_eq!(directional_score(&full_bull_values(), 110.0), 11);
    }

    #[test]
    fn score_full_bear_stack() {
        let values = IndicatorValues {
            rsi: Some(25.0),
            macd_histogram: Some(-0.5),
            ema_slope_sign: Some(-1),
            ..full_bull_values()
        };
        assert_eq!(directional_score(&values, 90.0), -11);
    }

    #[test]
    fn ema_contributions_gated_on_both_present() {
        // EMA50 present but EMA200 absent: neither EMA term may count.
        let values = IndicatorValues {
            ema200: None,
            rsi: Some(50.0),
            macd_histogram: None,
            ema_slope_sign: None,
            ..full_bull_values()
        };
        assert_eq!(directional_score(&values, 110.0), 0);
    }

    #[test]
    fn rsi_band_contributions() {
        let mut values = empty_values();
        values.rsi = Some(60.0);
        assert_eq!(directional_score(&values, 100.0), 2);
        values.rsi = Some(71.0);
        assert_eq!(directional_score(&values, 100.0), 3);
        values.rsi = Some(40.0);
        assert_eq!(directional_score(&values, 100.0), -2);
        values.rsi = Some(29.0);
        assert_eq!(directional_score(&values, 100.0), -3);
        values.rsi = Some(50.0);
        assert_eq!(directional_score(&values, 100.0), 0);
    }

    // ---- adaptive_confidence -----------------------------------------------

    #[test]
    fn confidence_zero_without_indicators() {
        assert_eq!(adaptive_confidence(0, &empty_values()), 0.0);
    }

    #[test]
    fn confidence_caps_at_one() {
        let values = full_bull_values();
        // |11| / 11 => 1.0 exactly with every weight present.
        assert_eq!(adaptive_confidence(11, &values), 1.0);
        assert_eq!(adaptive_confidence(15, &values), 1.0);
    }

    #[test]
    fn confidence_scales_with_present_weight() {
        // Only RSI present: weight 3.
        let mut values = empty_values();
        values.rsi = Some(60.0);
        let conf = adaptive_confidence(2, &values);
        assert!((conf - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn zero_slope_carries_no_weight() {
        let mut values = empty_values();
        values.rsi = Some(50.0);
        values.ema_slope_sign = Some(0);
        // Weight must be 3 (RSI only), not 4.
        let conf = adaptive_confidence(3, &values);
        assert!((conf - 1.0).abs() < 1e-12);
    }

    // ---- classify ----------------------------------------------------------

    #[test]
    fn classify_bull_contraction() {
        let result = classify(&full_bull_values(), 110.0, 0.04);
        assert_eq!(result.direction, Direction::Bull);
        assert_eq!(result.volatility, Volatility::Contraction);
        assert_eq!(result.directional_score, 11);
        assert!((result.confidence - 1.0).abs() < 1e-12);
    }

    #[test]
    fn classify_neutral_on_zero_score() {
        let result = classify(&empty_values(), 100.0, 0.04);
        assert_eq!(result.direction, Direction::Neutral);
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn atr_ratio_above_threshold_flags_expansion() {
        let mut values = full_bull_values();
        values.atr_ratio = Some(1.5);
        let result = classify(&values, 110.0, 0.04);
        assert_eq!(result.volatility, Volatility::Expansion);
    }

    #[test]
    fn wide_bands_flag_expansion() {
        let mut values = full_bull_values();
        values.bollinger_width = Some(0.08);
        let result = classify(&values, 110.0, 0.04);
        assert_eq!(result.volatility, Volatility::Expansion);
    }

    #[test]
    fn absent_volatility_inputs_default_to_contraction() {
        let mut values = empty_values();
        values.rsi = Some(60.0);
        let result = classify(&values, 100.0, 0.04);
        assert_eq!(result.volatility, Volatility::Contraction);
    }
}
