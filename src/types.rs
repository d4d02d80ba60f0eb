// =============================================================================
// Shared types used across the regime engine
// =============================================================================

use serde::{Deserialize, Serialize};

/// A single OHLC bar as delivered by an external bar source.
///
/// `index` is the per-timeframe sequence number and must be strictly
/// increasing for bars fed into the same detector. The engine does not
/// re-check this; indicator recurrences are undefined on out-of-order input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Bar open time as epoch milliseconds (UTC).
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// Per-timeframe sequence number, starting at 0.
    pub index: u64,
}

impl Bar {
    pub fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64, index: u64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            index,
        }
    }
}

/// Directional component of a regime label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Bull,
    Bear,
    Neutral,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bull => write!(f, "bull"),
            Self::Bear => write!(f, "bear"),
            Self::Neutral => write!(f, "neutral"),
        }
    }
}

/// Volatility component of a regime label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Volatility {
    Expansion,
    Contraction,
}

impl std::fmt::Display for Volatility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Expansion => write!(f, "expansion"),
            Self::Contraction => write!(f, "contraction"),
        }
    }
}

/// Committed regime label: either still warming up, or a
/// `"{direction}_{volatility}"` pair.
///
/// Serializes as its display string (`"warming_up"`, `"bull_expansion"`, ...)
/// so snapshots and exports carry plain labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegimeLabel {
    WarmingUp,
    Regime(Direction, Volatility),
}

impl std::str::FromStr for RegimeLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "warming_up" {
            return Ok(Self::WarmingUp);
        }
        let (dir, vol) = s
            .split_once('_')
            .ok_or_else(|| format!("malformed regime label: {s}"))?;
        let direction = match dir {
            "bull" => Direction::Bull,
            "bear" => Direction::Bear,
            "neutral" => Direction::Neutral,
            other => return Err(format!("unknown direction: {other}")),
        };
        let volatility = match vol {
            "expansion" => Volatility::Expansion,
            "contraction" => Volatility::Contraction,
            other => return Err(format!("unknown volatility: {other}")),
        };
        Ok(Self::Regime(direction, volatility))
    }
}

impl Serialize for RegimeLabel {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for RegimeLabel {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for RegimeLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WarmingUp => write!(f, "warming_up"),
            Self::Regime(d, v) => write!(f, "{d}_{v}"),
        }
    }
}

impl RegimeLabel {
    /// The directional component, when committed.
    pub fn direction(&self) -> Option<Direction> {
        match self {
            Self::WarmingUp => None,
            Self::Regime(d, _) => Some(*d),
        }
    }
}

/// Coarse higher-timeframe directional bias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HtfBias {
    Bull,
    Bear,
    Neutral,
}

impl Default for HtfBias {
    fn default() -> Self {
        Self::Neutral
    }
}

impl std::fmt::Display for HtfBias {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bull => write!(f, "bull"),
            Self::Bear => write!(f, "bear"),
            Self::Neutral => write!(f, "neutral"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regime_label_display() {
        assert_eq!(RegimeLabel::WarmingUp.to_string(), "warming_up");
        assert_eq!(
            RegimeLabel::Regime(Direction::Bull, Volatility::Expansion).to_string(),
            "bull_expansion"
        );
        assert_eq!(
            RegimeLabel::Regime(Direction::Neutral, Volatility::Contraction).to_string(),
            "neutral_contraction"
        );
    }

    #[test]
    fn htf_bias_defaults_neutral() {
        assert_eq!(HtfBias::default(), HtfBias::Neutral);
    }

    #[test]
    fn regime_label_serde_round_trip() {
        for label in [
            RegimeLabel::WarmingUp,
            RegimeLabel::Regime(Direction::Bull, Volatility::Expansion),
            RegimeLabel::Regime(Direction::Bear, Volatility::Contraction),
        ] {
            let json = serde_json::to_string(&label).unwrap();
            let back: RegimeLabel = serde_json::from_str(&json).unwrap();
            assert_eq!(back, label);
        }
        assert_eq!(
            serde_json::to_string(&RegimeLabel::WarmingUp).unwrap(),
            "\"warming_up\""
        );
    }

    #[test]
    fn regime_label_rejects_garbage() {
        assert!("bullish".parse::<RegimeLabel>().is_err());
        assert!("bull_sideways".parse::<RegimeLabel>().is_err());
    }
}
