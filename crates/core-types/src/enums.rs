use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Direction of the opportunity implied by the current risk zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalType {
    Long,
    Short,
    Neutral,
}

impl SignalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalType::Long => "LONG",
            SignalType::Short => "SHORT",
            SignalType::Neutral => "NEUTRAL",
        }
    }
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignalType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "LONG" => Ok(SignalType::Long),
            "SHORT" => Ok(SignalType::Short),
            "NEUTRAL" => Ok(SignalType::Neutral),
            other => Err(CoreError::UnknownVariant {
                kind: "signal type",
                value: other.to_string(),
            }),
        }
    }
}

/// Strength bucket of a total score. Ordered from weakest to strongest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalStrength {
    Weak,
    Moderate,
    Strong,
    Strongest,
}

impl SignalStrength {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalStrength::Weak => "WEAK",
            SignalStrength::Moderate => "MODERATE",
            SignalStrength::Strong => "STRONG",
            SignalStrength::Strongest => "STRONGEST",
        }
    }

    /// True for the buckets a trader would act on without waiting.
    pub fn is_actionable(&self) -> bool {
        matches!(self, SignalStrength::Strong | SignalStrength::Strongest)
    }
}

impl fmt::Display for SignalStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignalStrength {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "WEAK" => Ok(SignalStrength::Weak),
            "MODERATE" => Ok(SignalStrength::Moderate),
            "STRONG" => Ok(SignalStrength::Strong),
            "STRONGEST" => Ok(SignalStrength::Strongest),
            other => Err(CoreError::UnknownVariant {
                kind: "signal strength",
                value: other.to_string(),
            }),
        }
    }
}

/// Result of applying one daily tick to a band record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TickOutcome {
    /// First tick for this date: the band counter was incremented.
    Counted,
    /// The date was already recorded: only the current-state fields changed.
    Refreshed,
}
