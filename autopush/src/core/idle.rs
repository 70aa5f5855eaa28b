//! Idle duration between loop iterations.

use std::time::Duration;

/// Scale applied to the configured idle magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleUnit {
    Millis,
    Seconds,
    Minutes,
}

impl IdleUnit {
    /// Resolve a unit name. Returns `None` for anything other than `ms`, `s`, `m`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "ms" => Some(IdleUnit::Millis),
            "s" => Some(IdleUnit::Seconds),
            "m" => Some(IdleUnit::Minutes),
            _ => None,
        }
    }

    /// Resolve a unit name, falling back to minutes when it is not recognized.
    pub fn parse_or_fallback(raw: &str) -> Self {
        Self::parse(raw).unwrap_or(IdleUnit::Minutes)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            IdleUnit::Millis => "ms",
            IdleUnit::Seconds => "s",
            IdleUnit::Minutes => "m",
        }
    }
}

/// `magnitude × unit`, saturating instead of overflowing.
pub fn idle_duration(magnitude: u64, unit: IdleUnit) -> Duration {
    match unit {
        IdleUnit::Millis => Duration::from_millis(magnitude),
        IdleUnit::Seconds => Duration::from_secs(magnitude),
        IdleUnit::Minutes => Duration::from_secs(magnitude.saturating_mul(60)),
    }
}
