//! TTL classes and the durations they map to.

use std::time::Duration;

use serde::Serialize;

/// Named expiry bucket chosen per read operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TtlClass {
    /// Highly volatile reads such as like lookups and the hot feed.
    Short,
    /// Feeds, single memes, profiles.
    Default,
    /// Rarely changing reference data such as categories.
    Long,
}

/// Concrete durations for each [`TtlClass`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtlPolicy {
    pub short: Duration,
    pub default: Duration,
    pub long: Duration,
}

impl TtlPolicy {
    pub fn new(short: Duration, default: Duration, long: Duration) -> Self {
        Self {
            short,
            default,
            long,
        }
    }

    pub fn duration(&self, class: TtlClass) -> Duration {
        match class {
            TtlClass::Short => self.short,
            TtlClass::Default => self.default,
            TtlClass::Long => self.long,
        }
    }

    /// The longest lifetime any entry can have.
    pub fn longest(&self) -> Duration {
        self.short.max(self.default).max(self.long)
    }
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self {
            short: Duration::from_secs(5 * 60),
            default: Duration::from_secs(60 * 60),
            long: Duration::from_secs(24 * 60 * 60),
        }
    }
}
