//! Source of "now" for date-relative queries.
//!
//! The query engine never reads the system clock itself. Callers pass an
//! instant whose UTC offset defines the local calendar used for "today",
//! "this week" and per-day grouping.

use time::{OffsetDateTime, UtcOffset};

/// Supplies the current time in the user's local offset.
pub trait Clock {
    fn now(&self) -> OffsetDateTime;
}

/// Wall clock shifted into a fixed local offset.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: UtcOffset,
}

impl SystemClock {
    pub fn new(offset: UtcOffset) -> Self {
        Self { offset }
    }

    /// Uses the operating system's current local offset, falling back to UTC
    /// when it cannot be determined.
    pub fn local() -> Self {
        let offset = UtcOffset::current_local_offset().unwrap_or_else(|err| {
            tracing::debug!("local offset unavailable, using UTC: {err}");
            UtcOffset::UTC
        });
        Self::new(offset)
    }

    pub fn offset(&self) -> UtcOffset {
        self.offset
    }
}

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc().to_offset(self.offset)
    }
}

/// Clock frozen at a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub OffsetDateTime);

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        self.0
    }
}
