use time::{Date, OffsetDateTime, UtcOffset};

/// Source of "today" for date-dependent rules (past-date filtering, auto-advance).
pub trait Clock: Send + Sync {
    /// Current local date.
    fn today(&self) -> Date;
}

/// Wall clock shifted to the league's fixed UTC offset.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: UtcOffset,
}

impl SystemClock {
    /// Build a clock reporting dates at the given offset.
    pub fn new(offset: UtcOffset) -> Self {
        Self { offset }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new(UtcOffset::UTC)
    }
}

impl Clock for SystemClock {
    fn today(&self) -> Date {
        OffsetDateTime::now_utc().to_offset(self.offset).date()
    }
}

/// Clock frozen on a given date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub Date);

impl Clock for FixedClock {
    fn today(&self) -> Date {
        self.0
    }
}
