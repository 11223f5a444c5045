use chrono::{DateTime, Duration, Utc};

/// Simulated wall clock. Advances only when the driver says so.
#[derive(Debug, Clone)]
pub struct SimulationClock {
    start: DateTime<Utc>,
    tick_duration: Duration,
    ticks: u64,
}

impl SimulationClock {
    pub fn new(start: DateTime<Utc>, tick_duration: Duration) -> Self {
        Self {
            start,
            tick_duration,
            ticks: 0,
        }
    }

    /// Saturates at the end of the representable calendar.
    pub fn now(&self) -> DateTime<Utc> {
        let elapsed_ms = self
            .tick_duration
            .num_milliseconds()
            .saturating_mul(i64::try_from(self.ticks).unwrap_or(i64::MAX));
        self.start
            .checked_add_signed(Duration::milliseconds(elapsed_ms))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn tick_duration(&self) -> Duration {
        self.tick_duration
    }

    /// Advances by `n` ticks and returns the new time.
    pub fn advance(&mut self, n: u64) -> DateTime<Utc> {
        self.ticks = self.ticks.saturating_add(n);
        self.now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn advances_in_whole_ticks() {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        let mut clock = SimulationClock::new(start, Duration::seconds(1));
        assert_eq!(clock.now(), start);
        let now = clock.advance(2);
        assert_eq!(now, start + Duration::seconds(2));
        assert_eq!(clock.ticks(), 2);
    }

    #[test]
    fn saturates_instead_of_overflowing() {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        let mut clock = SimulationClock::new(start, Duration::days(1));
        assert_eq!(clock.advance(u64::MAX), DateTime::<Utc>::MAX_UTC);
    }
}
