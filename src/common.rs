use chrono::{DateTime, Utc};

pub type Price = f64;
pub type Quantity = u64;

/// Per-book source of arrival timestamps
///
/// Readings have nanosecond resolution and never go backwards, even if the
/// wall clock is stepped back underneath us.
#[derive(Clone, Debug, Default)]
pub struct Clock {
    last: i64,
}

impl Clock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&mut self) -> DateTime<Utc> {
        let nanos = Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX);
        self.last = self.last.max(nanos);
        DateTime::from_timestamp_nanos(self.last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_never_goes_backwards() {
        let mut clock = Clock::new();
        let mut previous = clock.now();

        for _ in 0..1000 {
            let current = clock.now();
            assert!(current >= previous);
            previous = current;
        }
    }

    #[test]
    fn test_clock_holds_after_wall_clock_step_back() {
        let mut clock = Clock { last: i64::MAX - 1 };
        let reading = clock.now();
        assert_eq!(reading.timestamp_nanos_opt(), Some(i64::MAX - 1));
    }
}
