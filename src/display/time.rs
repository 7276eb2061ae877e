//! Elapsed-time decomposition into HH:MM:SS digits

/// Elapsed time wraps after 100 hours so the hours fit in two digits
pub const WRAP_SECONDS: u64 = 360_000;

/// The time shown by one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockReading {
    pub hours: u8,
    pub minutes: u8,
    pub seconds: u8,
}

impl ClockReading {
    /// Reading for a fractional elapsed time; fractions are truncated and
    /// negative or NaN input reads as zero.
    pub fn from_elapsed(elapsed: f64) -> Self {
        Self::from_seconds(whole_seconds(elapsed))
    }

    pub fn from_seconds(total: u64) -> Self {
        let t = total % WRAP_SECONDS;
        Self {
            hours: (t / 3600) as u8,
            minutes: (t / 60 % 60) as u8,
            seconds: (t % 60) as u8,
        }
    }

    /// Tens and units of hours, minutes and seconds, left to right
    pub fn digits(&self) -> [u8; 6] {
        [
            self.hours / 10 % 10,
            self.hours % 10,
            self.minutes / 10,
            self.minutes % 10,
            self.seconds / 10,
            self.seconds % 10,
        ]
    }
}

/// Integer second of an elapsed time
pub fn whole_seconds(elapsed: f64) -> u64 {
    // `as` saturates: NaN and negatives become 0
    elapsed as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decomposes_hours_minutes_seconds() {
        assert_eq!(ClockReading::from_seconds(3661).digits(), [0, 1, 0, 1, 0, 1]);
        assert_eq!(ClockReading::from_seconds(0).digits(), [0, 0, 0, 0, 0, 0]);
        assert_eq!(ClockReading::from_seconds(359_999).digits(), [9, 9, 5, 9, 5, 9]);
    }

    #[test]
    fn wraps_after_one_hundred_hours() {
        assert_eq!(ClockReading::from_seconds(WRAP_SECONDS), ClockReading::from_seconds(0));
        assert_eq!(
            ClockReading::from_seconds(WRAP_SECONDS + 3661),
            ClockReading::from_seconds(3661)
        );
    }

    #[test]
    fn every_digit_is_decimal() {
        for t in (0..WRAP_SECONDS).step_by(997) {
            let reading = ClockReading::from_seconds(t);
            assert_eq!(u64::from(reading.hours), t / 3600);
            assert_eq!(u64::from(reading.minutes), t / 60 % 60);
            assert_eq!(u64::from(reading.seconds), t % 60);
            assert!(reading.digits().iter().all(|d| *d <= 9));
        }
    }

    #[test]
    fn fractional_elapsed_truncates() {
        assert_eq!(ClockReading::from_elapsed(59.999), ClockReading::from_seconds(59));
        assert_eq!(ClockReading::from_elapsed(-3.0), ClockReading::from_seconds(0));
        assert_eq!(ClockReading::from_elapsed(f64::NAN), ClockReading::from_seconds(0));
    }
}
