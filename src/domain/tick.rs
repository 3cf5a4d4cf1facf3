//! Price tick representation.

use chrono::NaiveDateTime;

/// Timestamp layout every tick source produces.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub price: f64,
    pub timestamp: String,
    pub index: usize,
}

impl Tick {
    pub fn new(price: f64, timestamp: impl Into<String>, index: usize) -> Self {
        Tick {
            price,
            timestamp: timestamp.into(),
            index,
        }
    }

    /// Zip index-aligned prices and timestamps. Extra entries on either side are dropped.
    pub fn sequence<S: AsRef<str>>(prices: &[f64], timestamps: &[S]) -> Vec<Tick> {
        prices
            .iter()
            .zip(timestamps)
            .enumerate()
            .map(|(index, (&price, ts))| Tick::new(price, ts.as_ref(), index))
            .collect()
    }

    /// The `YYYY-MM-DD` part of the timestamp (shorter timestamps are returned whole).
    pub fn date_prefix(&self) -> &str {
        date_prefix(&self.timestamp)
    }

    pub fn parse_timestamp(&self) -> Option<NaiveDateTime> {
        parse_timestamp(&self.timestamp)
    }
}

/// `YYYY-MM-DD` of a `YYYY-MM-DD HH:MM:SS` timestamp.
pub fn date_prefix(timestamp: &str) -> &str {
    timestamp.get(..10).unwrap_or(timestamp)
}

pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value.trim(), TIMESTAMP_FORMAT).ok()
}

/// Whole minutes from `start` to `end`, truncated toward zero.
pub fn minutes_between(start: &str, end: &str) -> Option<i64> {
    let start = parse_timestamp(start)?;
    let end = parse_timestamp(end)?;
    Some((end - start).num_minutes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_assigns_indices() {
        let ticks = Tick::sequence(
            &[10.0, 11.0, 12.0],
            &["2024-01-02 09:30:00", "2024-01-02 09:31:00", "2024-01-02 09:32:00"],
        );
        assert_eq!(ticks.len(), 3);
        assert_eq!(ticks[2].index, 2);
        assert_eq!(ticks[1].timestamp, "2024-01-02 09:31:00");
        assert!((ticks[0].price - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn sequence_truncates_to_shorter_side() {
        let ticks = Tick::sequence(&[10.0, 11.0], &["2024-01-02 09:30:00"]);
        assert_eq!(ticks.len(), 1);
    }

    #[test]
    fn date_prefix() {
        let tick = Tick::new(1.0, "2024-03-21 09:45:00", 0);
        assert_eq!(tick.date_prefix(), "2024-03-21");

        let short = Tick::new(1.0, "2024", 0);
        assert_eq!(short.date_prefix(), "2024");
    }

    #[test]
    fn parse_valid_timestamp() {
        let tick = Tick::new(1.0, "2024-03-21 09:45:00", 0);
        let parsed = tick.parse_timestamp().unwrap();
        assert_eq!(parsed.to_string(), "2024-03-21 09:45:00");
    }

    #[test]
    fn parse_invalid_timestamp() {
        assert!(parse_timestamp("21/03/2024 09:45").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn minutes_between_truncates() {
        assert_eq!(
            minutes_between("2024-01-02 09:30:00", "2024-01-02 09:45:59"),
            Some(15)
        );
        assert_eq!(
            minutes_between("2024-01-02 09:30:00", "2024-01-03 09:30:00"),
            Some(24 * 60)
        );
        assert_eq!(minutes_between("bad", "2024-01-02 09:30:00"), None);
    }
}
