//! Freshness watermark of the published index

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

/// Newest record timestamp incorporated into the index.
///
/// Only ever moves forward.
#[derive(Debug, Default)]
pub struct Watermark {
    inner: Mutex<Option<DateTime<Utc>>>,
}

impl Watermark {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<DateTime<Utc>> {
        *self.inner.lock()
    }

    /// Move to `timestamp` if it is newer; returns whether it moved
    pub fn advance(&self, timestamp: DateTime<Utc>) -> bool {
        let mut current = self.inner.lock();
        match *current {
            Some(existing) if existing >= timestamp => false,
            _ => {
                *current = Some(timestamp);
                true
            }
        }
    }

    /// Whether the store holds records newer than the index
    pub fn is_stale(&self, latest_in_store: Option<DateTime<Utc>>) -> bool {
        match (latest_in_store, self.get()) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(latest), Some(mark)) => latest > mark,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_monotonic() {
        let watermark = Watermark::new();
        let now = Utc::now();

        assert!(watermark.advance(now));
        assert!(!watermark.advance(now - Duration::seconds(5)));
        assert_eq!(watermark.get(), Some(now));
        assert!(watermark.advance(now + Duration::seconds(1)));
    }

    #[test]
    fn test_staleness() {
        let watermark = Watermark::new();
        let now = Utc::now();

        assert!(!watermark.is_stale(None));
        assert!(watermark.is_stale(Some(now)));

        watermark.advance(now);
        assert!(!watermark.is_stale(Some(now)));
        assert!(watermark.is_stale(Some(now + Duration::milliseconds(1))));
    }
}
