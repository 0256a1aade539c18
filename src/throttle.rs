use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Duration;

/// Last emission time per `(context, level, message)` key.
#[derive(Debug)]
pub struct ThrottleCache {
    entries: HashMap<String, DateTime<Utc>>,
    window: Duration,
}

impl ThrottleCache {
    pub fn new(window: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            window,
        }
    }

    pub fn key(context: &str, level: &str, message: &str) -> String {
        format!("{}:{}:{}", context, level, message)
    }

    /// Entries older than this are dropped by `purge_expired`.
    pub fn max_age(&self) -> Duration {
        self.window * 2
    }

    /// Records `now` and returns true if the key may be emitted.
    pub fn try_acquire(&mut self, key: &str, now: DateTime<Utc>) -> bool {
        let allowed = match self.entries.get(key) {
            Some(last) => elapsed(*last, now) >= self.window,
            None => true,
        };

        if allowed {
            self.entries.insert(key.to_string(), now);
        }
        allowed
    }

    /// Removes entries older than twice the window; returns how many went.
    pub fn purge_expired(&mut self, now: DateTime<Utc>) -> usize {
        let max_age = self.max_age();
        let before = self.entries.len();
        self.entries.retain(|_, last| elapsed(*last, now) <= max_age);
        before - self.entries.len()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// Clock skew backwards counts as zero elapsed.
fn elapsed(from: DateTime<Utc>, to: DateTime<Utc>) -> Duration {
    (to - from).to_std().unwrap_or(Duration::ZERO)
}
