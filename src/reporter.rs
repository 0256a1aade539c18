//! Throttled reporting facade.
//!
//! Identical `(context, level, message)` reports reach the console at most
//! once per throttle window. Every call still returns a [`LogEntry`].

use crate::config::Config;
use crate::console::{ConsoleSink, LogConsole};
use crate::error::NotifyError;
use crate::log_entry::{LogEntry, LogLevel, Metadata};
use crate::throttle::ThrottleCache;
use chrono::{DateTime, SecondsFormat, Utc};
use log::debug;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

pub const DEFAULT_THROTTLE_WINDOW: Duration = Duration::from_millis(3000);
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct ErrorReporter {
    inner: Arc<Inner>,
}

struct Inner {
    cache: Mutex<ThrottleCache>,
    console: Box<dyn ConsoleSink>,
    fail_fast_on_error: bool,
    sweep_interval: Duration,
}

impl ErrorReporter {
    pub fn new(console: impl ConsoleSink + 'static, fail_fast_on_error: bool) -> Self {
        Self::with_timing(
            console,
            fail_fast_on_error,
            DEFAULT_THROTTLE_WINDOW,
            DEFAULT_SWEEP_INTERVAL,
        )
    }

    pub fn with_timing(
        console: impl ConsoleSink + 'static,
        fail_fast_on_error: bool,
        throttle_window: Duration,
        sweep_interval: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                cache: Mutex::new(ThrottleCache::new(throttle_window)),
                console: Box::new(console),
                fail_fast_on_error,
                sweep_interval,
            }),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::with_timing(
            LogConsole,
            config.fail_fast_on_error,
            config.throttle_window(),
            config.sweep_interval(),
        )
    }

    pub fn report(
        &self,
        context: &str,
        message: &str,
        metadata: Metadata,
        level: &str,
    ) -> Result<LogEntry, NotifyError> {
        self.report_at(context, message, metadata, level, Utc::now())
    }

    /// Like [`report`](Self::report) with an explicit clock reading.
    ///
    /// Returns `Err(NotifyError::FailFast)` for error-level reports when
    /// fail-fast mode is on, after the entry has been emitted.
    pub fn report_at(
        &self,
        context: &str,
        message: &str,
        metadata: Metadata,
        level: &str,
        now: DateTime<Utc>,
    ) -> Result<LogEntry, NotifyError> {
        let level = LogLevel::normalize(level);
        let entry = LogEntry {
            context: context.to_string(),
            message: message.to_string(),
            metadata: metadata.into_fields(),
            level,
            timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        };

        let key = ThrottleCache::key(context, level.as_str(), message);
        if self.cache().try_acquire(&key, now) {
            let channel = if self.inner.console.supports(level) {
                level
            } else {
                LogLevel::Warn
            };
            self.inner
                .console
                .emit(channel, &entry.console_line(), &entry.metadata);
        }

        if self.inner.fail_fast_on_error && level == LogLevel::Error {
            return Err(NotifyError::FailFast(entry.formatted_message()));
        }

        Ok(entry)
    }

    /// Drops throttle entries older than twice the window.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        self.cache().purge_expired(now)
    }

    pub fn is_throttled(&self, context: &str, level: LogLevel, message: &str) -> bool {
        self.cache()
            .contains(&ThrottleCache::key(context, level.as_str(), message))
    }

    pub fn cached_keys(&self) -> usize {
        self.cache().len()
    }

    /// Starts the periodic cache sweep on the current tokio runtime.
    pub fn spawn_sweeper(&self) -> SweepHandle {
        let reporter = self.clone();
        let period = self.inner.sweep_interval;

        let task = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // First tick completes immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let purged = reporter.purge_expired(Utc::now());
                if purged > 0 {
                    debug!("Purged {} throttle entries", purged);
                }
            }
        });

        SweepHandle { task }
    }

    fn cache(&self) -> MutexGuard<'_, ThrottleCache> {
        self.inner
            .cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new(LogConsole, false)
    }
}

/// Running sweep task. Dropping the handle stops the sweep.
#[derive(Debug)]
pub struct SweepHandle {
    task: JoinHandle<()>,
}

impl SweepHandle {
    pub fn stop(self) {
        self.task.abort();
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for SweepHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
