//! Retry budget and backoff.

use super::sink::RetryLogger;
use once_cell::sync::Lazy;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

/// Retries granted to a unit of work when nothing else is configured.
pub const DEFAULT_MAX_CONFLICT_RETRIES: usize = 3;

/// Pause between a conflict and the next attempt.
pub const RETRY_DELAY: Duration = Duration::from_millis(100);

/// Environment variable that overrides [`DEFAULT_MAX_CONFLICT_RETRIES`] for the
/// whole process. Read once, on first use.
pub const MAX_CONFLICT_RETRIES_ENV: &str = "TXSCOPE_MAX_CONFLICT_RETRIES";

static DEFAULT_MAX_RETRIES: Lazy<usize> = Lazy::new(|| {
  parse_max_retries(std::env::var(MAX_CONFLICT_RETRIES_ENV).ok().as_deref())
});

fn parse_max_retries(raw: Option<&str>) -> usize {
  match raw {
    None => DEFAULT_MAX_CONFLICT_RETRIES,
    Some(value) => value.trim().parse().unwrap_or_else(|_| {
      log::warn!(
        "Ignoring {}={:?}: not a non-negative integer. Using {}.",
        MAX_CONFLICT_RETRIES_ENV,
        value,
        DEFAULT_MAX_CONFLICT_RETRIES
      );
      DEFAULT_MAX_CONFLICT_RETRIES
    }),
  }
}

/// The process-wide default retry budget.
pub fn default_max_retries() -> usize {
  *DEFAULT_MAX_RETRIES
}

/// How many times, and how patiently, a conflicting unit of work is replayed.
///
/// `max_retries` counts replays, so a unit of work runs at most
/// `max_retries + 1` times.
#[derive(Clone)]
pub struct RetryPolicy {
  pub max_retries: usize,
  pub delay: Duration,
  pub logger: Option<Arc<dyn RetryLogger>>,
}

impl Debug for RetryPolicy {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("RetryPolicy")
      .field("max_retries", &self.max_retries)
      .field("delay", &self.delay)
      .field("logger_is_some", &self.logger.is_some())
      .finish()
  }
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self {
      max_retries: default_max_retries(),
      delay: RETRY_DELAY,
      logger: None,
    }
  }
}

impl RetryPolicy {
  pub fn new(max_retries: usize) -> Self {
    Self {
      max_retries,
      ..Default::default()
    }
  }

  pub fn with_logger(mut self, logger: impl RetryLogger + 'static) -> Self {
    self.logger = Some(Arc::new(logger));
    self
  }

  pub fn with_delay(mut self, delay: Duration) -> Self {
    self.delay = delay;
    self
  }
}
