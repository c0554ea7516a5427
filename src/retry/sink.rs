//! Where retry notices go.

use std::borrow::Cow;

/// Receives a debug message each time a conflicting unit of work is replayed.
pub trait RetryLogger: Send + Sync {
  fn debug(&self, message: &str, attempt: usize);
}

impl<F> RetryLogger for F
where
  F: Fn(&str, usize) + Send + Sync,
{
  fn debug(&self, message: &str, attempt: usize) {
    self(message, attempt)
  }
}

/// Forwards retry notices to the `log` facade at debug level.
#[derive(Debug, Clone)]
pub struct LogTarget(pub Cow<'static, str>);

impl LogTarget {
  pub fn new(target: impl Into<Cow<'static, str>>) -> Self {
    Self(target.into())
  }
}

impl Default for LogTarget {
  fn default() -> Self {
    Self(Cow::Borrowed(module_path!()))
  }
}

impl RetryLogger for LogTarget {
  fn debug(&self, message: &str, attempt: usize) {
    log::debug!(target: self.0.as_ref(), "[{}] {}", attempt, message);
  }
}
