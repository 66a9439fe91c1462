use crate::error::{CueError, ErrorKind};

pub const MAX_RETRY_ATTEMPTS: u32 = 3;

/// User-facing account of a failed action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureNotice {
    pub message: String,
    pub kind: ErrorKind,
    /// Consecutive failures of the same action, starting at 1
    pub attempt: u32,
    pub can_retry: bool,
}

impl FailureNotice {
    /// A failure that is never offered for retry.
    pub fn terminal(context: &str, error: &CueError) -> Self {
        Self {
            message: format!("{context}: {error}"),
            kind: error.kind(),
            attempt: 1,
            can_retry: false,
        }
    }
}

/// Counts consecutive failures of one action and decides whether another
/// attempt is offered.
///
/// Only retryable errors are offered again, and never after the
/// [`MAX_RETRY_ATTEMPTS`]th failure. A failure of a different action starts
/// the count over.
#[derive(Debug)]
pub struct RetryCounter<A> {
    attempts: u32,
    last: Option<A>,
    offered: bool,
}

impl<A> Default for RetryCounter<A> {
    fn default() -> Self {
        Self {
            attempts: 0,
            last: None,
            offered: false,
        }
    }
}

impl<A: Clone + PartialEq> RetryCounter<A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_failure(&mut self, action: A, context: &str, error: &CueError) -> FailureNotice {
        if self.last.as_ref() != Some(&action) {
            self.attempts = 0;
        }
        self.attempts += 1;
        self.offered = error.is_retryable() && self.attempts < MAX_RETRY_ATTEMPTS;
        self.last = Some(action);

        let mut message = format!("{context}: {error}");
        if self.attempts > 1 {
            message.push_str(&format!(
                " (attempt {} of {MAX_RETRY_ATTEMPTS})",
                self.attempts
            ));
        }
        FailureNotice {
            message,
            kind: error.kind(),
            attempt: self.attempts,
            can_retry: self.offered,
        }
    }

    pub fn record_success(&mut self) {
        *self = Self::default();
    }

    /// The action to run again, if a retry is on offer. Taking it withdraws
    /// the offer until the next failure.
    pub fn take_retry(&mut self) -> Option<A> {
        if std::mem::take(&mut self.offered) {
            self.last.clone()
        } else {
            None
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline() -> CueError {
        CueError::Network("connection refused".into())
    }

    #[test]
    fn retry_stops_after_three_failures() {
        let mut counter = RetryCounter::new();
        let first = counter.record_failure("load", "Could not load", &offline());
        assert!(first.can_retry);
        assert_eq!(first.attempt, 1);
        assert_eq!(counter.take_retry(), Some("load"));

        let second = counter.record_failure("load", "Could not load", &offline());
        assert!(second.can_retry);
        assert!(second.message.ends_with("(attempt 2 of 3)"));
        assert_eq!(counter.take_retry(), Some("load"));

        let third = counter.record_failure("load", "Could not load", &offline());
        assert!(!third.can_retry);
        assert_eq!(third.attempt, 3);
        assert_eq!(counter.take_retry(), None);
    }

    #[test]
    fn terminal_errors_are_not_offered() {
        let mut counter = RetryCounter::new();
        let notice = counter.record_failure(
            "load",
            "Could not load",
            &CueError::NotFound("show 1".into()),
        );
        assert!(!notice.can_retry);
        assert_eq!(notice.kind, ErrorKind::NotFound);
        assert_eq!(counter.take_retry(), None);
    }

    #[test]
    fn success_and_new_actions_reset_the_count() {
        let mut counter = RetryCounter::new();
        counter.record_failure("load", "x", &offline());
        counter.record_failure("load", "x", &offline());
        counter.record_success();
        assert_eq!(counter.attempts(), 0);

        counter.record_failure("load", "x", &offline());
        let notice = counter.record_failure("search", "x", &offline());
        assert_eq!(notice.attempt, 1);
    }
}
