use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::Error;

/// Bounded retry for API errors carrying the transient classification.
///
/// Every other failure, including transport errors, is returned at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub retries: u32,
    /// Pause before each retry; zero means none.
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(retries: u32, delay: Duration) -> Self {
        Self { retries, delay }
    }

    /// Run `fetch`, retrying it while it fails with a transient API error.
    ///
    /// `fetch` is called at most `retries + 1` times. The error from the last
    /// attempt is returned whatever its classification.
    pub fn run<T, F>(&self, mut fetch: F) -> Result<T, Error>
    where
        F: FnMut() -> Result<T, Error>,
    {
        let err = match fetch() {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        let Some(api_error) = err.as_api() else {
            return Err(err);
        };
        warn!(code = %api_error.code, "Caught API error: {}", api_error);
        if !api_error.is_transient() || self.retries == 0 {
            return Err(err);
        }

        warn!(
            retries = self.retries,
            "Request resulted in a transient error, trying again"
        );
        for attempt in 1..=self.retries {
            debug!("Attempt {} (of {})", attempt, self.retries);
            if !self.delay.is_zero() {
                debug!(delay = ?self.delay, "Sleeping before retrying");
                thread::sleep(self.delay);
            }
            match fetch() {
                Ok(value) => return Ok(value),
                Err(Error::Api(ref e)) if e.is_transient() && attempt < self.retries => {}
                Err(err) => return Err(err),
            }
        }

        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use std::cell::Cell;
    use std::time::Instant;

    fn transient() -> Error {
        ApiError::from_result(
            serde_json::json!({"error": {"message": "temporarily unavailable", "code": 2}}),
            Some(500),
        )
        .into()
    }

    fn fatal() -> Error {
        ApiError::from_result(
            serde_json::json!({"error": {"message": "permission denied", "code": 200}}),
            Some(403),
        )
        .into()
    }

    #[test]
    fn success_returns_without_retrying() {
        let calls = Cell::new(0);
        let result = RetryPolicy::new(3, Duration::ZERO).run(|| {
            calls.set(calls.get() + 1);
            Ok::<_, Error>(7)
        });
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn transient_errors_are_retried_exactly_n_times() {
        for retries in [1, 2, 5] {
            let calls = Cell::new(0);
            let err = RetryPolicy::new(retries, Duration::ZERO)
                .run(|| {
                    calls.set(calls.get() + 1);
                    Err::<(), _>(transient())
                })
                .unwrap_err();
            assert!(err.as_api().unwrap().is_transient());
            assert_eq!(calls.get(), retries + 1);
        }
    }

    #[test]
    fn zero_retries_means_one_attempt() {
        let calls = Cell::new(0);
        let err = RetryPolicy::default()
            .run(|| {
                calls.set(calls.get() + 1);
                Err::<(), _>(transient())
            })
            .unwrap_err();
        assert!(err.as_api().is_some());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn fatal_errors_are_not_retried() {
        let calls = Cell::new(0);
        let err = RetryPolicy::new(3, Duration::ZERO)
            .run(|| {
                calls.set(calls.get() + 1);
                Err::<(), _>(fatal())
            })
            .unwrap_err();
        assert_eq!(err.as_api().unwrap().message, "permission denied");
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn transport_errors_are_not_retried() {
        let calls = Cell::new(0);
        let err = RetryPolicy::new(3, Duration::ZERO)
            .run(|| {
                calls.set(calls.get() + 1);
                Err::<(), _>(Error::Transport {
                    message: "connection reset".to_string(),
                })
            })
            .unwrap_err();
        assert!(matches!(err, Error::Transport { .. }));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn recovers_when_a_retry_succeeds() {
        let calls = Cell::new(0);
        let result = RetryPolicy::new(3, Duration::ZERO).run(|| {
            calls.set(calls.get() + 1);
            if calls.get() < 3 {
                Err(transient())
            } else {
                Ok("done")
            }
        });
        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn fatal_error_during_retries_stops_immediately() {
        let calls = Cell::new(0);
        let err = RetryPolicy::new(5, Duration::ZERO)
            .run(|| {
                calls.set(calls.get() + 1);
                if calls.get() == 1 {
                    Err::<(), _>(transient())
                } else {
                    Err(fatal())
                }
            })
            .unwrap_err();
        assert!(!err.as_api().unwrap().is_transient());
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn sleeps_before_each_retry() {
        let delay = Duration::from_millis(20);
        let start = Instant::now();
        let _ = RetryPolicy::new(2, delay).run(|| Err::<(), _>(transient()));
        assert!(start.elapsed() >= delay * 2);
    }
}
