// src/utils/retry.rs
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// What to do with a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Wait this long, then run the next attempt.
    Retry(Duration),
    /// Terminal failure; give up without another attempt.
    Halt,
}

/// How a bounded retry loop ultimately failed.
#[derive(Debug)]
pub enum RetryFailure<E> {
    /// The classifier returned [`RetryDecision::Halt`].
    Halted { error: E, attempts: u32 },
    /// The attempt budget ran out; `last_error` is from the final attempt.
    Exhausted { last_error: E, attempts: u32 },
}

/// Runs `op` up to `max_retries + 1` times, sleeping between attempts as
/// directed by `classify`.
///
/// `op` receives the 1-based attempt number. `sleep` is injectable so tests
/// can record waits instead of actually waiting. The same loop shape recurs
/// around every flaky remote call in this crate; keep new call sites on this
/// utility instead of open-coding the loop.
pub async fn retry_with_backoff<T, E, Op, OpFut, Cl, Sl, SlFut>(
    max_retries: u32,
    mut op: Op,
    classify: Cl,
    sleep: Sl,
) -> Result<T, RetryFailure<E>>
where
    E: Display,
    Op: FnMut(u32) -> OpFut,
    OpFut: Future<Output = Result<T, E>>,
    Cl: Fn(&E, u32) -> RetryDecision,
    Sl: Fn(Duration) -> SlFut,
    SlFut: Future<Output = ()>,
{
    let total_attempts = max_retries + 1;
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        let error = match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(error) => error,
        };

        match classify(&error, attempt) {
            RetryDecision::Halt => {
                tracing::warn!("Attempt {} failed terminally: {}", attempt, error);
                return Err(RetryFailure::Halted {
                    error,
                    attempts: attempt,
                });
            }
            RetryDecision::Retry(wait) => {
                if attempt >= total_attempts {
                    tracing::warn!(
                        "Attempt {}/{} failed, retry budget exhausted: {}",
                        attempt,
                        total_attempts,
                        error
                    );
                    return Err(RetryFailure::Exhausted {
                        last_error: error,
                        attempts: attempt,
                    });
                }
                tracing::info!(
                    "Attempt {}/{} failed ({}), retrying in {:?}",
                    attempt,
                    total_attempts,
                    error,
                    wait
                );
                sleep(wait).await;
            }
        }
    }
}

// --- Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    #[derive(Debug)]
    struct TestError(&'static str);

    impl Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{}", self.0)
        }
    }

    fn recorded_sleep(log: &RefCell<Vec<Duration>>) -> impl Fn(Duration) -> std::future::Ready<()> + '_ {
        move |wait| {
            log.borrow_mut().push(wait);
            std::future::ready(())
        }
    }

    #[test]
    fn returns_first_success_without_sleeping() {
        let sleeps = RefCell::new(Vec::new());
        let result: Result<u32, RetryFailure<TestError>> = tokio_test::block_on(retry_with_backoff(
            2,
            |_attempt| std::future::ready(Ok(7u32)),
            |_e: &TestError, _a| RetryDecision::Retry(Duration::from_secs(1)),
            recorded_sleep(&sleeps),
        ));
        assert_eq!(result.unwrap(), 7);
        assert!(sleeps.borrow().is_empty());
    }

    #[test]
    fn retries_with_classified_waits_then_succeeds() {
        let sleeps = RefCell::new(Vec::new());
        let calls = Cell::new(0u32);
        let result: Result<&str, RetryFailure<TestError>> = tokio_test::block_on(retry_with_backoff(
            2,
            |attempt| {
                calls.set(calls.get() + 1);
                std::future::ready(if attempt < 3 { Err(TestError("flaky")) } else { Ok("done") })
            },
            |_e, attempt| RetryDecision::Retry(Duration::from_secs(u64::from(attempt) * 10)),
            recorded_sleep(&sleeps),
        ));
        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.get(), 3);
        assert_eq!(
            *sleeps.borrow(),
            vec![Duration::from_secs(10), Duration::from_secs(20)]
        );
    }

    #[test]
    fn halts_immediately_on_terminal_classification() {
        let sleeps = RefCell::new(Vec::new());
        let calls = Cell::new(0u32);
        let result: Result<(), RetryFailure<TestError>> = tokio_test::block_on(retry_with_backoff(
            5,
            |_attempt| {
                calls.set(calls.get() + 1);
                std::future::ready(Err(TestError("terminal")))
            },
            |_e: &TestError, _a| RetryDecision::Halt,
            recorded_sleep(&sleeps),
        ));
        match result {
            Err(RetryFailure::Halted { attempts, .. }) => assert_eq!(attempts, 1),
            other => panic!("expected Halted, got {other:?}"),
        }
        assert_eq!(calls.get(), 1);
        assert!(sleeps.borrow().is_empty());
    }

    #[test]
    fn exhausts_after_max_retries_plus_one_attempts() {
        let sleeps = RefCell::new(Vec::new());
        let calls = Cell::new(0u32);
        let result: Result<(), RetryFailure<TestError>> = tokio_test::block_on(retry_with_backoff(
            2,
            |_attempt| {
                calls.set(calls.get() + 1);
                std::future::ready(Err(TestError("always fails")))
            },
            |_e: &TestError, _a| RetryDecision::Retry(Duration::from_secs(1)),
            recorded_sleep(&sleeps),
        ));
        match result {
            Err(RetryFailure::Exhausted { attempts, .. }) => assert_eq!(attempts, 3),
            other => panic!("expected Exhausted, got {other:?}"),
        }
        assert_eq!(calls.get(), 3);
        // No sleep after the final attempt.
        assert_eq!(sleeps.borrow().len(), 2);
    }

    #[test]
    fn zero_retries_means_a_single_attempt() {
        let calls = Cell::new(0u32);
        let result: Result<(), RetryFailure<TestError>> = tokio_test::block_on(retry_with_backoff(
            0,
            |_attempt| {
                calls.set(calls.get() + 1);
                std::future::ready(Err(TestError("nope")))
            },
            |_e: &TestError, _a| RetryDecision::Retry(Duration::from_secs(1)),
            |_wait| std::future::ready(()),
        ));
        assert!(matches!(result, Err(RetryFailure::Exhausted { attempts: 1, .. })));
        assert_eq!(calls.get(), 1);
    }
}
