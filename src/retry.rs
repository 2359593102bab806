//! Bounded fixed-wait retry
//!
//! Every remote or storage call in the harvester goes through a [`RetryPolicy`].
//! The policy owns only the attempt budget and the wait between attempts; the
//! caller decides which errors are transient by passing a predicate, so one
//! combinator serves the provider, embedding and storage layers alike.
//!
//! | Layer | Attempts | Wait |
//! |-------|----------|------|
//! | Storage access | 20 | 200ms |
//! | Embedding calls | 10 | 1s |
//! | Provider calls | 5 | 2s |

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Attempt budget and fixed wait for one class of operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,

    /// Pause between consecutive attempts
    pub wait: Duration,
}

impl RetryPolicy {
    /// Creates a policy; a zero attempt budget is treated as a single attempt
    pub const fn new(max_attempts: u32, wait: Duration) -> Self {
        let max_attempts = if max_attempts == 0 { 1 } else { max_attempts };
        Self { max_attempts, wait }
    }

    /// Policy for checkpoint and blob storage access
    pub const fn storage() -> Self {
        Self::new(20, Duration::from_millis(200))
    }

    /// Policy for embedding API calls
    pub const fn embedding() -> Self {
        Self::new(10, Duration::from_secs(1))
    }

    /// Policy for provider network calls
    pub const fn provider() -> Self {
        Self::new(5, Duration::from_secs(2))
    }

    /// Runs an async operation under this policy
    ///
    /// The operation is invoked until it succeeds, fails with an error for
    /// which `is_transient` returns false, or has been attempted
    /// `max_attempts` times. Between transient failures the task sleeps for
    /// `wait`. The last error is returned unchanged.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use attraction_harvester::RetryPolicy;
    ///
    /// # async fn example(client: reqwest::Client) -> Result<(), reqwest::Error> {
    /// let body = RetryPolicy::provider()
    ///     .run(
    ///         |err: &reqwest::Error| err.is_timeout(),
    ///         || async { client.get("https://example.com").send().await?.text().await },
    ///     )
    ///     .await?;
    /// # let _ = body;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn run<T, E, F, Fut, P>(&self, is_transient: P, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
        E: Display,
    {
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) if attempt < self.max_attempts && is_transient(&err) => {
                    tracing::debug!(
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %err,
                        "Transient failure, retrying in {:?}",
                        self.wait
                    );
                    tokio::time::sleep(self.wait).await;
                    attempt += 1;
                }
                Err(err) => {
                    if attempt > 1 {
                        tracing::warn!(attempt, error = %err, "Giving up after {} attempts", attempt);
                    }
                    return Err(err);
                }
            }
        }
    }

    /// Runs a synchronous operation under this policy
    ///
    /// Same contract as [`RetryPolicy::run`], sleeping the current thread.
    /// Used for checkpoint persistence; async callers move it onto the
    /// blocking pool.
    pub fn run_blocking<T, E, F, P>(&self, is_transient: P, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Result<T, E>,
        P: Fn(&E) -> bool,
        E: Display,
    {
        let mut attempt = 1;
        loop {
            match operation() {
                Ok(value) => return Ok(value),
                Err(err) if attempt < self.max_attempts && is_transient(&err) => {
                    tracing::debug!(
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %err,
                        "Transient storage failure, retrying in {:?}",
                        self.wait
                    );
                    std::thread::sleep(self.wait);
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// Returns true for I/O errors that a storage retry can plausibly clear
pub fn is_transient_io(err: &std::io::Error) -> bool {
    use std::io::ErrorKind;
    matches!(
        err.kind(),
        ErrorKind::Interrupted | ErrorKind::TimedOut | ErrorKind::WouldBlock
    )
}
