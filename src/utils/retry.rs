use std::future::Future;
use std::time::{Duration, Instant};

use crate::utils::error::{DwvError, Result};

/// Re-runs a fallible async operation until it succeeds, a maximum attempt
/// count is reached, or a total time limit elapses. Attempts are separated by
/// a fixed delay.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_tries: Option<u32>,
    pub time_limit: Option<Duration>,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_tries: None,
            time_limit: Some(Duration::from_secs(600)),
            delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let started = Instant::now();
        let mut attempts: u32 = 0;

        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    attempts += 1;
                    tracing::debug!("attempt {} failed: {}", attempts, e);

                    if self.max_tries.is_some_and(|max| attempts >= max) {
                        return Err(DwvError::RetriesExhausted {
                            attempts,
                            last_error: e.to_string(),
                        });
                    }
                    if self
                        .time_limit
                        .is_some_and(|limit| started.elapsed() >= limit)
                    {
                        return Err(DwvError::RetriesExhausted {
                            attempts,
                            last_error: e.to_string(),
                        });
                    }

                    tokio::time::sleep(self.delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_tries: Some(3),
            time_limit: None,
            delay: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn test_succeeds_after_failures() {
        let calls = AtomicU32::new(0);
        let result = policy()
            .run(|| async {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(DwvError::IngestError {
                        message: "not yet".to_string(),
                    })
                } else {
                    Ok(42)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhausts_max_tries() {
        let result: Result<()> = policy()
            .run(|| async {
                Err(DwvError::IngestError {
                    message: "always".to_string(),
                })
            })
            .await;

        match result {
            Err(DwvError::RetriesExhausted {
                attempts,
                last_error,
            }) => {
                assert_eq!(attempts, 3);
                assert!(last_error.contains("always"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_time_limit_expires() {
        let policy = RetryPolicy {
            max_tries: None,
            time_limit: Some(Duration::from_millis(10)),
            delay: Duration::from_millis(5),
        };
        let result: Result<()> = policy
            .run(|| async {
                Err(DwvError::IngestError {
                    message: "slow".to_string(),
                })
            })
            .await;

        assert!(matches!(result, Err(DwvError::RetriesExhausted { .. })));
    }
}
