//! Resilient file reading
//!
//! Conversation files live on local disk but can still fail transiently
//! (editor mid-write, network home dirs, antivirus locks). Reads are
//! retried with exponential backoff; exhausted retries surface as
//! ReadFailed carrying the last cause. A separate deadline helper races
//! any read-and-parse future against a timer so the serving path degrades
//! to an empty result instead of blocking on genuinely slow storage.

use std::future::Future;
use std::path::Path;
use std::time::Duration;

use tokio::time::{sleep, timeout};

use crate::config::ReaderConfig;
use crate::error::{Result, StoreError};

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &ReaderConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.retry_base_delay_ms),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
        }
    }
}

/// Read a file's full contents, retrying on any failure with exponential
/// backoff (base, 2x base, 4x base, ...).
pub async fn read_with_retry(path: &Path, policy: RetryPolicy) -> Result<String> {
    let mut delay = policy.base_delay;
    let mut last_err = None;

    for attempt in 0..policy.max_attempts {
        if attempt > 0 {
            sleep(delay).await;
            delay *= 2;
        }
        match tokio::fs::read_to_string(path).await {
            Ok(text) => return Ok(text),
            Err(e) => last_err = Some(e),
        }
    }

    Err(StoreError::ReadFailed {
        path: path.to_path_buf(),
        attempts: policy.max_attempts,
        source: last_err
            .unwrap_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, "no attempt made")),
    })
}

/// Race a read-and-parse future against a deadline. On expiry the
/// underlying future is dropped and Timeout is returned; the caller
/// decides whether to surface it or degrade.
pub async fn with_deadline<T, F>(path: &Path, limit: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout {
            path: path.to_path_buf(),
            timeout_ms: limit.as_millis() as u64,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn test_read_existing_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"[1,2,3]").unwrap();
        file.flush().unwrap();

        let text = read_with_retry(file.path(), fast_policy()).await.unwrap();
        assert_eq!(text, "[1,2,3]");
    }

    #[tokio::test]
    async fn test_exhausted_retries_surface_read_failed() {
        let missing = PathBuf::from("/nonexistent/colloquy/conversation.json");
        match read_with_retry(&missing, fast_policy()).await {
            Err(StoreError::ReadFailed { attempts, path, .. }) => {
                assert_eq!(attempts, 3);
                assert_eq!(path, missing);
            }
            other => panic!("expected ReadFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_deadline_expiry_returns_timeout() {
        let path = PathBuf::from("/slow/disk/file.json");
        let slow = async {
            sleep(Duration::from_millis(200)).await;
            Ok(42)
        };
        match with_deadline(&path, Duration::from_millis(20), slow).await {
            Err(StoreError::Timeout { timeout_ms, .. }) => assert_eq!(timeout_ms, 20),
            other => panic!("expected Timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_deadline_passes_through_fast_results() {
        let path = PathBuf::from("/fast/file.json");
        let result = with_deadline(&path, Duration::from_millis(200), async { Ok(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }
}
