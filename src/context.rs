//! Per-operation deadlines.
//!
//! Every service operation takes a [`Deadline`]. When it passes, the
//! in-flight storage call is dropped and the caller gets
//! [`AppError::DeadlineExceeded`], distinct from any domain error.

use crate::error::AppError;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Deadline {
    at: Option<Instant>,
}

impl Deadline {
    /// No deadline; the operation runs to completion.
    pub fn none() -> Self {
        Self { at: None }
    }

    pub fn after(timeout: Duration) -> Self {
        Self {
            at: Some(Instant::now() + timeout),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.at.is_some_and(|at| Instant::now() >= at)
    }

    /// Drive `fut` to completion or abort it once the deadline passes.
    pub async fn run<T, F>(&self, operation: &str, fut: F) -> Result<T, AppError>
    where
        F: Future<Output = Result<T, AppError>>,
    {
        match self.at {
            None => fut.await,
            Some(at) => match tokio::time::timeout_at(at, fut).await {
                Ok(result) => result,
                Err(_) => {
                    log::warn!("[deadline] {} aborted after deadline", operation);
                    Err(AppError::deadline_exceeded(operation))
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_no_deadline_runs_to_completion() {
        let result = Deadline::none()
            .run("noop", async {
                tokio::time::sleep(Duration::from_millis(5)).await;
                Ok::<_, AppError>(7)
            })
            .await;
        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_expired_deadline_aborts() {
        let result = Deadline::after(Duration::from_millis(1))
            .run("slow", async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<_, AppError>(())
            })
            .await;

        match result {
            Err(AppError::DeadlineExceeded { operation }) => assert_eq!(operation, "slow"),
            other => panic!("expected deadline error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_domain_error_passes_through() {
        let result: Result<(), AppError> = Deadline::after(Duration::from_secs(5))
            .run("fails", async { Err(AppError::no_candidate("core")) })
            .await;
        assert!(matches!(result, Err(AppError::NoCandidate { .. })));
    }

    #[test]
    fn test_is_expired() {
        assert!(!Deadline::none().is_expired());
        assert!(!Deadline::after(Duration::from_secs(60)).is_expired());
    }
}
