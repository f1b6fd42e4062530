// Shared transport configuration and per-call scoping.
//
// Both the Enlighten and Tomorrow.io clients build their `reqwest::Client`
// through `TransportConfig`, and wrap every request in a `CallScope` so a
// timeout or a cancellation drops the in-flight request future.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::Error;

/// Timeout applied to each HTTP call unless the caller picks another one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: concat!("gridlet/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` that follows redirects.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        self.builder()
            .build()
            .map_err(|e| Error::ClientSetup(format!("failed to build HTTP client: {e}")))
    }

    /// Build a `reqwest::Client` that hands 3xx responses back to the caller.
    ///
    /// The login POST needs the raw 302 to read `Location` and `Set-Cookie`.
    pub fn build_manual_redirect_client(&self) -> Result<reqwest::Client, Error> {
        self.builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| Error::ClientSetup(format!("failed to build HTTP client: {e}")))
    }

    /// A call scope using this config's timeout and no cancellation token.
    pub fn scope(&self) -> CallScope {
        CallScope::new(self.timeout)
    }

    // No client-level timeout: `CallScope` owns the deadline.
    fn builder(&self) -> reqwest::ClientBuilder {
        reqwest::Client::builder().user_agent(self.user_agent.as_str())
    }
}

/// Deadline and optional cancellation signal for a single HTTP call.
///
/// The wrapped future owns the request; when the deadline fires or the
/// token is cancelled the future is dropped, which aborts the request and
/// releases the timer on every exit path.
#[derive(Debug, Clone)]
pub struct CallScope {
    timeout: Duration,
    cancel: Option<CancellationToken>,
}

impl Default for CallScope {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl CallScope {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            cancel: None,
        }
    }

    /// Honor `token` in addition to the deadline.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Drive `fut` to completion inside this scope.
    pub async fn run<T, F>(&self, fut: F) -> Result<T, Error>
    where
        F: Future<Output = Result<T, Error>>,
    {
        let bounded = tokio::time::timeout(self.timeout, fut);

        let result = match &self.cancel {
            Some(token) => {
                tokio::select! {
                    biased;
                    () = token.cancelled() => {
                        debug!("request cancelled");
                        return Err(Error::Cancelled);
                    }
                    res = bounded => res,
                }
            }
            None => bounded.await,
        };

        result.map_err(|_| {
            debug!(timeout = ?self.timeout, "request timed out");
            Error::Timeout {
                timeout_secs: self.timeout.as_secs(),
            }
        })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn times_out_slow_calls() {
        let scope = CallScope::new(Duration::from_secs(10));
        let result: Result<(), Error> = scope
            .run(async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            })
            .await;

        assert!(matches!(result, Err(Error::Timeout { timeout_secs: 10 })));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_wins_over_pending_call() {
        let token = CancellationToken::new();
        token.cancel();
        let scope = CallScope::new(Duration::from_secs(10)).with_cancellation(token);

        let result: Result<(), Error> = scope
            .run(async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                Ok(())
            })
            .await;

        assert!(matches!(result, Err(Error::Cancelled)));
    }

    #[tokio::test]
    async fn passes_through_completed_calls() {
        let scope = CallScope::default().with_cancellation(CancellationToken::new());
        let value = scope.run(async { Ok::<_, Error>(42) }).await;
        assert!(matches!(value, Ok(42)));
    }
}
