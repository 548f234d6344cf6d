//! Retry logic with exponential backoff and jitter.

use std::time::Duration;

use tracing::warn;

use crate::http_client::{HttpClient, HttpError, HttpFuture, HttpRequest};

/// Backoff strategy for retrying failed requests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    /// Uses a fixed delay between retries.
    Fixed {
        /// Delay between retries.
        delay: Duration,
    },
    /// Uses an exponential delay between retries.
    ///
    /// The delay is calculated as `base * (factor ^ attempt)`.
    Exponential {
        /// The initial backoff duration.
        base: Duration,
        /// The multiplicative factor for each subsequent retry.
        factor: f64,
        /// The maximum duration to wait between retries.
        max: Duration,
        /// Whether to apply random jitter (+/- 50%) to the delay.
        jitter: bool,
    },
}

impl Default for Backoff {
    fn default() -> Self {
        Self::Exponential {
            base: Duration::from_millis(250),
            factor: 2.0,
            max: Duration::from_secs(4),
            jitter: true,
        }
    }
}

impl Backoff {
    /// Delay before retry number `attempt` (0-based).
    pub fn delay(self, attempt: u32) -> Duration {
        match self {
            Self::Fixed { delay } => delay,
            Self::Exponential {
                base,
                factor,
                max,
                jitter,
            } => {
                let scale = factor.powi(attempt as i32);
                let capped_seconds = (base.as_secs_f64() * scale).min(max.as_secs_f64());
                let delay = Duration::from_secs_f64(capped_seconds);

                if !jitter {
                    return delay;
                }

                let jitter_ms = (delay.as_millis() as f64 * 0.5) as u64;
                let random_offset = fastrand::u64(0..=(jitter_ms * 2));
                let total_ms = delay.as_millis() as i64 + (random_offset as i64 - jitter_ms as i64);
                Duration::from_millis(total_ms.max(0) as u64)
            }
        }
    }
}

/// Configuration for automatic retries of HTTP calls.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    pub enabled: bool,
    /// Total attempts = `max_retries + 1`.
    pub max_retries: u32,
    pub backoff: Backoff,
    pub retry_on_status: Vec<u16>,
    pub retry_on_timeout: bool,
    pub retry_on_connect: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_retries: 3,
            backoff: Backoff::default(),
            retry_on_status: vec![408, 429, 500, 502, 503, 504],
            retry_on_timeout: true,
            retry_on_connect: true,
        }
    }
}

impl RetryConfig {
    pub fn exponential(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    pub fn fixed(delay: Duration, max_retries: u32) -> Self {
        Self {
            max_retries,
            backoff: Backoff::Fixed { delay },
            ..Self::default()
        }
    }

    pub fn no_retry() -> Self {
        Self {
            enabled: false,
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn should_retry_status(&self, status: u16) -> bool {
        self.retry_on_status.contains(&status)
    }

    pub fn should_retry_error(&self, error: &HttpError) -> bool {
        (error.is_timeout() && self.retry_on_timeout) || (error.is_connect() && self.retry_on_connect)
    }

    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.backoff.delay(attempt)
    }
}

/// Wraps a transport and re-issues requests that fail with a retryable
/// status or transport error.
#[derive(Debug, Clone)]
pub struct RetryingHttpClient<C> {
    inner: C,
    config: RetryConfig,
}

impl<C: HttpClient> RetryingHttpClient<C> {
    pub fn new(inner: C, config: RetryConfig) -> Self {
        Self { inner, config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }
}

impl<C: HttpClient> HttpClient for RetryingHttpClient<C> {
    fn execute<'a>(&'a self, request: HttpRequest) -> HttpFuture<'a> {
        Box::pin(async move {
            let mut attempt = 0_u32;
            loop {
                let result = self.inner.execute(request.clone()).await;

                let retryable = match &result {
                    Ok(response) => self.config.should_retry_status(response.status),
                    Err(error) => self.config.should_retry_error(error),
                };
                if !self.config.enabled || !retryable || attempt >= self.config.max_retries {
                    return result;
                }

                let delay = self.config.delay_for_attempt(attempt);
                match &result {
                    Ok(response) => warn!(
                        url = %request.url,
                        status = response.status,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        "retrying request after retryable status"
                    ),
                    Err(error) => warn!(
                        url = %request.url,
                        error = %error,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        "retrying request after transport error"
                    ),
                }

                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_client::HttpResponse;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct ScriptedClient {
        responses: Mutex<VecDeque<Result<HttpResponse, HttpError>>>,
        calls: Mutex<u32>,
    }

    impl ScriptedClient {
        fn new(responses: Vec<Result<HttpResponse, HttpError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().expect("call counter lock")
        }
    }

    impl HttpClient for ScriptedClient {
        fn execute<'a>(&'a self, _request: HttpRequest) -> HttpFuture<'a> {
            *self.calls.lock().expect("call counter lock") += 1;
            let next = self
                .responses
                .lock()
                .expect("script lock")
                .pop_front()
                .unwrap_or_else(|| Ok(HttpResponse::ok_json("{}")));
            Box::pin(async move { next })
        }
    }

    fn instant_retries(max_retries: u32) -> RetryConfig {
        RetryConfig::fixed(Duration::ZERO, max_retries)
    }

    #[test]
    fn test_fixed_backoff() {
        let backoff = Backoff::Fixed {
            delay: Duration::from_millis(100),
        };

        assert_eq!(backoff.delay(0), Duration::from_millis(100));
        assert_eq!(backoff.delay(7), Duration::from_millis(100));
    }

    #[test]
    fn test_exponential_backoff_is_capped() {
        let backoff = Backoff::Exponential {
            base: Duration::from_millis(100),
            factor: 2.0,
            max: Duration::from_secs(1),
            jitter: false,
        };

        assert_eq!(backoff.delay(0), Duration::from_millis(100));
        assert_eq!(backoff.delay(2), Duration::from_millis(400));
        assert_eq!(backoff.delay(4), Duration::from_secs(1));
    }

    #[test]
    fn test_jitter_stays_within_half_of_the_delay() {
        let backoff = Backoff::Exponential {
            base: Duration::from_millis(100),
            factor: 2.0,
            max: Duration::from_secs(1),
            jitter: true,
        };

        for _ in 0..10 {
            for attempt in 0..4 {
                let expected = (100.0 * 2_f64.powi(attempt as i32)).min(1000.0);
                let delay_ms = backoff.delay(attempt).as_millis() as f64;
                assert!(delay_ms >= expected * 0.49, "attempt={attempt}, delay_ms={delay_ms}");
                assert!(delay_ms <= expected * 1.51, "attempt={attempt}, delay_ms={delay_ms}");
            }
        }
    }

    #[test]
    fn test_default_retry_config() {
        let config = RetryConfig::default();

        assert!(config.enabled);
        assert_eq!(config.max_retries, 3);
        assert!(config.should_retry_status(429));
        assert!(config.should_retry_status(503));
        assert!(!config.should_retry_status(401));
        assert!(!config.should_retry_status(404));
        assert!(config.should_retry_error(&HttpError::timeout("slow")));
        assert!(config.should_retry_error(&HttpError::connect("refused")));
    }

    #[tokio::test]
    async fn retries_retryable_status_until_success() {
        let client = RetryingHttpClient::new(
            ScriptedClient::new(vec![
                Ok(HttpResponse::new(503, "busy")),
                Ok(HttpResponse::new(429, "slow down")),
                Ok(HttpResponse::ok_json("{\"value\":[]}")),
            ]),
            instant_retries(3),
        );

        let response = client
            .execute(HttpRequest::get("https://tracker.test/teams"))
            .await
            .expect("eventually succeeds");

        assert_eq!(response.status, 200);
        assert_eq!(client.inner.calls(), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let client = RetryingHttpClient::new(
            ScriptedClient::new(vec![
                Err(HttpError::timeout("t1")),
                Err(HttpError::timeout("t2")),
                Err(HttpError::timeout("t3")),
            ]),
            instant_retries(2),
        );

        let error = client
            .execute(HttpRequest::get("https://tracker.test/teams"))
            .await
            .expect_err("all attempts time out");

        assert!(error.is_timeout());
        assert_eq!(client.inner.calls(), 3);
    }

    #[tokio::test]
    async fn does_not_retry_client_errors() {
        let client = RetryingHttpClient::new(
            ScriptedClient::new(vec![Ok(HttpResponse::new(401, "denied"))]),
            instant_retries(3),
        );

        let response = client
            .execute(HttpRequest::get("https://tracker.test/teams"))
            .await
            .expect("response is returned as-is");

        assert_eq!(response.status, 401);
        assert_eq!(client.inner.calls(), 1);
    }

    #[tokio::test]
    async fn disabled_config_makes_a_single_attempt() {
        let client = RetryingHttpClient::new(
            ScriptedClient::new(vec![Ok(HttpResponse::new(503, "busy"))]),
            RetryConfig::no_retry(),
        );

        let response = client
            .execute(HttpRequest::get("https://tracker.test/teams"))
            .await
            .expect("response is returned as-is");

        assert_eq!(response.status, 503);
        assert_eq!(client.inner.calls(), 1);
    }
}
