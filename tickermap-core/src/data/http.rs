//! Blocking HTTP GET with bounded retries.
//!
//! Shared by every HTTP-backed provider. Connect/timeout errors, 429 and 5xx
//! are retried with exponential backoff; anything else fails immediately. A
//! 429 waits for the server's `Retry-After` instead, up to
//! [`MAX_RATE_LIMIT_WAIT`].

use super::provider::ProviderError;
use std::time::Duration;

/// Longest a single `Retry-After` is honoured for.
pub const MAX_RATE_LIMIT_WAIT: Duration = Duration::from_secs(60);

/// `Retry-After` assumed when a 429 carries none.
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Outcome of a GET that did not fail outright.
#[derive(Debug)]
pub enum HttpBody {
    Ok(String),
    NotFound,
}

pub struct HttpFetcher {
    client: reqwest::blocking::Client,
    provider: String,
    max_retries: u32,
    base_delay: Duration,
    max_rate_limit_wait: Duration,
}

impl HttpFetcher {
    pub fn new(provider: impl Into<String>, timeout: Duration) -> Result<Self, ProviderError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("tickermap/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ProviderError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            provider: provider.into(),
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_rate_limit_wait: MAX_RATE_LIMIT_WAIT,
        })
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// GET `url` with `query` parameters. 404 is `HttpBody::NotFound`.
    ///
    /// `label` identifies the request in errors and logs; it must not carry
    /// credentials, since `url`/`query` may.
    pub fn get_text(
        &self,
        url: &str,
        query: &[(&str, &str)],
        label: &str,
    ) -> Result<HttpBody, ProviderError> {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.retry_delay(attempt, last_error.as_ref());
                tracing::debug!(provider = %self.provider, label, attempt, ?delay, "retrying request");
                std::thread::sleep(delay);
            }

            let resp = match self.client.get(url).query(query).send() {
                Ok(resp) => resp,
                Err(e) if e.is_connect() || e.is_timeout() => {
                    last_error = Some(ProviderError::NetworkUnreachable(format!(
                        "{label}: {}",
                        e.without_url()
                    )));
                    continue;
                }
                Err(e) => {
                    return Err(ProviderError::NetworkUnreachable(format!(
                        "{label}: {}",
                        e.without_url()
                    )))
                }
            };

            let status = resp.status();
            if status == reqwest::StatusCode::NOT_FOUND {
                return Ok(HttpBody::NotFound);
            }
            if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
                return Err(ProviderError::AuthenticationRequired {
                    provider: self.provider.clone(),
                });
            }
            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                let retry_after = parse_retry_after(
                    resp.headers().get("retry-after").and_then(|v| v.to_str().ok()),
                );
                last_error = Some(ProviderError::RateLimited {
                    provider: self.provider.clone(),
                    retry_after_secs: retry_after,
                });
                continue;
            }
            if status.is_server_error() {
                last_error = Some(self.http_error(status, label));
                continue;
            }
            if !status.is_success() {
                return Err(self.http_error(status, label));
            }

            let body = resp.text().map_err(|e| {
                ProviderError::ResponseFormatChanged(format!("{label}: unreadable body: {}", e.without_url()))
            })?;
            return Ok(HttpBody::Ok(body));
        }

        Err(last_error.unwrap_or_else(|| ProviderError::Other("max retries exceeded".into())))
    }

    /// Wait before `attempt` (1-based). After a 429 this is the server's
    /// `Retry-After`, capped; otherwise exponential backoff.
    fn retry_delay(&self, attempt: u32, last_error: Option<&ProviderError>) -> Duration {
        match last_error {
            Some(ProviderError::RateLimited {
                retry_after_secs, ..
            }) => Duration::from_secs(*retry_after_secs).min(self.max_rate_limit_wait),
            _ => self.base_delay * 2u32.pow(attempt.saturating_sub(1)),
        }
    }

    fn http_error(&self, status: reqwest::StatusCode, label: &str) -> ProviderError {
        ProviderError::Http {
            provider: self.provider.clone(),
            status: status.as_u16(),
            context: label.to_string(),
        }
    }
}

/// Seconds from a `Retry-After` header. HTTP-date values and garbage fall
/// back to the default.
fn parse_retry_after(value: Option<&str>) -> u64 {
    value
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new("eodhd", Duration::from_secs(1)).unwrap()
    }

    fn rate_limited(secs: u64) -> ProviderError {
        ProviderError::RateLimited {
            provider: "eodhd".into(),
            retry_after_secs: secs,
        }
    }

    #[test]
    fn rate_limit_waits_for_retry_after() {
        let f = fetcher();
        assert_eq!(f.retry_delay(1, Some(&rate_limited(5))), Duration::from_secs(5));
        assert_eq!(f.retry_delay(3, Some(&rate_limited(0))), Duration::ZERO);
    }

    #[test]
    fn rate_limit_wait_is_capped() {
        let f = fetcher();
        assert_eq!(
            f.retry_delay(1, Some(&rate_limited(3600))),
            MAX_RATE_LIMIT_WAIT
        );
    }

    #[test]
    fn other_failures_back_off_exponentially() {
        let f = fetcher();
        let err = ProviderError::NetworkUnreachable("x".into());
        assert_eq!(f.retry_delay(1, Some(&err)), Duration::from_millis(500));
        assert_eq!(f.retry_delay(3, Some(&err)), Duration::from_millis(2000));
        assert_eq!(f.retry_delay(2, None), Duration::from_millis(1000));
    }

    #[test]
    fn retry_after_parsing() {
        assert_eq!(parse_retry_after(Some("7")), 7);
        assert_eq!(parse_retry_after(Some(" 12 ")), 12);
        assert_eq!(parse_retry_after(Some("Wed, 21 Oct 2026 07:28:00 GMT")), 60);
        assert_eq!(parse_retry_after(None), 60);
    }
}
