//! Slack Web API adapter for the `Notifier` port.
//!
//! # Design
//! - Blocking client: the sweep cycle runs on a dedicated blocking thread.
//! - HTTP 429 and `{"ok":false,"error":"ratelimited"}` both map to `Delivery::RateLimited`.
//! - `Retry-After` is whole seconds; a missing or unreadable header waits one second.

use std::time::Duration;

use dumpsweep_config::SlackToken;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{NotifyError, NotifyResult};
use crate::notifier::{Delivery, Notifier, RateLimitSignal};

/// Public Slack Web API base URL.
pub const DEFAULT_SLACK_API_URL: &str = "https://slack.com/api/";

const POST_MESSAGE_METHOD: &str = "chat.postMessage";
const OPERATION: &str = "chat.post_message";
const RATE_LIMITED_CODE: &str = "ratelimited";
const FALLBACK_RETRY_AFTER: Duration = Duration::from_secs(1);

/// Posts announcements through `chat.postMessage`.
pub struct SlackNotifier {
    client: Client,
    endpoint: Url,
    token: SlackToken,
}

#[derive(Serialize)]
struct PostMessage<'a> {
    channel: &'a str,
    text: &'a str,
}

#[derive(Deserialize)]
struct SlackReply {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

impl SlackNotifier {
    /// Build a notifier against `api_base` (normally [`DEFAULT_SLACK_API_URL`]).
    ///
    /// `timeout` bounds each request; `None` waits for the server indefinitely.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client cannot be built.
    pub fn new(
        token: SlackToken,
        api_base: &str,
        timeout: Option<Duration>,
    ) -> NotifyResult<Self> {
        let base = if api_base.ends_with('/') {
            api_base.to_string()
        } else {
            format!("{api_base}/")
        };
        let endpoint = Url::parse(&base)
            .and_then(|base| base.join(POST_MESSAGE_METHOD))
            .map_err(|source| NotifyError::Endpoint {
                url: api_base.to_string(),
                source,
            })?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| NotifyError::Client { source })?;
        Ok(Self {
            client,
            endpoint,
            token,
        })
    }

    /// Endpoint the notifier posts to.
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl Notifier for SlackNotifier {
    fn post(&self, channel: &str, text: &str) -> NotifyResult<Delivery> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(self.token.expose())
            .json(&PostMessage { channel, text })
            .send()
            .map_err(|source| NotifyError::Http {
                operation: OPERATION,
                url: self.endpoint.to_string(),
                source,
            })?;

        let status = response.status();
        let retry_after = retry_after(response.headers());
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Ok(Delivery::RateLimited(RateLimitSignal { retry_after }));
        }
        if !status.is_success() {
            return Err(NotifyError::Status {
                operation: OPERATION,
                status: status.as_u16(),
            });
        }

        let body = response.text().map_err(|source| NotifyError::Http {
            operation: OPERATION,
            url: self.endpoint.to_string(),
            source,
        })?;
        let reply: SlackReply = serde_json::from_str(&body).map_err(|source| {
            NotifyError::Decode {
                operation: OPERATION,
                source,
            }
        })?;

        if reply.ok {
            return Ok(Delivery::Posted);
        }
        match reply.error {
            Some(code) if code == RATE_LIMITED_CODE => {
                Ok(Delivery::RateLimited(RateLimitSignal { retry_after }))
            }
            code => Err(NotifyError::Api {
                operation: OPERATION,
                code: code.unwrap_or_else(|| "unknown".to_string()),
            }),
        }
    }
}

fn retry_after(headers: &HeaderMap) -> Duration {
    headers
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map_or(FALLBACK_RETRY_AFTER, Duration::from_secs)
}
