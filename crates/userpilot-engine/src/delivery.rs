//! Delivery of `identify` payloads to Userpilot.
//!
//! One POST per record, no batching, no retry. A failed delivery is
//! reported to the caller as a [`DeliveryError`]; whether that is fatal is
//! the caller's decision (the stream processor logs and moves on).

use std::time::Duration;

use reqwest::header::AUTHORIZATION;
use userpilot_types::IdentifyPayload;

use crate::config::Config;

pub const DEFAULT_ENDPOINT: &str = "https://analytex-eu.userpilot.io/v1/identify";
pub const API_VERSION: &str = "2020-09-22";
pub const API_VERSION_HEADER: &str = "X-API-Version";

/// Successful response from the identify endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReceipt {
    pub status: u16,
}

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// Could not construct the HTTP client.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// Request never got a response (DNS, connect, TLS, timeout, ...).
    #[error("request to Userpilot failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// Userpilot answered with a non-2xx status.
    #[error("Userpilot rejected identify call with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Sink for outbound `identify` payloads.
#[allow(async_fn_in_trait)]
pub trait Delivery {
    async fn deliver(&self, payload: &IdentifyPayload) -> Result<DeliveryReceipt, DeliveryError>;
}

/// [`Delivery`] over HTTPS to the Userpilot identify API.
#[derive(Clone)]
pub struct UserpilotClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl std::fmt::Debug for UserpilotClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserpilotClient")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl UserpilotClient {
    /// Build a client from the target config.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::Client`] if the TLS backend fails to
    /// initialise.
    pub fn new(config: &Config) -> Result<Self, DeliveryError> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder.build().map_err(DeliveryError::Client)?;
        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
        })
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Assemble the POST without sending it.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::Transport`] if the endpoint is not a valid URL
    /// or the API key is not a valid header value.
    pub fn build_request(&self, payload: &IdentifyPayload) -> Result<reqwest::Request, DeliveryError> {
        self.http
            .post(&self.endpoint)
            .header(AUTHORIZATION, format!("Token {}", self.api_key))
            .header(API_VERSION_HEADER, API_VERSION)
            .json(payload)
            .build()
            .map_err(DeliveryError::Transport)
    }
}

impl Delivery for UserpilotClient {
    async fn deliver(&self, payload: &IdentifyPayload) -> Result<DeliveryReceipt, DeliveryError> {
        let request = self.build_request(payload)?;
        let response = self
            .http
            .execute(request)
            .await
            .map_err(DeliveryError::Transport)?;

        let status = response.status();
        if status.is_success() {
            return Ok(DeliveryReceipt {
                status: status.as_u16(),
            });
        }
        let body = response.text().await.unwrap_or_default();
        Err(DeliveryError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use userpilot_types::IdentifyMetadata;

    fn config(endpoint: &str) -> Config {
        Config::from_value(json!({
            "api_key": "abc123",
            "date_from": "2022-01-01",
            "endpoint": endpoint,
        }))
        .unwrap()
    }

    fn payload() -> IdentifyPayload {
        IdentifyPayload {
            user_id: "42".into(),
            metadata: IdentifyMetadata {
                name: "A B".into(),
                first_name: "A".into(),
                last_name: "B".into(),
                orga_creation_date: "2020-01-01".into(),
                is_email_campaign_validated: "true".into(),
                is_transactional_email_validated: "false".into(),
                is_profile_completed: "true".into(),
                enabled_internal_apps: "[]".into(),
                is_bot: "false".into(),
                is_receive_newsletter: "true".into(),
            },
        }
    }

    #[test]
    fn test_request_targets_identify_endpoint_with_headers() {
        let client = UserpilotClient::new(&config(DEFAULT_ENDPOINT)).unwrap();
        let request = client.build_request(&payload()).unwrap();

        assert_eq!(request.method(), reqwest::Method::POST);
        assert_eq!(request.url().as_str(), DEFAULT_ENDPOINT);
        assert_eq!(request.headers()[AUTHORIZATION], "Token abc123");
        assert_eq!(request.headers()[API_VERSION_HEADER], "2020-09-22");
        assert_eq!(
            request.headers()[reqwest::header::CONTENT_TYPE],
            "application/json"
        );

        let body = request.body().and_then(reqwest::Body::as_bytes).unwrap();
        let sent: serde_json::Value = serde_json::from_slice(body).unwrap();
        assert_eq!(sent["user_id"], "42");
        assert_eq!(sent["metadata"]["name"], "A B");
    }

    #[test]
    fn test_invalid_endpoint_is_transport_error() {
        // Bypasses `Config::from_value`, which would reject this endpoint.
        let mut unchecked = config(DEFAULT_ENDPOINT);
        unchecked.endpoint = "not a url".into();
        let client = UserpilotClient::new(&unchecked).unwrap();
        let err = client.build_request(&payload()).unwrap_err();
        assert!(matches!(err, DeliveryError::Transport(_)), "got: {err}");
    }

    #[test]
    fn test_rejected_display() {
        let err = DeliveryError::Rejected {
            status: 401,
            body: "invalid token".into(),
        };
        assert_eq!(
            err.to_string(),
            "Userpilot rejected identify call with status 401: invalid token"
        );
    }
}
