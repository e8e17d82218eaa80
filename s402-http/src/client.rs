//! The upstream facilitator HTTP client.

use std::time::Duration;

use s402::error::FacilitatorError;
use s402::facilitator::{BoxFuture, Facilitator};
use s402::proto::{PaymentRequirements, SettleResponse, V1, VerifyRequest, VerifyResponse};
use url::Url;

/// Configuration for [`HttpFacilitatorClient`].
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// Facilitator base URL (trailing slash is stripped).
    pub url: Url,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl UpstreamConfig {
    /// Creates a config with the default 30-second timeout.
    #[must_use]
    pub fn new(url: Url) -> Self {
        Self {
            url,
            timeout: Duration::from_secs(30),
        }
    }

    /// Overrides the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Async HTTP client for an upstream facilitator's `/verify` and `/settle`
/// endpoints.
///
/// Every transport-level failure — connection refusal, timeout, a non-2xx
/// status, an unparseable body — surfaces as
/// [`FacilitatorError::UpstreamUnavailable`]; a well-formed negative
/// verdict comes back as a normal response. The client never retries.
pub struct HttpFacilitatorClient {
    base_url: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for HttpFacilitatorClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpFacilitatorClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl HttpFacilitatorClient {
    /// Creates a client for the given upstream.
    ///
    /// # Panics
    ///
    /// Panics if the TLS backend cannot be initialized, which indicates a
    /// broken build rather than a runtime condition.
    #[must_use]
    pub fn new(config: UpstreamConfig) -> Self {
        let base_url = config.url.as_str().trim_end_matches('/').to_owned();
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("failed to build reqwest::Client");
        Self { base_url, client }
    }

    /// The upstream base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request_body(
        payment_header: &str,
        requirements: &PaymentRequirements,
    ) -> VerifyRequest {
        VerifyRequest {
            x402_version: V1,
            payment_header: payment_header.to_owned(),
            payment_requirements: requirements.clone(),
        }
    }

    async fn post<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &VerifyRequest,
    ) -> Result<T, FacilitatorError> {
        let response = self
            .client
            .post(format!("{}/{endpoint}", self.base_url))
            .json(body)
            .send()
            .await
            .map_err(|e| {
                FacilitatorError::UpstreamUnavailable(format!("{endpoint} request failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(FacilitatorError::UpstreamUnavailable(format!(
                "{endpoint} returned {status}: {text}"
            )));
        }

        response.json().await.map_err(|e| {
            FacilitatorError::UpstreamUnavailable(format!("{endpoint} response parse error: {e}"))
        })
    }
}

impl Facilitator for HttpFacilitatorClient {
    fn verify<'a>(
        &'a self,
        payment_header: &'a str,
        requirements: &'a PaymentRequirements,
    ) -> BoxFuture<'a, Result<VerifyResponse, FacilitatorError>> {
        Box::pin(async move {
            let body = Self::request_body(payment_header, requirements);
            self.post("verify", &body).await
        })
    }

    fn settle<'a>(
        &'a self,
        payment_header: &'a str,
        requirements: &'a PaymentRequirements,
    ) -> BoxFuture<'a, Result<SettleResponse, FacilitatorError>> {
        Box::pin(async move {
            let body = Self::request_body(payment_header, requirements);
            self.post("settle", &body).await
        })
    }
}

#[cfg(test)]
mod tests {
    use s402::proto::{EVENT_PAYMENT_SETTLED, EXACT_SCHEME};
    use s402::units::TokenAmount;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn requirements() -> PaymentRequirements {
        PaymentRequirements {
            scheme: EXACT_SCHEME.to_owned(),
            network: "base-sepolia".to_owned(),
            pay_to: "0x2222222222222222222222222222222222222222".to_owned(),
            asset: "0x036CbD53842c5426634e7929541eC2318f3dCF7e".to_owned(),
            max_amount_required: TokenAmount::from_units(1_000_000),
            max_timeout_seconds: 300,
            description: None,
            mime_type: None,
        }
    }

    fn client_for(server: &MockServer) -> HttpFacilitatorClient {
        HttpFacilitatorClient::new(UpstreamConfig::new(server.uri().parse().unwrap()))
    }

    #[tokio::test]
    async fn test_verify_posts_header_and_requirements() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/verify"))
            .and(body_partial_json(serde_json::json!({
                "x402Version": 1,
                "paymentHeader": "aGVhZGVy",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "isValid": true,
                "payer": "0x1111111111111111111111111111111111111111",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let response = client.verify("aGVhZGVy", &requirements()).await.unwrap();
        assert!(response.is_valid);
        assert!(response.payer.is_some());
    }

    #[tokio::test]
    async fn test_verify_relays_negative_verdict() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/verify"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "isValid": false,
                "invalidReason": "insufficient_funds",
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let response = client.verify("aGVhZGVy", &requirements()).await.unwrap();
        assert!(!response.is_valid);
        assert_eq!(
            response.invalid_reason.as_deref(),
            Some("insufficient_funds")
        );
    }

    #[tokio::test]
    async fn test_settle_parses_settled_event() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/settle"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "event": "payment.settled",
                "txHash": "0xabc",
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let response = client.settle("aGVhZGVy", &requirements()).await.unwrap();
        assert_eq!(response.event, EVENT_PAYMENT_SETTLED);
        assert!(response.is_settled());
    }

    #[tokio::test]
    async fn test_http_failure_is_upstream_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/verify"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let result = client.verify("aGVhZGVy", &requirements()).await;
        assert!(matches!(
            result,
            Err(FacilitatorError::UpstreamUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_upstream_unavailable() {
        let client = HttpFacilitatorClient::new(
            UpstreamConfig::new("http://127.0.0.1:9".parse().unwrap())
                .with_timeout(Duration::from_millis(200)),
        );
        let result = client.verify("aGVhZGVy", &requirements()).await;
        assert!(matches!(
            result,
            Err(FacilitatorError::UpstreamUnavailable(_))
        ));
    }
}
