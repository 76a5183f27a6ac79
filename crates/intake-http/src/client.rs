//! `reqwest`-backed email verifier.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use intake_core::{EmailValidationSettings, IntakeError, IntakeResult};
use intake_forms::{EmailVerifier, VerifyError, VerifyResponse};

/// Checks addresses against the remote validation endpoint.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct HttpEmailVerifier {
    client: Client,
    endpoint: Url,
    query_param: String,
    timeout: Duration,
}

impl HttpEmailVerifier {
    /// Creates a verifier for `endpoint` using the `email` query parameter
    /// and a five second timeout.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError::Configuration`] if `endpoint` is not an
    /// absolute URL.
    pub fn new(endpoint: &str) -> IntakeResult<Self> {
        let endpoint = Url::parse(endpoint).map_err(|e| {
            IntakeError::Configuration(format!("invalid email endpoint '{endpoint}': {e}"))
        })?;
        Ok(Self {
            client: Client::new(),
            endpoint,
            query_param: "email".to_string(),
            timeout: Duration::from_millis(5000),
        })
    }

    /// Creates a verifier from the `[email_validation]` settings.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError::Configuration`] for an invalid endpoint or an
    /// empty query parameter name.
    pub fn from_settings(settings: &EmailValidationSettings) -> IntakeResult<Self> {
        if settings.query_param.is_empty() {
            return Err(IntakeError::Configuration(
                "email_validation.query_param must not be empty".to_string(),
            ));
        }
        Ok(Self::new(&settings.endpoint)?
            .with_query_param(settings.query_param.clone())
            .with_timeout(Duration::from_millis(settings.timeout_ms)))
    }

    /// Uses a preconfigured client (proxies, TLS roots, default headers).
    #[must_use]
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    #[must_use]
    pub fn with_query_param(mut self, name: impl Into<String>) -> Self {
        self.query_param = name.into();
        self
    }

    /// Per-request timeout enforced by the client.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// The full URL requested for `email`, with the address encoded.
    pub fn request_url(&self, email: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair(&self.query_param, email);
        url
    }

    fn transport_error(&self, err: &reqwest::Error) -> VerifyError {
        if err.is_timeout() {
            VerifyError::Timeout(self.timeout)
        } else {
            VerifyError::Transport(err.to_string())
        }
    }
}

/// Parses a response body.
///
/// # Errors
///
/// Returns [`VerifyError::Malformed`] if the body is not JSON or lacks
/// either field.
pub fn parse_body(body: &[u8]) -> Result<VerifyResponse, VerifyError> {
    serde_json::from_slice(body).map_err(|e| VerifyError::Malformed(e.to_string()))
}

#[async_trait]
impl EmailVerifier for HttpEmailVerifier {
    async fn verify(&self, email: &str) -> Result<VerifyResponse, VerifyError> {
        let url = self.request_url(email);
        tracing::debug!(%url, "Requesting email validation");

        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(VerifyError::Transport(format!(
                "email endpoint answered HTTP {status}"
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(&e))?;
        parse_body(&body)
    }
}
