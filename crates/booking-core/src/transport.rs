use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, COOKIE};
use reqwest::Client;
use tracing::debug;

use crate::api::{TalkRequest, TalkResponse};
use crate::error::{Result, TransportError};

/// Network capability the chat controller talks through.
///
/// Injected so tests can swap in deterministic fakes.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Succeeds when the backend reports an active session
    async fn check_session(&self) -> Result<()>;

    /// Sends one user turn and returns the backend's reply
    async fn talk(&self, request: &TalkRequest) -> Result<TalkResponse>;
}

/// [`Transport`] backed by the booking backend's HTTP API
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_options(base_url, None, None)
    }

    /// Build a transport that keeps cookies across requests, optionally
    /// seeded with a session cookie and a per-request timeout
    pub fn with_options(
        base_url: &str,
        session_cookie: Option<&str>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(cookie) = session_cookie {
            let value = HeaderValue::from_str(cookie)
                .map_err(|e| TransportError::Config(format!("session cookie: {}", e)))?;
            headers.insert(COOKIE, value);
        }

        let mut builder = Client::builder().cookie_store(true).default_headers(headers);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn check_session(&self) -> Result<()> {
        let url = self.url("/me");
        debug!(%url, "probing session");

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(TransportError::Status(response.status()));
        }

        // Any JSON body counts, its shape is not consumed
        let body = response.text().await?;
        serde_json::from_str::<serde_json::Value>(&body)?;
        Ok(())
    }

    /// Any non-2xx status is an error, whatever the body holds
    async fn talk(&self, request: &TalkRequest) -> Result<TalkResponse> {
        let url = self.url("/talk");
        debug!(%url, conversation_id = ?request.conversation_id, "sending talk request");

        let response = self.client.post(&url).json(request).send().await?;

        if !response.status().is_success() {
            return Err(TransportError::Status(response.status()));
        }

        let body = response.text().await?;
        let talk_response: TalkResponse = serde_json::from_str(&body)?;
        Ok(talk_response)
    }
}
