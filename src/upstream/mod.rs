//! Client for the Pelios API.
//!
//! Every call that leaves this service goes through [`PeliosClient`]. Upstream
//! responses are captured as a [`Relay`] so handlers can pass status and body
//! through unchanged; only transport failures, missing configuration and
//! undecodable bodies become [`UpstreamError`]s.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::ApiConfig;
use crate::models::{Credentials, TokenResponse};
use crate::session::Session;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("missing configuration: Pelios API base URL is not set")]
    MissingConfiguration,

    #[error("Pelios API unreachable at {endpoint}: {message}")]
    Unreachable { endpoint: String, message: String },

    #[error("Pelios API returned a malformed response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },
}

/// An upstream response captured verbatim.
#[derive(Debug, Clone)]
pub struct Relay {
    pub status: StatusCode,
    pub content_type: Option<HeaderValue>,
    pub body: Bytes,
    /// The URL that produced this response
    pub endpoint: String,
}

impl Relay {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Body as text, replacing invalid UTF-8
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decode the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, UpstreamError> {
        serde_json::from_slice(&self.body).map_err(|e| UpstreamError::Decode {
            endpoint: self.endpoint.clone(),
            message: e.to_string(),
        })
    }
}

impl IntoResponse for Relay {
    fn into_response(self) -> Response {
        let mut response = (self.status, self.body).into_response();
        let headers = response.headers_mut();
        match self.content_type {
            Some(content_type) => {
                headers.insert(header::CONTENT_TYPE, content_type);
            }
            None => {
                headers.remove(header::CONTENT_TYPE);
            }
        }
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
        response
    }
}

/// Outcome of a token exchange that reached the upstream.
#[derive(Debug)]
pub enum TokenExchange {
    /// The upstream accepted the credentials
    Issued(Session),
    /// The upstream answered with a non-success status; relay it as is
    Rejected(Relay),
}

pub struct PeliosClient {
    base_url: Option<String>,
    auth_path: String,
    sources_path: String,
    client: reqwest::Client,
}

impl PeliosClient {
    pub fn new(config: &ApiConfig) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("pelios-dashboard/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            base_url: config.base_url().map(str::to_string),
            auth_path: config.auth_path.clone(),
            sources_path: config.sources_path.clone(),
            client,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.base_url.is_some()
    }

    /// Absolute URL of an upstream path
    pub fn endpoint(&self, path: &str) -> Result<String, UpstreamError> {
        let base = self
            .base_url
            .as_deref()
            .ok_or(UpstreamError::MissingConfiguration)?;

        if path.starts_with('/') {
            Ok(format!("{}{}", base, path))
        } else {
            Ok(format!("{}/{}", base, path))
        }
    }

    /// Exchange credentials for a bearer token.
    ///
    /// The credentials travel as `userName` and `password` query parameters on a GET.
    pub async fn exchange_token(
        &self,
        credentials: &Credentials,
    ) -> Result<TokenExchange, UpstreamError> {
        let endpoint = self.endpoint(&self.auth_path)?;

        let request = self.client.get(&endpoint).query(&[
            ("userName", credentials.user_name.as_str()),
            ("password", credentials.password.as_str()),
        ]);
        let relay = self.send(request, &endpoint).await?;

        if !relay.is_success() {
            info!(
                user = %credentials.user_name,
                status = %relay.status,
                "Pelios API rejected token exchange"
            );
            return Ok(TokenExchange::Rejected(relay));
        }

        let token: TokenResponse = relay.json()?;
        info!(user = %credentials.user_name, "Token issued by Pelios API");

        Ok(TokenExchange::Issued(Session {
            token: token.token,
            user_name: credentials.user_name.clone(),
        }))
    }

    /// Fetch the caller's sources with their bearer token.
    pub async fn fetch_sources(&self, token: &str) -> Result<Relay, UpstreamError> {
        let endpoint = self.endpoint(&self.sources_path)?;

        let request = self
            .client
            .get(&endpoint)
            .bearer_auth(token)
            .header(header::CACHE_CONTROL, "no-store");

        self.send(request, &endpoint).await
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        endpoint: &str,
    ) -> Result<Relay, UpstreamError> {
        let unreachable = |e: reqwest::Error| UpstreamError::Unreachable {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        };

        let response = request.send().await.map_err(unreachable)?;
        let status = response.status();
        let content_type = response.headers().get(header::CONTENT_TYPE).cloned();
        let body = response.bytes().await.map_err(unreachable)?;

        debug!(endpoint = %endpoint, status = %status, bytes = body.len(), "Pelios API responded");

        Ok(Relay {
            status,
            content_type,
            body,
            endpoint: endpoint.to_string(),
        })
    }
}
