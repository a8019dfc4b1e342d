// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Transport seam: a single request/response exchange
//!
//! The agent owns cookies and redirects, so a transport must never follow
//! redirects or keep cookies of its own.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::redirect::Policy;
use reqwest::{Client, StatusCode};

use super::request::Request;
use crate::config::AgentConfig;
use crate::error::{Error, Result};

/// Raw result of one exchange
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// Response status code
    pub status: StatusCode,
    /// Response headers; repeated names such as `set-cookie` keep every value
    pub headers: HeaderMap,
    /// Response body
    pub body: Bytes,
}

impl TransportResponse {
    /// Create a new transport response
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }
}

/// Something that can perform one HTTP exchange
///
/// `request.headers` already contains the final wire headers, including
/// the composed `Cookie` header.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send the request and return the response without following redirects
    async fn dispatch(&self, request: &Request) -> Result<TransportResponse>;
}

/// Transport backed by a reqwest client
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Build the underlying client from the agent configuration
    pub fn new(config: &AgentConfig) -> Result<Self> {
        let mut builder = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(Policy::none())
            .danger_accept_invalid_certs(config.accept_invalid_certs);

        if let Some(ref proxy_url) = config.proxy {
            builder = builder.proxy(
                reqwest::Proxy::all(proxy_url)
                    .map_err(|e| Error::Config(format!("Invalid proxy URL: {}", e)))?,
            );
        }

        Ok(Self {
            client: builder.build()?,
        })
    }

    /// Wrap an existing client; it must not follow redirects itself
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn dispatch(&self, request: &Request) -> Result<TransportResponse> {
        let mut builder = self
            .client
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone());

        if let Some(ref body) = request.body {
            builder = builder.body(body.clone());
        }

        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }
}
