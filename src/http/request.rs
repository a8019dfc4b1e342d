// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! HTTP request context carried through one request chain

use std::time::Duration;

use base64::Engine;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use serde::Serialize;
use url::Url;

use super::headers;
use crate::error::{Error, Result};

/// HTTP request representation
///
/// `headers` only holds what the caller asked for. The agent adds its
/// default headers and the jar's cookies on every hop.
#[derive(Debug, Clone)]
pub struct Request {
    /// Request method
    pub method: Method,
    /// Request URL
    pub url: Url,
    /// Caller-supplied headers
    pub headers: HeaderMap,
    /// Request body
    pub body: Option<Bytes>,
    /// Transport timeout for each hop
    pub timeout: Option<Duration>,
    /// Redirect budget override (None = agent default)
    pub max_redirects: Option<u32>,
}

impl Request {
    /// Create a new request with arbitrary method
    pub fn new(method: Method, url: impl AsRef<str>) -> Result<Self> {
        Ok(Self::with_url(method, Url::parse(url.as_ref())?))
    }

    /// Create a new request for an already parsed URL
    pub fn with_url(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
            timeout: None,
            max_redirects: None,
        }
    }

    /// Create a new GET request
    pub fn get(url: impl AsRef<str>) -> Result<Self> {
        Self::new(Method::GET, url)
    }

    /// Create a new POST request
    pub fn post(url: impl AsRef<str>) -> Result<Self> {
        Self::new(Method::POST, url)
    }

    /// Set a header, replacing earlier values of the same name
    pub fn set_header(&mut self, name: &str, value: &str) -> Result<()> {
        let (name, value) = parse_header(name, value)?;
        self.headers.insert(name, value);
        Ok(())
    }

    /// Set a header, builder style
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        self.set_header(name.as_ref(), value.as_ref())?;
        Ok(self)
    }

    /// Set the request body
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Set JSON body
    pub fn json<T: Serialize + ?Sized>(mut self, data: &T) -> Result<Self> {
        let json = serde_json::to_vec(data)?;
        self.body = Some(Bytes::from(json));
        self.headers
            .insert(headers::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(self)
    }

    /// Set urlencoded form body
    pub fn form<K, V>(mut self, pairs: &[(K, V)]) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs.iter().map(|(k, v)| (k.as_ref(), v.as_ref())))
            .finish();
        self.body = Some(Bytes::from(body));
        self.headers.insert(
            headers::CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );
        self
    }

    /// Set basic authorization
    pub fn basic_auth(self, username: &str, password: &str) -> Result<Self> {
        let encoded =
            base64::engine::general_purpose::STANDARD.encode(format!("{}:{}", username, password));
        self.header(headers::AUTHORIZATION, format!("Basic {}", encoded))
    }

    /// Set bearer authorization
    pub fn bearer_auth(self, token: &str) -> Result<Self> {
        self.header(headers::AUTHORIZATION, format!("Bearer {}", token))
    }

    /// Set timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set redirect budget (0 = never follow)
    pub fn max_redirects(mut self, max: u32) -> Self {
        self.max_redirects = Some(max);
        self
    }

    /// Caller-supplied `Cookie` header, if any
    pub fn literal_cookie(&self) -> Option<&str> {
        self.headers
            .get(headers::COOKIE)
            .and_then(|v| v.to_str().ok())
    }
}

/// Validate a header pair for the wire
pub(crate) fn parse_header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue)> {
    let header_name = HeaderName::try_from(name)
        .map_err(|e| Error::invalid_header(name, e.to_string()))?;
    let header_value = HeaderValue::try_from(value)
        .map_err(|e| Error::invalid_header(name, e.to_string()))?;
    Ok((header_name, header_value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_creation() {
        let req = Request::get("https://example.com/path").unwrap();
        assert_eq!(req.method, Method::GET);
        assert_eq!(req.url.host_str(), Some("example.com"));
        assert_eq!(req.max_redirects, None);
        assert!(req.body.is_none());
    }

    #[test]
    fn test_invalid_url() {
        assert!(matches!(Request::get("not a url"), Err(Error::Url(_))));
    }

    #[test]
    fn test_request_headers() {
        let req = Request::get("https://example.com")
            .unwrap()
            .header("X-Custom", "value")
            .unwrap();
        assert_eq!(
            req.headers.get("x-custom").map(|v| v.to_str().unwrap()),
            Some("value")
        );
    }

    #[test]
    fn test_invalid_header_rejected() {
        let err = Request::get("https://example.com")
            .unwrap()
            .header("bad header", "value")
            .unwrap_err();
        assert!(matches!(err, Error::InvalidHeader { .. }));
    }

    #[test]
    fn test_json_body() {
        let req = Request::post("http://localhost/redirect")
            .unwrap()
            .json(&serde_json::json!({ "foo": "bar" }))
            .unwrap();
        assert_eq!(req.body.as_deref(), Some(&br#"{"foo":"bar"}"#[..]));
        assert_eq!(req.headers.get("content-type").unwrap(), "application/json");
    }

    #[test]
    fn test_form_body() {
        let req = Request::post("http://localhost/")
            .unwrap()
            .form(&[("q", "a b"), ("x", "&")]);
        assert_eq!(req.body.as_deref(), Some(&b"q=a+b&x=%26"[..]));
    }

    #[test]
    fn test_basic_auth() {
        let req = Request::get("http://localhost/")
            .unwrap()
            .basic_auth("user", "pass")
            .unwrap();
        assert_eq!(req.headers.get("authorization").unwrap(), "Basic dXNlcjpwYXNz");
    }

    #[test]
    fn test_literal_cookie() {
        let req = Request::get("http://localhost/")
            .unwrap()
            .header("Cookie", "a=1; b=2")
            .unwrap();
        assert_eq!(req.literal_cookie(), Some("a=1; b=2"));
    }
}
