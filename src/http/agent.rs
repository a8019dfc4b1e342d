// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Stateful agent: one cookie jar, many request chains

use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use parking_lot::RwLock;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, COOKIE, SET_COOKIE};
use reqwest::Method;
use serde::Serialize;
use url::Url;

use super::codec::compose_cookie_header;
use super::cookie::CookieJar;
use super::redirect::{RedirectController, Step};
use super::request::{parse_header, Request};
use super::response::Response;
use super::transport::{ReqwestTransport, Transport};
use crate::config::AgentConfig;
use crate::error::{Error, Result};

/// Create a new agent with default configuration and an empty jar
pub fn agent() -> Result<Agent> {
    Agent::new()
}

/// HTTP agent with its own cookie jar
///
/// Clones are handles to the same agent and share its jar. Separately
/// constructed agents never see each other's cookies.
#[derive(Clone)]
pub struct Agent {
    config: AgentConfig,
    transport: Arc<dyn Transport>,
    cookie_jar: CookieJar,
    default_headers: Arc<RwLock<HeaderMap>>,
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("config", &self.config)
            .field("cookies", &self.cookie_jar.len())
            .finish_non_exhaustive()
    }
}

impl Agent {
    /// Create a new agent with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(AgentConfig::default())
    }

    /// Create a new agent backed by reqwest
    pub fn with_config(config: AgentConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(&config)?;
        Self::with_transport(config, transport)
    }

    /// Create a new agent on top of any transport
    pub fn with_transport(config: AgentConfig, transport: impl Transport + 'static) -> Result<Self> {
        let mut default_headers = HeaderMap::new();
        for (name, value) in &config.default_headers {
            let (name, value) = parse_header(name, value)?;
            if name == COOKIE {
                let joined = match default_headers.get(&COOKIE) {
                    Some(existing) => {
                        let existing = existing
                            .to_str()
                            .map_err(|e| Error::invalid_header("cookie", e.to_string()))?;
                        let value = value
                            .to_str()
                            .map_err(|e| Error::invalid_header("cookie", e.to_string()))?;
                        parse_header("cookie", &format!("{}; {}", existing, value))?.1
                    }
                    None => value,
                };
                default_headers.insert(COOKIE, joined);
            } else {
                default_headers.append(name, value);
            }
        }

        Ok(Self {
            config,
            transport: Arc::new(transport),
            cookie_jar: CookieJar::new(),
            default_headers: Arc::new(RwLock::new(default_headers)),
        })
    }

    /// Get the cookie jar
    pub fn jar(&self) -> &CookieJar {
        &self.cookie_jar
    }

    /// Get agent configuration
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Set a header sent with every later request of this agent.
    ///
    /// A `Cookie` set here is sent ahead of the jar's cookies.
    pub fn set(&self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<&Self> {
        let (name, value) = parse_header(name.as_ref(), value.as_ref())?;
        self.default_headers.write().insert(name, value);
        Ok(self)
    }

    /// Remove an agent-wide header
    pub fn unset(&self, name: impl AsRef<str>) -> &Self {
        self.default_headers.write().remove(name.as_ref());
        self
    }

    /// Start a request with arbitrary method
    pub fn request(&self, method: Method, url: impl AsRef<str>) -> RequestBuilder {
        RequestBuilder {
            agent: self.clone(),
            request: Request::new(method, url),
        }
    }

    /// Start a GET request
    pub fn get(&self, url: impl AsRef<str>) -> RequestBuilder {
        self.request(Method::GET, url)
    }

    /// Start a POST request
    pub fn post(&self, url: impl AsRef<str>) -> RequestBuilder {
        self.request(Method::POST, url)
    }

    /// Start a PUT request
    pub fn put(&self, url: impl AsRef<str>) -> RequestBuilder {
        self.request(Method::PUT, url)
    }

    /// Start a PATCH request
    pub fn patch(&self, url: impl AsRef<str>) -> RequestBuilder {
        self.request(Method::PATCH, url)
    }

    /// Start a DELETE request
    pub fn delete(&self, url: impl AsRef<str>) -> RequestBuilder {
        self.request(Method::DELETE, url)
    }

    /// Start a HEAD request
    pub fn head(&self, url: impl AsRef<str>) -> RequestBuilder {
        self.request(Method::HEAD, url)
    }

    /// `Cookie` header value `request` would carry now as the first hop
    pub fn cookie_header_for(&self, request: &Request) -> Option<String> {
        self.compose_cookies(request, false)
    }

    /// Caller literal (request, else agent-wide) followed by the jar's cookies.
    ///
    /// The agent-wide literal is skipped once the chain has left its
    /// starting origin.
    fn compose_cookies(&self, request: &Request, cross_origin: bool) -> Option<String> {
        let defaults = self.default_headers.read();
        let literal = request.literal_cookie().or_else(|| {
            if cross_origin {
                return None;
            }
            defaults.get(COOKIE).and_then(|v| v.to_str().ok())
        });
        let jar = self.cookie_jar.cookie_header(&request.url).unwrap_or_default();
        compose_cookie_header(literal, &jar)
    }

    /// Final wire headers for one hop: defaults, caller headers, cookies
    fn wire_headers(&self, request: &Request, cross_origin: bool) -> Result<HeaderMap> {
        let mut headers = self.default_headers.read().clone();
        if cross_origin {
            headers.remove(AUTHORIZATION);
        }
        for name in request.headers.keys() {
            headers.remove(name);
            for value in request.headers.get_all(name) {
                headers.append(name.clone(), value.clone());
            }
        }

        headers.remove(COOKIE);
        if let Some(cookie) = self.compose_cookies(request, cross_origin) {
            tracing::trace!(url = %request.url, cookie = %cookie, "Attaching cookies");
            let value = HeaderValue::try_from(cookie)
                .map_err(|e| Error::invalid_header("cookie", e.to_string()))?;
            headers.insert(COOKIE, value);
        }
        Ok(headers)
    }

    /// Execute a request chain, following redirects within its budget
    pub async fn execute(&self, request: Request) -> Result<Response> {
        let start = Instant::now();
        let budget = request.max_redirects.unwrap_or(self.config.max_redirects);
        let mut controller = RedirectController::new(budget);
        let origin = request.url.origin();
        let mut cross_origin = false;
        let mut current = request;

        loop {
            cross_origin |= current.url.origin() != origin;
            let wire = Request {
                headers: self.wire_headers(&current, cross_origin)?,
                ..current.clone()
            };

            tracing::debug!(method = %wire.method, url = %wire.url, "Dispatching request");
            let exchange = self.transport.dispatch(&wire).await?;
            tracing::debug!(url = %wire.url, status = %exchange.status, "Received response");

            let set_cookies = exchange
                .headers
                .get_all(SET_COOKIE)
                .iter()
                .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned());
            self.cookie_jar.apply(set_cookies, &current.url);

            match controller.next(&current, &exchange) {
                Step::Follow(next) => current = next,
                Step::Done | Step::Blocked => {
                    return Ok(Response::new(
                        exchange.status,
                        exchange.headers,
                        exchange.body,
                        current.url,
                        controller.into_history(),
                        start.elapsed().as_millis() as u64,
                    ));
                }
            }
        }
    }

    /// Execute several request chains concurrently on this agent's jar
    pub async fn execute_all(&self, requests: Vec<Request>) -> Vec<Result<Response>> {
        let futures: Vec<_> = requests.into_iter().map(|r| self.execute(r)).collect();
        futures::future::join_all(futures).await
    }
}

/// Builder for one request chain on an agent
///
/// Errors from building (bad URL, bad header) are reported by `send`.
pub struct RequestBuilder {
    agent: Agent,
    request: Result<Request>,
}

impl RequestBuilder {
    fn map(mut self, f: impl FnOnce(Request) -> Result<Request>) -> Self {
        self.request = self.request.and_then(f);
        self
    }

    /// Set a header; a `Cookie` set here is sent ahead of the jar's cookies
    pub fn set(self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.map(|r| r.header(name, value))
    }

    /// Set the body
    pub fn body(self, body: impl Into<Bytes>) -> Self {
        let body = body.into();
        self.map(|r| Ok(r.body(body)))
    }

    /// Set JSON body
    pub fn json<T: Serialize + ?Sized>(self, data: &T) -> Self {
        self.map(|r| r.json(data))
    }

    /// Set urlencoded form body
    pub fn form<K, V>(self, pairs: &[(K, V)]) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.map(|r| Ok(r.form(pairs)))
    }

    /// Set basic authorization
    pub fn basic_auth(self, username: &str, password: &str) -> Self {
        self.map(|r| r.basic_auth(username, password))
    }

    /// Set bearer authorization
    pub fn bearer_auth(self, token: &str) -> Self {
        self.map(|r| r.bearer_auth(token))
    }

    /// Set timeout for each hop
    pub fn timeout(self, timeout: Duration) -> Self {
        self.map(|r| Ok(r.timeout(timeout)))
    }

    /// Override the redirect budget (0 = return the first response)
    pub fn redirects(self, max: u32) -> Self {
        self.map(|r| Ok(r.max_redirects(max)))
    }

    /// Jar cookies this request would send right now, empty if none.
    ///
    /// Caller and agent-wide `Cookie` literals are not included.
    pub fn cookies(&self) -> String {
        match self.request {
            Ok(ref request) => self
                .agent
                .jar()
                .cookie_header(&request.url)
                .unwrap_or_default(),
            Err(_) => String::new(),
        }
    }

    /// Target URL, if it parsed
    pub fn url(&self) -> Option<&Url> {
        self.request.as_ref().ok().map(|r| &r.url)
    }

    /// Build the request without sending it
    pub fn build(self) -> Result<Request> {
        self.request
    }

    /// Execute the request chain
    pub async fn send(self) -> Result<Response> {
        let request = self.request?;
        self.agent.execute(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::transport::TransportResponse;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use reqwest::StatusCode;

    /// Replies from a script and records what was sent
    #[derive(Default)]
    struct Scripted {
        replies: Mutex<Vec<TransportResponse>>,
        seen: Arc<Mutex<Vec<Request>>>,
    }

    #[async_trait]
    impl Transport for Scripted {
        async fn dispatch(&self, request: &Request) -> Result<TransportResponse> {
            self.seen.lock().push(request.clone());
            let mut replies = self.replies.lock();
            if replies.is_empty() {
                return Err(Error::transport("connection refused"));
            }
            Ok(replies.remove(0))
        }
    }

    fn reply(status: u16, headers: &[(&'static str, &'static str)]) -> TransportResponse {
        let mut map = HeaderMap::new();
        for (name, value) in headers {
            map.append(*name, HeaderValue::from_static(*value));
        }
        TransportResponse::new(StatusCode::from_u16(status).unwrap(), map, "")
    }

    fn scripted(replies: Vec<TransportResponse>) -> (Agent, Arc<Mutex<Vec<Request>>>) {
        let transport = Scripted {
            replies: Mutex::new(replies),
            ..Default::default()
        };
        let seen = transport.seen.clone();
        (Agent::with_transport(AgentConfig::default(), transport).unwrap(), seen)
    }

    fn cookie_sent(request: &Request) -> Option<String> {
        request
            .headers
            .get(COOKIE)
            .map(|v| v.to_str().unwrap().to_string())
    }

    #[tokio::test]
    async fn test_cookies_recomputed_per_hop() {
        let (agent, seen) = scripted(vec![
            reply(302, &[("location", "/next"), ("set-cookie", "hop=1")]),
            reply(200, &[]),
        ]);

        let resp = agent.get("http://localhost/start").send().await.unwrap();
        assert_eq!(resp.status, StatusCode::OK);
        assert_eq!(resp.redirects, vec!["http://localhost/next"]);

        let seen = seen.lock();
        assert_eq!(cookie_sent(&seen[0]), None);
        assert_eq!(cookie_sent(&seen[1]).as_deref(), Some("hop=1"));
    }

    #[tokio::test]
    async fn test_literal_cookie_composed_with_jar() {
        let (agent, seen) = scripted(vec![reply(200, &[])]);
        agent.jar().apply(["cookie=jar"], &Url::parse("http://localhost/").unwrap());

        agent
            .get("http://localhost/cookieheader")
            .set("Cookie", "first_cookie=dummy; cookie=jam")
            .send()
            .await
            .unwrap();

        assert_eq!(
            cookie_sent(&seen.lock()[0]).as_deref(),
            Some("first_cookie=dummy; cookie=jam; cookie=jar")
        );
    }

    #[tokio::test]
    async fn test_agent_default_headers() {
        let (agent, seen) = scripted(vec![reply(200, &[]), reply(200, &[])]);
        agent.set("Cookie", "first=1").unwrap().set("x-trace", "a").unwrap();

        agent.get("http://localhost/").set("x-trace", "b").send().await.unwrap();
        agent.unset("x-trace");
        agent.get("http://localhost/").send().await.unwrap();

        let seen = seen.lock();
        assert_eq!(seen[0].headers.get("x-trace").unwrap(), "b");
        assert_eq!(cookie_sent(&seen[0]).as_deref(), Some("first=1"));
        assert!(seen[1].headers.get("x-trace").is_none());
    }

    #[tokio::test]
    async fn test_zero_redirects_returns_first_response() {
        let (agent, seen) = scripted(vec![reply(302, &[("location", "/dashboard")])]);

        let resp = agent.get("http://localhost/").redirects(0).send().await.unwrap();
        assert_eq!(resp.status, StatusCode::FOUND);
        assert!(resp.redirects.is_empty());
        assert_eq!(resp.location(), Some("/dashboard"));
        assert_eq!(seen.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_transport_error_keeps_committed_cookies() {
        let (agent, _) = scripted(vec![reply(302, &[("location", "/gone"), ("set-cookie", "kept=1")])]);

        let err = agent.get("http://localhost/").send().await.unwrap_err();
        assert!(err.is_transport());
        assert!(agent.jar().get("kept", "localhost", "/").is_some());
    }

    #[tokio::test]
    async fn test_builder_errors_surface_on_send() {
        let (agent, seen) = scripted(vec![]);
        assert!(matches!(agent.get("nope").send().await, Err(Error::Url(_))));
        assert!(matches!(
            agent.get("http://localhost/").set("bad name", "v").send().await,
            Err(Error::InvalidHeader { .. })
        ));
        assert!(seen.lock().is_empty());
    }

    #[tokio::test]
    async fn test_execute_all_shares_jar() {
        let (agent, seen) = scripted(vec![reply(200, &[]), reply(200, &[])]);
        agent.jar().apply(["sid=1"], &Url::parse("http://localhost/").unwrap());

        let results = agent
            .execute_all(vec![
                Request::get("http://localhost/a").unwrap(),
                Request::get("http://localhost/b").unwrap(),
            ])
            .await;

        assert!(results.iter().all(|r| r.is_ok()));
        assert!(seen
            .lock()
            .iter()
            .all(|r| cookie_sent(r).as_deref() == Some("sid=1")));
    }

    #[test]
    fn test_cookies_preview() {
        let (agent, _) = scripted(vec![]);
        agent.jar().apply(["a=1"], &Url::parse("http://localhost/").unwrap());

        assert_eq!(agent.post("http://localhost/x/y/z").cookies(), "a=1");
        assert_eq!(agent.get("https://google.com").cookies(), "");
        assert_eq!(agent.get("not a url").cookies(), "");
    }

    #[test]
    fn test_cookies_preview_leaves_out_literals() {
        let (agent, _) = scripted(vec![]);
        agent.jar().apply(["a=1"], &Url::parse("http://localhost/").unwrap());
        agent.set("Cookie", "first_cookie=dummy").unwrap();

        let builder = agent.get("http://localhost/").set("Cookie", "mine=2");
        assert_eq!(builder.cookies(), "a=1");
        assert_eq!(agent.get("http://localhost/").cookies(), "a=1");
    }

    #[tokio::test]
    async fn test_agent_credentials_stay_on_starting_origin() {
        let (agent, seen) = scripted(vec![
            reply(302, &[("location", "/same")]),
            reply(302, &[("location", "https://evil.example/")]),
            reply(302, &[("location", "http://localhost/back")]),
            reply(200, &[]),
        ]);
        agent
            .set("Authorization", "Bearer secret")
            .unwrap()
            .set("Cookie", "manual=1")
            .unwrap();

        agent.get("http://localhost/go").send().await.unwrap();

        let seen = seen.lock();
        assert_eq!(seen.len(), 4);
        for hop in &seen[..2] {
            assert_eq!(hop.headers.get(AUTHORIZATION).unwrap(), "Bearer secret");
            assert_eq!(cookie_sent(hop).as_deref(), Some("manual=1"));
        }
        for hop in &seen[2..] {
            assert!(hop.headers.get(AUTHORIZATION).is_none());
            assert_eq!(cookie_sent(hop), None);
        }
    }

    #[tokio::test]
    async fn test_jar_cookies_still_sent_after_origin_change() {
        let (agent, seen) = scripted(vec![
            reply(302, &[("location", "http://other.test/")]),
            reply(200, &[]),
        ]);
        agent.set("Cookie", "manual=1").unwrap();
        agent.jar().apply(["sid=9"], &Url::parse("http://other.test/").unwrap());

        agent.get("http://localhost/").send().await.unwrap();

        let seen = seen.lock();
        assert_eq!(cookie_sent(&seen[0]).as_deref(), Some("manual=1"));
        assert_eq!(cookie_sent(&seen[1]).as_deref(), Some("sid=9"));
    }

    #[tokio::test]
    async fn test_repeated_default_cookies_are_joined() {
        let transport = Scripted {
            replies: Mutex::new(vec![reply(200, &[])]),
            ..Default::default()
        };
        let seen = transport.seen.clone();
        let config = AgentConfig::new()
            .header("Cookie", "a=1")
            .header("Cookie", "b=2");
        let agent = Agent::with_transport(config, transport).unwrap();

        agent.get("http://localhost/").send().await.unwrap();
        assert_eq!(cookie_sent(&seen.lock()[0]).as_deref(), Some("a=1; b=2"));
    }
}
