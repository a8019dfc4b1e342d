// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Per-agent cookie jar with RFC 6265 domain, path and secure matching

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use url::Url;

use super::codec::{parse_set_cookie, serialize_cookie_header, SetCookie};

/// A single stored HTTP cookie
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    /// Cookie name
    pub name: String,
    /// Raw cookie value, never decoded
    pub value: String,
    /// Lowercase domain the cookie belongs to
    pub domain: String,
    /// Path the cookie is valid for, always starts with `/`
    pub path: String,
    /// Only send when the domain matches exactly
    pub host_only: bool,
    /// Expiration time (None = session cookie)
    pub expires: Option<DateTime<Utc>>,
    /// Secure flag (HTTPS only)
    pub secure: bool,
    /// HttpOnly flag (hidden from script-visible listings)
    pub http_only: bool,
    /// SameSite attribute, stored but not used for matching
    pub same_site: SameSite,
    /// Insertion order, kept when a cookie is replaced
    pub creation_order: u64,
}

/// SameSite cookie attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SameSite {
    /// Cookie sent with all requests
    #[default]
    None,
    /// Cookie sent with same-site and top-level navigations
    Lax,
    /// Cookie only sent with same-site requests
    Strict,
}

/// Identity of a stored cookie: at most one record exists per key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CookieKey {
    pub domain: String,
    pub path: String,
    pub name: String,
}

impl Cookie {
    /// Create a new host-only session cookie for `domain` with path `/`
    pub fn new(name: impl Into<String>, value: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: domain.into().trim_start_matches('.').to_ascii_lowercase(),
            path: "/".to_string(),
            host_only: true,
            expires: None,
            secure: false,
            http_only: false,
            same_site: SameSite::default(),
            creation_order: 0,
        }
    }

    /// Set the path
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Allow sub-domains of the cookie domain
    pub fn host_only(mut self, host_only: bool) -> Self {
        self.host_only = host_only;
        self
    }

    /// Set secure flag
    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Set http_only flag
    pub fn http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    /// Set same_site attribute
    pub fn same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = same_site;
        self
    }

    /// Set expiration time
    pub fn expires(mut self, expires: DateTime<Utc>) -> Self {
        self.expires = Some(expires);
        self
    }

    /// Storage key of this cookie
    pub fn key(&self) -> CookieKey {
        CookieKey {
            domain: self.domain.clone(),
            path: self.path.clone(),
            name: self.name.clone(),
        }
    }

    /// Check if the cookie is expired at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires.map_or(false, |exp| exp <= now)
    }

    /// Check if the cookie is expired
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Build a cookie from parsed `Set-Cookie` attributes received for `url`.
    ///
    /// Returns `None` when the `Domain` attribute does not cover the request
    /// host.
    pub fn from_set_cookie(parsed: SetCookie, url: &Url, now: DateTime<Utc>) -> Option<Self> {
        let host = url.host_str()?.to_ascii_lowercase();
        let expires = parsed.expiry(now);

        let (domain, host_only) = match parsed.domain {
            Some(domain) if domain == host => (domain, false),
            Some(domain) => {
                if !is_valid_parent_domain(&domain, &host) {
                    return None;
                }
                (domain, false)
            }
            None => (host, true),
        };

        Some(Self {
            name: parsed.name,
            value: parsed.value,
            domain,
            path: parsed.path.unwrap_or_else(|| default_path(url.path())),
            host_only,
            expires,
            secure: parsed.secure,
            http_only: parsed.http_only,
            same_site: parsed.same_site.unwrap_or_default(),
            creation_order: 0,
        })
    }

    /// Check if the cookie should be sent to the given URL at `now`
    pub fn matches_at(&self, url: &Url, now: DateTime<Utc>) -> bool {
        let Some(host) = url.host_str() else {
            return false;
        };

        if self.secure && !is_secure_scheme(url) {
            return false;
        }

        if self.is_expired_at(now) {
            return false;
        }

        self.domain_matches(&host.to_ascii_lowercase()) && path_matches(&self.path, url.path())
    }

    /// Check if the cookie should be sent to the given URL
    pub fn matches(&self, url: &Url) -> bool {
        self.matches_at(url, Utc::now())
    }

    fn domain_matches(&self, host: &str) -> bool {
        if self.host_only {
            return host == self.domain;
        }
        domain_suffix_matches(&self.domain, host)
    }

    /// Convert to cookie header format
    pub fn to_header_value(&self) -> String {
        format!("{}={}", self.name, self.value)
    }
}

fn is_secure_scheme(url: &Url) -> bool {
    matches!(url.scheme(), "https" | "wss")
}

/// `host` equals `domain` or ends with `.domain`, never for IP addresses
fn domain_suffix_matches(domain: &str, host: &str) -> bool {
    if host == domain {
        return true;
    }
    if host.parse::<IpAddr>().is_ok() || host.starts_with('[') {
        return false;
    }
    host.len() > domain.len()
        && host.ends_with(domain)
        && host.as_bytes()[host.len() - domain.len() - 1] == b'.'
}

/// An explicit `Domain` other than the host itself must be a dotted parent
/// of a named host
fn is_valid_parent_domain(domain: &str, host: &str) -> bool {
    domain.contains('.') && domain_suffix_matches(domain, host)
}

/// RFC 6265 section 5.1.4 default-path of a request path
fn default_path(request_path: &str) -> String {
    if !request_path.starts_with('/') {
        return "/".to_string();
    }
    match request_path.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(idx) => request_path[..idx].to_string(),
    }
}

/// RFC 6265 section 5.1.4 path-match
fn path_matches(cookie_path: &str, request_path: &str) -> bool {
    let request_path = if request_path.is_empty() { "/" } else { request_path };
    if request_path == cookie_path {
        return true;
    }
    request_path.starts_with(cookie_path)
        && (cookie_path.ends_with('/') || request_path.as_bytes()[cookie_path.len()] == b'/')
}

#[derive(Debug, Default)]
struct JarState {
    cookies: HashMap<CookieKey, Cookie>,
    next_order: u64,
}

impl JarState {
    fn store(&mut self, mut cookie: Cookie, now: DateTime<Utc>) {
        let key = cookie.key();

        if cookie.is_expired_at(now) {
            if self.cookies.remove(&key).is_some() {
                tracing::debug!(name = %key.name, domain = %key.domain, path = %key.path, "Cookie deleted");
            }
            return;
        }

        cookie.creation_order = match self.cookies.get(&key) {
            Some(existing) => existing.creation_order,
            None => {
                self.next_order += 1;
                self.next_order
            }
        };
        self.cookies.insert(key, cookie);
    }
}

/// Thread-safe cookie storage owned by a single agent
///
/// Every mutation takes the write lock once, so a concurrent reader sees a
/// whole `apply` or none of it.
#[derive(Debug, Clone, Default)]
pub struct CookieJar {
    state: Arc<RwLock<JarState>>,
}

impl CookieJar {
    /// Create a new empty cookie jar
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply every `Set-Cookie` value received in response to `url`.
    ///
    /// Malformed values and values with a foreign `Domain` are dropped
    /// without affecting the others.
    pub fn apply<I, S>(&self, set_cookie_values: I, url: &Url)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let now = Utc::now();
        let parsed: Vec<Cookie> = set_cookie_values
            .into_iter()
            .filter_map(|raw| {
                let raw = raw.as_ref();
                let set_cookie = match parse_set_cookie(raw) {
                    Ok(set_cookie) => set_cookie,
                    Err(e) => {
                        tracing::debug!(header = raw, error = %e, "Dropping malformed Set-Cookie");
                        return None;
                    }
                };
                let cookie = Cookie::from_set_cookie(set_cookie, url, now);
                if cookie.is_none() {
                    tracing::debug!(header = raw, url = %url, "Rejecting Set-Cookie for foreign domain");
                }
                cookie
            })
            .collect();

        if parsed.is_empty() {
            return;
        }

        let mut state = self.state.write();
        for cookie in parsed {
            state.store(cookie, now);
        }
    }

    /// Store a cookie directly, replacing any cookie with the same key
    pub fn set(&self, cookie: Cookie) {
        self.state.write().store(cookie, Utc::now());
    }

    /// Name/value pairs to send to `url`, longest path first, then oldest first
    pub fn cookies_for(&self, url: &Url) -> Vec<(String, String)> {
        self.matching(url)
            .into_iter()
            .map(|c| (c.name, c.value))
            .collect()
    }

    /// `Cookie` header value for `url`, `None` when nothing matches
    pub fn cookie_header(&self, url: &Url) -> Option<String> {
        let pairs = self.cookies_for(url);
        if pairs.is_empty() {
            return None;
        }
        Some(serialize_cookie_header(&pairs))
    }

    /// Matching cookies for `url`, hiding HttpOnly ones
    pub fn script_visible_for(&self, url: &Url) -> Vec<Cookie> {
        self.matching(url)
            .into_iter()
            .filter(|c| !c.http_only)
            .collect()
    }

    fn matching(&self, url: &Url) -> Vec<Cookie> {
        let now = Utc::now();
        let mut result: Vec<Cookie> = self
            .state
            .read()
            .cookies
            .values()
            .filter(|c| c.matches_at(url, now))
            .cloned()
            .collect();

        result.sort_by(|a, b| {
            b.path
                .len()
                .cmp(&a.path.len())
                .then(a.creation_order.cmp(&b.creation_order))
        });
        result
    }

    /// Look up a cookie by its exact key
    pub fn get(&self, name: &str, domain: &str, path: &str) -> Option<Cookie> {
        let key = CookieKey {
            domain: domain.trim_start_matches('.').to_ascii_lowercase(),
            path: path.to_string(),
            name: name.to_string(),
        };
        self.state.read().cookies.get(&key).cloned()
    }

    /// First unexpired cookie named `name` that would be sent to `url`,
    /// ignoring the secure flag
    pub fn get_cookie(&self, name: &str, url: &Url) -> Option<Cookie> {
        let mut probe = url.clone();
        if probe.scheme() == "http" {
            // Upgrading the probe lets secure cookies be read back too
            let _ = probe.set_scheme("https");
        }
        self.matching(&probe).into_iter().find(|c| c.name == name)
    }

    /// Remove a specific cookie
    pub fn remove(&self, name: &str, domain: &str, path: &str) -> Option<Cookie> {
        let key = CookieKey {
            domain: domain.trim_start_matches('.').to_ascii_lowercase(),
            path: path.to_string(),
            name: name.to_string(),
        };
        self.state.write().cookies.remove(&key)
    }

    /// Remove every cookie matching `predicate`, returning how many went
    pub fn clear<F>(&self, mut predicate: F) -> usize
    where
        F: FnMut(&Cookie) -> bool,
    {
        let mut state = self.state.write();
        let before = state.cookies.len();
        state.cookies.retain(|_, c| !predicate(c));
        before - state.cookies.len()
    }

    /// Clear all cookies
    pub fn clear_all(&self) {
        self.state.write().cookies.clear();
    }

    /// Drop expired cookies
    pub fn remove_expired(&self) {
        let now = Utc::now();
        self.state
            .write()
            .cookies
            .retain(|_, c| !c.is_expired_at(now));
    }

    /// Snapshot of every stored cookie in creation order
    pub fn cookies(&self) -> Vec<Cookie> {
        let mut all: Vec<Cookie> = self.state.read().cookies.values().cloned().collect();
        all.sort_by_key(|c| c.creation_order);
        all
    }

    /// Get total cookie count
    pub fn len(&self) -> usize {
        self.state.read().cookies.len()
    }

    /// Check if jar is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
