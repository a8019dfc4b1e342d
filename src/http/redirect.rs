// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Redirect following for a single request chain
//!
//! The controller only decides. It never dispatches, and never touches
//! cookies: the agent re-runs its cookie pipeline for every hop it is
//! handed.

use reqwest::header;
use reqwest::{Method, StatusCode};
use url::Url;

use super::request::Request;
use super::transport::TransportResponse;

/// How a redirect status treats the original method and body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectKind {
    /// 303: always continue with a bodiless GET
    SeeOther,
    /// 307/308: method and body unchanged
    Preserving,
    /// Every other 3xx: keep the method, and the body unless GET/HEAD
    Legacy,
}

impl RedirectKind {
    /// Classify a 3xx status
    pub fn from_status(status: StatusCode) -> Option<Self> {
        match status.as_u16() {
            303 => Some(RedirectKind::SeeOther),
            307 | 308 => Some(RedirectKind::Preserving),
            300..=399 => Some(RedirectKind::Legacy),
            _ => None,
        }
    }
}

/// Method and body decision for the next hop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectAction {
    pub method: Method,
    pub keep_body: bool,
}

/// Next method and whether the body is resent, for a redirect `status`
/// received in reply to `method`
pub fn redirect_action(status: StatusCode, method: &Method) -> Option<RedirectAction> {
    let action = match RedirectKind::from_status(status)? {
        RedirectKind::SeeOther => RedirectAction {
            method: Method::GET,
            keep_body: false,
        },
        RedirectKind::Preserving => RedirectAction {
            method: method.clone(),
            keep_body: true,
        },
        RedirectKind::Legacy => RedirectAction {
            method: method.clone(),
            keep_body: *method != Method::GET && *method != Method::HEAD,
        },
    };
    Some(action)
}

/// Outcome of inspecting one response
#[derive(Debug)]
pub enum Step {
    /// Dispatch this request next
    Follow(Request),
    /// Not a followable redirect; the response is final
    Done,
    /// A redirect arrived with no budget left; the response is final
    Blocked,
}

/// Per-chain redirect state: remaining budget plus visited locations
#[derive(Debug, Clone)]
pub struct RedirectController {
    remaining: u32,
    history: Vec<String>,
}

impl RedirectController {
    /// Start a chain allowed to follow `budget` redirects
    pub fn new(budget: u32) -> Self {
        Self {
            remaining: budget,
            history: Vec::new(),
        }
    }

    /// Redirects still allowed
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// URLs followed so far
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Consume the controller, yielding the redirect history
    pub fn into_history(self) -> Vec<String> {
        self.history
    }

    /// Decide what happens after `response` was received for `request`
    pub fn next(&mut self, request: &Request, response: &TransportResponse) -> Step {
        let Some(action) = redirect_action(response.status, &request.method) else {
            return Step::Done;
        };

        let Some(target) = resolve_location(&request.url, response) else {
            tracing::debug!(
                status = %response.status,
                url = %request.url,
                "Redirect without usable Location, returning it as final"
            );
            return Step::Done;
        };

        if self.remaining == 0 {
            tracing::debug!(
                status = %response.status,
                location = %target,
                "Redirect budget exhausted"
            );
            return Step::Blocked;
        }
        self.remaining -= 1;

        tracing::debug!(
            status = %response.status,
            from = %request.url,
            to = %target,
            method = %action.method,
            remaining = self.remaining,
            "Following redirect"
        );

        self.history.push(target.to_string());
        Step::Follow(next_request(request, target, action))
    }
}

/// Resolve the `Location` header against the URL that produced it
fn resolve_location(current: &Url, response: &TransportResponse) -> Option<Url> {
    let location = response.headers.get(header::LOCATION)?.to_str().ok()?.trim();
    if location.is_empty() {
        return None;
    }
    let target = current.join(location).ok()?;
    matches!(target.scheme(), "http" | "https").then_some(target)
}

fn next_request(previous: &Request, target: Url, action: RedirectAction) -> Request {
    let mut next = previous.clone();

    if previous.url.origin() != target.origin() {
        next.headers.remove(header::AUTHORIZATION);
        next.headers.remove(header::COOKIE);
    }
    next.headers.remove(header::HOST);

    if !action.keep_body {
        next.body = None;
        next.headers.remove(header::CONTENT_TYPE);
        next.headers.remove(header::CONTENT_LENGTH);
    }

    next.method = action.method;
    next.url = target;
    next
}
