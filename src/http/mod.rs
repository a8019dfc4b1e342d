// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! HTTP agent layer
//!
//! Cookie jar, header codec, redirect controller and the agent that ties
//! them to a transport.

mod agent;
pub mod codec;
mod cookie;
pub mod redirect;
mod request;
mod response;
mod transport;

pub use agent::{agent, Agent, RequestBuilder};
pub use codec::{parse_set_cookie, serialize_cookie_header, CookieParseError, SetCookie};
pub use cookie::{Cookie, CookieJar, CookieKey, SameSite};
pub use redirect::{redirect_action, RedirectAction, RedirectController, RedirectKind, Step};
pub use request::Request;
pub use response::Response;
pub use transport::{ReqwestTransport, Transport, TransportResponse};

/// Default user agent string
pub const DEFAULT_USER_AGENT: &str = concat!("agency/", env!("CARGO_PKG_VERSION"));

/// Header names used by the agent
pub mod headers {
    pub const AUTHORIZATION: &str = "authorization";
    pub const CONTENT_TYPE: &str = "content-type";
    pub const COOKIE: &str = "cookie";
    pub const LOCATION: &str = "location";
    pub const SET_COOKIE: &str = "set-cookie";
}
