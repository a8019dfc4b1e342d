// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! # Agency - Stateful HTTP Agent
//!
//! An HTTP agent that keeps a private cookie jar and follows redirects on
//! its own, so a sequence of requests behaves like one logged-in client.
//!
//! ## Features
//!
//! - Per-agent cookie jar: RFC 6265 domain, path, secure and expiry rules
//! - Cross-agent isolation: two agents never share cookies
//! - Redirect following with a per-request hop budget and history
//! - 303 / 307 / 308 method and body rules
//! - Pluggable transport, reqwest by default
//!
//! ## Example
//!
//! ```rust,no_run
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let agent = agency::agent()?;
//!
//!     agent
//!         .post("http://localhost:3000/signin")
//!         .form(&[("user", "hunter")])
//!         .send()
//!         .await?;
//!
//!     let res = agent.get("http://localhost:3000/dashboard").send().await?;
//!     println!("{} via {:?}", res.status, res.redirects);
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod http;

// Re-exports for convenience

pub use config::{AgentConfig, DEFAULT_MAX_REDIRECTS};
pub use error::{Error, Result};
pub use http::{agent, Agent, RequestBuilder};
pub use http::{Cookie, CookieJar, SameSite};
pub use http::{Request, Response};
pub use http::{ReqwestTransport, Transport, TransportResponse};

/// Agency version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
