// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! `Set-Cookie` parsing and `Cookie` header serialization (RFC 6265 section 5.2 / 5.4)

use std::fmt;

use chrono::{DateTime, Duration, TimeZone, Utc};

use super::cookie::SameSite;

/// Attributes parsed from a single `Set-Cookie` header value
///
/// Domain and path are kept as received; resolving them against the
/// request URL is the jar's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCookie {
    pub name: String,
    pub value: String,
    /// `Domain` attribute, lowercased and without a leading dot
    pub domain: Option<String>,
    /// `Path` attribute, only kept when it starts with `/`
    pub path: Option<String>,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: Option<SameSite>,
    pub expires: Option<DateTime<Utc>>,
    /// `Max-Age` in seconds
    pub max_age: Option<i64>,
}

impl SetCookie {
    /// Absolute expiry of the cookie, `None` for a session cookie.
    ///
    /// `Max-Age` wins over `Expires`; a non-positive `Max-Age` means
    /// already expired.
    pub fn expiry(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self.max_age {
            Some(secs) if secs <= 0 => Some(DateTime::<Utc>::MIN_UTC),
            Some(secs) => Some(
                Duration::try_seconds(secs)
                    .and_then(|d| now.checked_add_signed(d))
                    .unwrap_or(DateTime::<Utc>::MAX_UTC),
            ),
            None => self.expires,
        }
    }
}

/// Reason a `Set-Cookie` value was dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CookieParseError {
    /// The name/value pair has no `=`
    MissingEquals,
    /// The cookie name is empty
    EmptyName,
}

impl fmt::Display for CookieParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CookieParseError::MissingEquals => write!(f, "no '=' in cookie pair"),
            CookieParseError::EmptyName => write!(f, "empty cookie name"),
        }
    }
}

impl std::error::Error for CookieParseError {}

/// Parse a raw `Set-Cookie` header value.
///
/// Unknown or malformed attributes are skipped one by one; only a broken
/// name/value pair rejects the whole cookie.
pub fn parse_set_cookie(raw: &str) -> std::result::Result<SetCookie, CookieParseError> {
    let mut parts = raw.split(';');
    let pair = parts.next().unwrap_or_default();

    let (name, value) = pair.split_once('=').ok_or(CookieParseError::MissingEquals)?;
    let name = name.trim();
    if name.is_empty() {
        return Err(CookieParseError::EmptyName);
    }

    let mut cookie = SetCookie {
        name: name.to_string(),
        value: value.trim().to_string(),
        domain: None,
        path: None,
        secure: false,
        http_only: false,
        same_site: None,
        expires: None,
        max_age: None,
    };

    for part in parts {
        let (attr, val) = match part.split_once('=') {
            Some((attr, val)) => (attr.trim(), val.trim()),
            None => (part.trim(), ""),
        };

        match attr.to_ascii_lowercase().as_str() {
            "domain" => {
                let domain = val.trim_start_matches('.');
                if !domain.is_empty() {
                    cookie.domain = Some(domain.to_ascii_lowercase());
                }
            }
            "path" => {
                cookie.path = val.starts_with('/').then(|| val.to_string());
            }
            "expires" => {
                if let Some(date) = parse_cookie_date(val) {
                    cookie.expires = Some(date);
                }
            }
            "max-age" => {
                if let Some(secs) = parse_max_age(val) {
                    cookie.max_age = Some(secs);
                }
            }
            "samesite" => {
                cookie.same_site = match val.to_ascii_lowercase().as_str() {
                    "strict" => Some(SameSite::Strict),
                    "lax" => Some(SameSite::Lax),
                    "none" => Some(SameSite::None),
                    _ => cookie.same_site,
                };
            }
            "secure" => cookie.secure = true,
            "httponly" => cookie.http_only = true,
            _ => {}
        }
    }

    Ok(cookie)
}

/// `Max-Age` must be an optional `-` followed by digits; huge values saturate
fn parse_max_age(val: &str) -> Option<i64> {
    let digits = val.strip_prefix('-').unwrap_or(val);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    match val.parse::<i64>() {
        Ok(secs) => Some(secs),
        Err(_) if val.starts_with('-') => Some(i64::MIN),
        Err(_) => Some(i64::MAX),
    }
}

/// Parse a cookie date using the RFC 6265 section 5.1.1 algorithm.
///
/// Accepts RFC 1123, RFC 850 and asctime forms as well as the many
/// variants servers emit in practice.
pub fn parse_cookie_date(input: &str) -> Option<DateTime<Utc>> {
    let mut time: Option<(u32, u32, u32)> = None;
    let mut day: Option<u32> = None;
    let mut month: Option<u32> = None;
    let mut year: Option<i32> = None;

    for token in input.split(is_date_delimiter).filter(|t| !t.is_empty()) {
        if time.is_none() {
            if let Some(t) = parse_time_token(token) {
                time = Some(t);
                continue;
            }
        }
        if day.is_none() {
            if let Some(d) = leading_number(token, 1, 2) {
                day = Some(d);
                continue;
            }
        }
        if month.is_none() {
            if let Some(m) = parse_month(token) {
                month = Some(m);
                continue;
            }
        }
        if year.is_none() {
            if let Some(y) = leading_number(token, 2, 4) {
                year = Some(y as i32);
                continue;
            }
        }
    }

    let (hour, minute, second) = time?;
    let day = day?;
    let month = month?;
    let year = match year? {
        y @ 70..=99 => y + 1900,
        y @ 0..=69 => y + 2000,
        y => y,
    };

    if !(1..=31).contains(&day) || year < 1601 || hour > 23 || minute > 59 || second > 59 {
        return None;
    }

    Utc.with_ymd_and_hms(year, month, day, hour, minute, second)
        .single()
}

fn is_date_delimiter(c: char) -> bool {
    matches!(c, '\x09' | '\x20'..='\x2f' | '\x3b'..='\x40' | '\x5b'..='\x60' | '\x7b'..='\x7e')
}

/// Leading run of `min..=max` digits, optionally followed by non-digits
fn leading_number(token: &str, min: usize, max: usize) -> Option<u32> {
    let len = token.bytes().take_while(|b| b.is_ascii_digit()).count();
    if len < min || len > max {
        return None;
    }
    token[..len].parse().ok()
}

fn parse_time_token(token: &str) -> Option<(u32, u32, u32)> {
    let mut fields = token.splitn(3, ':');
    let hour = fields.next()?;
    let minute = fields.next()?;
    let second = fields.next()?;

    let exact = |field: &str| {
        let n = leading_number(field, 1, 2)?;
        (field.len() <= 2).then_some(n)
    };
    Some((exact(hour)?, exact(minute)?, leading_number(second, 1, 2)?))
}

fn parse_month(token: &str) -> Option<u32> {
    const MONTHS: [&str; 12] = [
        "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
    ];
    let prefix = token.get(..3)?.to_ascii_lowercase();
    MONTHS
        .iter()
        .position(|m| *m == prefix)
        .map(|i| i as u32 + 1)
}

/// Serialize cookie pairs into a `Cookie` header value, in the given order
pub fn serialize_cookie_header<N, V>(pairs: &[(N, V)]) -> String
where
    N: AsRef<str>,
    V: AsRef<str>,
{
    pairs
        .iter()
        .map(|(name, value)| format!("{}={}", name.as_ref(), value.as_ref()))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Combine a caller-supplied `Cookie` header with the jar's serialized cookies.
///
/// The caller's literal value always comes first and is never replaced.
pub fn compose_cookie_header(literal: Option<&str>, jar: &str) -> Option<String> {
    let literal = literal.map(str::trim).filter(|l| !l.is_empty());
    match (literal, jar.is_empty()) {
        (Some(literal), false) => Some(format!("{}; {}", literal, jar)),
        (Some(literal), true) => Some(literal.to_string()),
        (None, false) => Some(jar.to_string()),
        (None, true) => None,
    }
}
