//! Caller Context
//!
//! Identity of whoever made a JSON-RPC call, extracted from the HTTP request.
//! It is handed to every method handler and attached to every logged error.
//!
//! # Token Handling
//!
//! - The token is read from the `Authorization` header; `OAuth ` and
//!   `Bearer ` prefixes are stripped
//! - Tokens are never validated here: that belongs to the remote auth service
//! - Legacy tokens of the form `un=<user>|tokenid=...|...` yield a user id
//! - Tokens are masked in `Display` output so they never reach the logs
//!
//! # Client Address
//!
//! The first `X-Forwarded-For` entry wins, then `X-Real-IP`, then the peer
//! socket address. Deployments not behind a proxy can turn header trust off.
//!
//! # Example
//!
//! ```
//! use fbarpc_server::context::CallContext;
//!
//! let ctx = CallContext::anonymous().with_token("un=alice|tokenid=42|expiry=1");
//! assert_eq!(ctx.user_id.as_deref(), Some("alice"));
//! assert_eq!(ctx.caller(), "alice");
//! ```

use hyper::header::AUTHORIZATION;
use hyper::HeaderMap;
use std::fmt;
use std::net::SocketAddr;

const FORWARDED_FOR: &str = "x-forwarded-for";
const REAL_IP: &str = "x-real-ip";

/// Identity and origin of a single call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CallContext {
    /// Fully qualified method name, filled in by the router
    pub method: String,
    pub token: Option<String>,
    pub user_id: Option<String>,
    pub client_ip: Option<String>,
}

impl CallContext {
    /// A context with no token and no known origin.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Builds a context from request headers and the peer address.
    pub fn from_headers(headers: &HeaderMap, peer: Option<SocketAddr>, trust_ip_headers: bool) -> Self {
        let token = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(extract_token);

        let header_ip = if trust_ip_headers {
            header_str(headers, FORWARDED_FOR)
                .and_then(|value| value.split(',').next())
                .map(str::trim)
                .filter(|ip| !ip.is_empty())
                .or_else(|| header_str(headers, REAL_IP).map(str::trim))
                .map(str::to_string)
        } else {
            None
        };
        let client_ip = header_ip.or_else(|| peer.map(|addr| addr.ip().to_string()));

        let mut ctx = Self {
            client_ip,
            ..Self::default()
        };
        if let Some(token) = token {
            ctx = ctx.with_token(token);
        }
        ctx
    }

    /// Attaches a token and derives the user id from it.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.user_id = user_from_token(&token);
        self.token = Some(token);
        self
    }

    pub fn with_client_ip(mut self, ip: impl Into<String>) -> Self {
        self.client_ip = Some(ip.into());
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// User id for logging, `anonymous` when unknown.
    pub fn caller(&self) -> &str {
        self.user_id.as_deref().unwrap_or("anonymous")
    }
}

impl fmt::Display for CallContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "user={} ip={} token={}",
            self.caller(),
            self.client_ip.as_deref().unwrap_or("-"),
            if self.token.is_some() { "*****" } else { "none" }
        )
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

/// Strips an optional `OAuth`/`Bearer` scheme from an `Authorization` value.
///
/// ```
/// use fbarpc_server::context::extract_token;
///
/// assert_eq!(extract_token("Bearer abc"), Some("abc".to_string()));
/// assert_eq!(extract_token("abc"), Some("abc".to_string()));
/// assert_eq!(extract_token("  "), None);
/// ```
pub fn extract_token(header_value: &str) -> Option<String> {
    let value = header_value.trim();
    let token = ["OAuth ", "Bearer "]
        .iter()
        .find_map(|scheme| value.strip_prefix(scheme))
        .unwrap_or(value)
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Reads the `un=` field of a legacy pipe-delimited token.
pub fn user_from_token(token: &str) -> Option<String> {
    token
        .split('|')
        .find_map(|field| field.strip_prefix("un="))
        .filter(|user| !user.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::header::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    fn peer() -> Option<SocketAddr> {
        Some("10.0.0.5:40000".parse().unwrap())
    }

    #[test]
    fn test_token_and_user_from_authorization_header() {
        let ctx = CallContext::from_headers(
            &headers(&[("authorization", "OAuth un=chenry|tokenid=abc|expiry=99")]),
            peer(),
            true,
        );
        assert_eq!(ctx.token.as_deref(), Some("un=chenry|tokenid=abc|expiry=99"));
        assert_eq!(ctx.user_id.as_deref(), Some("chenry"));
        assert!(ctx.is_authenticated());
    }

    #[test]
    fn test_opaque_token_has_no_user() {
        let ctx = CallContext::anonymous().with_token("ABCDEF123");
        assert!(ctx.is_authenticated());
        assert_eq!(ctx.user_id, None);
        assert_eq!(ctx.caller(), "anonymous");
    }

    #[test]
    fn test_forwarded_for_takes_first_entry() {
        let ctx = CallContext::from_headers(
            &headers(&[("x-forwarded-for", "192.168.1.1, 10.1.1.1"), ("x-real-ip", "172.16.0.1")]),
            peer(),
            true,
        );
        assert_eq!(ctx.client_ip.as_deref(), Some("192.168.1.1"));
    }

    #[test]
    fn test_real_ip_then_peer() {
        let ctx = CallContext::from_headers(&headers(&[("x-real-ip", "172.16.0.1")]), peer(), true);
        assert_eq!(ctx.client_ip.as_deref(), Some("172.16.0.1"));

        let ctx = CallContext::from_headers(&HeaderMap::new(), peer(), true);
        assert_eq!(ctx.client_ip.as_deref(), Some("10.0.0.5"));
    }

    #[test]
    fn test_untrusted_ip_headers_are_ignored() {
        let ctx = CallContext::from_headers(
            &headers(&[("x-forwarded-for", "192.168.1.1")]),
            peer(),
            false,
        );
        assert_eq!(ctx.client_ip.as_deref(), Some("10.0.0.5"));
    }

    #[test]
    fn test_display_masks_token() {
        let ctx = CallContext::anonymous()
            .with_token("un=alice|tokenid=secret")
            .with_client_ip("127.0.0.1");
        let shown = ctx.to_string();
        assert_eq!(shown, "user=alice ip=127.0.0.1 token=*****");
        assert!(!shown.contains("secret"));
    }
}
