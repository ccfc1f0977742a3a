//! Request Signatures
//!
//! A signature identifies "who is doing what from where" for throttling.
//! It is a namespace, an ordered list of `(key, value)` pairs and an optional
//! principal, reduced to a SHA-256 hex digest.
//!
//! Every component is length-prefixed before hashing, so `("ab", "c")` and
//! `("a", "bc")` never produce the same digest.

use axum::http::{HeaderMap, header};
use std::net::IpAddr;

use crate::crypto::sha256_hex;

/// Placeholder principal component for anonymous requests
pub const GUEST: &str = "guest";

/// Anything that can stand in as the principal of a signature
pub trait SignatureSubject {
    /// Stable identity, unique within the principal's guard
    fn signature_id(&self) -> String;

    /// Guard (principal type) name
    fn signature_guard(&self) -> &str;
}

/// Builder for a request signature
///
/// ```rust
/// use platform::signature::RequestSignature;
///
/// let a = RequestSignature::new("register").data("ip", "10.0.0.1").hash();
/// let b = RequestSignature::new("register").data("ip", "10.0.0.1").hash();
/// assert_eq!(a, b);
/// assert_eq!(a.len(), 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSignature {
    namespace: String,
    data: Vec<(String, String)>,
    principal: Option<(String, String)>,
}

impl RequestSignature {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            data: Vec::new(),
            principal: None,
        }
    }

    /// Signature seeded with the client's IP address and user agent
    pub fn for_client(namespace: impl Into<String>, client: &ClientInfo) -> Self {
        Self::new(namespace)
            .data("ip", client.ip_string())
            .data("user_agent", client.user_agent.as_deref().unwrap_or_default())
    }

    /// Set `key` to `value`; overwriting keeps the key's first position
    pub fn data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.data.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.data.push((key, value)),
        }
        self
    }

    /// Bind the signature to a principal; `None` binds it to [`GUEST`]
    pub fn principal(mut self, subject: Option<&dyn SignatureSubject>) -> Self {
        self.principal =
            subject.map(|s| (s.signature_guard().to_string(), s.signature_id()));
        self
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// 64 lowercase hex characters
    pub fn hash(&self) -> String {
        let mut buf = Vec::with_capacity(128);

        push_component(&mut buf, &self.namespace);
        buf.extend_from_slice(&(self.data.len() as u64).to_be_bytes());
        for (key, value) in &self.data {
            push_component(&mut buf, key);
            push_component(&mut buf, value);
        }
        match &self.principal {
            Some((guard, id)) => {
                buf.push(1);
                push_component(&mut buf, guard);
                push_component(&mut buf, id);
            }
            None => {
                buf.push(0);
                push_component(&mut buf, GUEST);
            }
        }

        sha256_hex(&buf)
    }
}

fn push_component(buf: &mut Vec<u8>, part: &str) {
    buf.extend_from_slice(&(part.len() as u64).to_be_bytes());
    buf.extend_from_slice(part.as_bytes());
}

// ============================================================================
// Client metadata
// ============================================================================

/// Request metadata that feeds default signature data
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    pub ip: Option<IpAddr>,
    pub user_agent: Option<String>,
}

impl ClientInfo {
    pub fn new(ip: Option<IpAddr>, user_agent: Option<String>) -> Self {
        Self { ip, user_agent }
    }

    /// Extract client metadata from request headers
    ///
    /// ## Arguments
    /// * `headers` - HTTP request headers
    /// * `direct_ip` - Peer address of the connection
    pub fn from_headers(headers: &HeaderMap, direct_ip: Option<IpAddr>) -> Self {
        let user_agent = headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        Self {
            ip: extract_client_ip(headers, direct_ip),
            user_agent,
        }
    }

    /// IP as string, empty when unknown
    pub fn ip_string(&self) -> String {
        self.ip.map(|ip| ip.to_string()).unwrap_or_default()
    }
}

/// Extract client IP address from headers
///
/// Checks X-Forwarded-For header first (for reverse proxy setups),
/// then falls back to direct connection IP.
///
/// ## Arguments
/// * `headers` - HTTP request headers
/// * `direct_ip` - Direct connection IP address
///
/// ## Returns
/// The client IP address, or None if not determinable
pub fn extract_client_ip(headers: &HeaderMap, direct_ip: Option<IpAddr>) -> Option<IpAddr> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|xff| xff.split(',').next())
        .and_then(|first| first.trim().parse::<IpAddr>().ok())
        .or(direct_ip)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    struct User(&'static str);

    impl SignatureSubject for User {
        fn signature_id(&self) -> String {
            self.0.to_string()
        }

        fn signature_guard(&self) -> &str {
            "users"
        }
    }

    #[test]
    fn test_same_inputs_same_hash() {
        let user = User("42");
        let build = || {
            RequestSignature::new("password")
                .data("ip", "10.0.0.1")
                .principal(Some(&user))
                .hash()
        };
        assert_eq!(build(), build());
    }

    #[test]
    fn test_every_component_changes_hash() {
        let base = RequestSignature::new("ns").data("a", "1");
        let h = base.clone().hash();

        assert_ne!(h, RequestSignature::new("other").data("a", "1").hash());
        assert_ne!(h, base.clone().data("a", "2").hash());
        assert_ne!(h, base.clone().data("b", "1").hash());
        assert_ne!(h, base.clone().principal(Some(&User("1"))).hash());
        assert_ne!(
            base.clone().principal(Some(&User("1"))).hash(),
            base.principal(Some(&User("2"))).hash()
        );
    }

    #[test]
    fn test_concatenation_does_not_collide() {
        let a = RequestSignature::new("ns").data("ab", "c").hash();
        let b = RequestSignature::new("ns").data("a", "bc").hash();
        assert_ne!(a, b);
    }

    #[test]
    fn test_guest_placeholder_differs_from_principal_named_guest() {
        let anon = RequestSignature::new("ns").principal(None).hash();
        assert_eq!(anon, RequestSignature::new("ns").hash());
        assert_ne!(anon, RequestSignature::new("ns").principal(Some(&User("guest"))).hash());
    }

    #[test]
    fn test_overwrite_keeps_position() {
        let overwritten = RequestSignature::new("ns")
            .data("a", "0")
            .data("b", "2")
            .data("a", "1")
            .hash();
        let direct = RequestSignature::new("ns").data("a", "1").data("b", "2").hash();
        let reordered = RequestSignature::new("ns").data("b", "2").data("a", "1").hash();

        assert_eq!(overwritten, direct);
        assert_ne!(overwritten, reordered);
    }

    #[test]
    fn test_for_client_seeds_ip_and_agent() {
        let client = ClientInfo::new(Some("10.0.0.1".parse().unwrap()), Some("agent".into()));
        let seeded = RequestSignature::for_client("ns", &client).hash();
        let manual = RequestSignature::new("ns")
            .data("ip", "10.0.0.1")
            .data("user_agent", "agent")
            .hash();
        assert_eq!(seeded, manual);
    }

    #[test]
    fn test_client_info_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(header::USER_AGENT, HeaderValue::from_static("Mozilla/5.0 Test Browser"));
        let info = ClientInfo::from_headers(&headers, Some("127.0.0.1".parse().unwrap()));

        assert_eq!(info.user_agent.as_deref(), Some("Mozilla/5.0 Test Browser"));
        assert_eq!(info.ip_string(), "127.0.0.1");
        assert_eq!(ClientInfo::default().ip_string(), "");
    }

    #[test]
    fn test_extract_client_ip_xff() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("192.168.1.1, 10.0.0.1"),
        );

        let ip = extract_client_ip(&headers, None);
        assert_eq!(ip, Some("192.168.1.1".parse().unwrap()));
    }

    #[test]
    fn test_extract_client_ip_direct() {
        let headers = HeaderMap::new();
        let direct: IpAddr = "127.0.0.1".parse().unwrap();

        let ip = extract_client_ip(&headers, Some(direct));
        assert_eq!(ip, Some(direct));
    }
}
