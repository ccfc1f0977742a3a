//! Signed URLs
//!
//! Temporary links carry their parameters in the clear plus two extra
//! query parameters: `expires` (Unix seconds) and `signature`
//! (base64url HMAC-SHA256 over the path and every other parameter).

use thiserror::Error;
use url::{Url, form_urlencoded};
use zeroize::Zeroizing;

use crate::crypto::{from_base64_url, hmac_sha256, hmac_sha256_verify, to_base64_url};

pub const EXPIRES_PARAM: &str = "expires";
pub const SIGNATURE_PARAM: &str = "signature";

/// Resolves relative links in `SignedUrl::parse`
const PARSE_BASE: &str = "http://localhost/";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignedUrlError {
    #[error("Signature parameter is missing")]
    MissingSignature,

    #[error("Signature does not match")]
    InvalidSignature,

    #[error("Link has expired")]
    Expired,

    #[error("Malformed signed parameter: {0}")]
    Malformed(&'static str),
}

/// A path plus its ordered query parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedUrl {
    pub path: String,
    pub params: Vec<(String, String)>,
}

impl SignedUrl {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// `path?k=v&...` with form-urlencoded parameters
    pub fn to_uri(&self) -> String {
        if self.params.is_empty() {
            return self.path.clone();
        }
        let mut query = form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.params {
            query.append_pair(key, value);
        }
        format!("{}?{}", self.path, query.finish())
    }

    /// Inverse of `to_uri`. Accepts a relative link or an absolute one, in
    /// which case scheme and host are dropped.
    pub fn parse(uri: &str) -> Result<Self, SignedUrlError> {
        let url = Url::parse(PARSE_BASE)
            .and_then(|base| base.join(uri))
            .map_err(|_| SignedUrlError::Malformed("uri"))?;

        Ok(Self {
            path: url.path().to_string(),
            params: url.query_pairs().into_owned().collect(),
        })
    }
}

/// Link signer contract
pub trait UrlSigner: Send + Sync {
    /// Append `expires` and `signature` to `params`
    fn sign(&self, path: &str, params: &[(String, String)], expires_at_secs: i64) -> SignedUrl;

    /// Check the signature first, then the expiry
    fn verify(&self, url: &SignedUrl, now_secs: i64) -> Result<(), SignedUrlError>;
}

/// HMAC-SHA256 link signer
pub struct HmacUrlSigner {
    key: Zeroizing<Vec<u8>>,
}

impl HmacUrlSigner {
    pub fn new(key: impl Into<Vec<u8>>) -> Self {
        Self {
            key: Zeroizing::new(key.into()),
        }
    }

    /// Canonical bytes: the path, then every non-signature parameter, each
    /// length-prefixed
    fn canonical(path: &str, params: &[(String, String)]) -> Vec<u8> {
        let mut buf = Vec::new();
        push(&mut buf, path);
        for (k, v) in params.iter().filter(|(k, _)| k != SIGNATURE_PARAM) {
            push(&mut buf, k);
            push(&mut buf, v);
        }
        buf
    }
}

impl std::fmt::Debug for HmacUrlSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacUrlSigner")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl UrlSigner for HmacUrlSigner {
    fn sign(&self, path: &str, params: &[(String, String)], expires_at_secs: i64) -> SignedUrl {
        let mut params: Vec<(String, String)> = params
            .iter()
            .filter(|(k, _)| k != EXPIRES_PARAM && k != SIGNATURE_PARAM)
            .cloned()
            .collect();
        params.push((EXPIRES_PARAM.to_string(), expires_at_secs.to_string()));

        let tag = hmac_sha256(&self.key, &[&Self::canonical(path, &params)]);
        params.push((SIGNATURE_PARAM.to_string(), to_base64_url(&tag)));

        SignedUrl {
            path: path.to_string(),
            params,
        }
    }

    fn verify(&self, url: &SignedUrl, now_secs: i64) -> Result<(), SignedUrlError> {
        let signature = url
            .param(SIGNATURE_PARAM)
            .ok_or(SignedUrlError::MissingSignature)?;
        let tag = from_base64_url(signature).map_err(|_| SignedUrlError::InvalidSignature)?;

        let canonical = Self::canonical(&url.path, &url.params);
        if !hmac_sha256_verify(&self.key, &[&canonical], &tag) {
            return Err(SignedUrlError::InvalidSignature);
        }

        let expires: i64 = url
            .param(EXPIRES_PARAM)
            .ok_or(SignedUrlError::Malformed(EXPIRES_PARAM))?
            .parse()
            .map_err(|_| SignedUrlError::Malformed(EXPIRES_PARAM))?;

        if now_secs >= expires {
            return Err(SignedUrlError::Expired);
        }
        Ok(())
    }
}

fn push(buf: &mut Vec<u8>, part: &str) {
    buf.extend_from_slice(&(part.len() as u64).to_be_bytes());
    buf.extend_from_slice(part.as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> Vec<(String, String)> {
        vec![
            ("id".to_string(), "7".to_string()),
            ("hash".to_string(), "abc".to_string()),
            ("guard".to_string(), "users".to_string()),
        ]
    }

    #[test]
    fn test_sign_then_verify() {
        let signer = HmacUrlSigner::new(b"secret".to_vec());
        let url = signer.sign("/email/verify", &params(), 1_000);

        assert_eq!(url.param("expires"), Some("1000"));
        assert!(url.param("signature").is_some());
        assert_eq!(signer.verify(&url, 999), Ok(()));
    }

    #[test]
    fn test_expired_link() {
        let signer = HmacUrlSigner::new(b"secret".to_vec());
        let url = signer.sign("/email/verify", &params(), 1_000);
        assert_eq!(signer.verify(&url, 1_000), Err(SignedUrlError::Expired));
    }

    #[test]
    fn test_tampered_param_or_path() {
        let signer = HmacUrlSigner::new(b"secret".to_vec());
        let url = signer.sign("/email/verify", &params(), 1_000);

        let mut tampered = url.clone();
        tampered.params[0].1 = "8".to_string();
        assert_eq!(signer.verify(&tampered, 0), Err(SignedUrlError::InvalidSignature));

        let mut moved = url.clone();
        moved.path = "/other".to_string();
        assert_eq!(signer.verify(&moved, 0), Err(SignedUrlError::InvalidSignature));

        let mut extended = url;
        extended.params[3].1 = "9999999999".to_string();
        assert_eq!(signer.verify(&extended, 0), Err(SignedUrlError::InvalidSignature));
    }

    #[test]
    fn test_wrong_key_and_missing_signature() {
        let url = HmacUrlSigner::new(b"secret".to_vec()).sign("/p", &params(), 1_000);
        let other = HmacUrlSigner::new(b"other".to_vec());
        assert_eq!(other.verify(&url, 0), Err(SignedUrlError::InvalidSignature));

        let unsigned = SignedUrl {
            path: "/p".to_string(),
            params: params(),
        };
        assert_eq!(other.verify(&unsigned, 0), Err(SignedUrlError::MissingSignature));
    }

    #[test]
    fn test_to_uri_encodes() {
        let url = SignedUrl {
            path: "/p".to_string(),
            params: vec![("email".to_string(), "a b@c".to_string())],
        };
        assert_eq!(url.to_uri(), "/p?email=a+b%40c");
    }

    #[test]
    fn test_reserved_characters_survive_parse() {
        let signer = HmacUrlSigner::new(b"secret".to_vec());
        let reserved = vec![
            ("email".to_string(), "a&b=c d".to_string()),
            ("next".to_string(), "/x?y=1#z".to_string()),
        ];
        let url = signer.sign("/email/verify", &reserved, 1_000);

        let parsed = SignedUrl::parse(&url.to_uri()).unwrap();
        assert_eq!(parsed, url);
        assert_eq!(parsed.param("email"), Some("a&b=c d"));
        assert_eq!(signer.verify(&parsed, 0), Ok(()));
    }

    #[test]
    fn test_parse_absolute_and_bare_links() {
        let parsed = SignedUrl::parse("https://app.test/email/verify?id=7&hash=abc").unwrap();
        assert_eq!(parsed.path, "/email/verify");
        assert_eq!(parsed.param("id"), Some("7"));

        let bare = SignedUrl::parse("/p").unwrap();
        assert_eq!(bare.path, "/p");
        assert!(bare.params.is_empty());
    }

    #[test]
    fn test_debug_redacts_key() {
        let signer = HmacUrlSigner::new(b"topsecret".to_vec());
        assert!(!format!("{signer:?}").contains("topsecret"));
    }
}
