//! Credentials for the vicinity search API
//!
//! The API key travels as a query parameter and in an OAuth 1.0 Authorization
//! header signed with HMAC-SHA1 (RFC 5849, two-legged: no token).

use base64::{engine::general_purpose::STANDARD, Engine};
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use rand::{distributions::Alphanumeric, Rng};
use sha1::Sha1;
use std::fmt;

use crate::net::FetchError;

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "MAPQUEST_API_KEY";
/// Environment variable holding the optional signing secret
pub const SECRET_ENV: &str = "MAPQUEST_SECRET";

/// RFC 3986 unreserved characters are the only ones left unescaped
const OAUTH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

type HmacSha1 = Hmac<Sha1>;

/// API key plus optional signing secret
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: String,
    secret: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, secret: Option<String>) -> Self {
        Self {
            api_key: api_key.into(),
            secret,
        }
    }

    /// Loads credentials from the environment
    ///
    /// Returns `None` when no API key is set. Blank values count as unset.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var(API_KEY_ENV)
            .ok()
            .filter(|key| !key.trim().is_empty())?;
        let secret = std::env::var(SECRET_ENV)
            .ok()
            .filter(|secret| !secret.trim().is_empty());
        Some(Self::new(api_key, secret))
    }

    /// Builds the signed OAuth 1.0 Authorization header for one request
    ///
    /// `url` is the endpoint without its query; `query` holds every parameter
    /// that will be sent, since all of them are covered by the signature.
    pub fn authorization_header(
        &self,
        method: &str,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<String, FetchError> {
        let nonce: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect();
        let timestamp = chrono::Utc::now().timestamp();
        self.authorization_header_with(method, url, query, &nonce, timestamp)
    }

    fn authorization_header_with(
        &self,
        method: &str,
        url: &str,
        query: &[(&str, String)],
        nonce: &str,
        timestamp: i64,
    ) -> Result<String, FetchError> {
        let mut oauth = vec![
            ("oauth_consumer_key", self.api_key.clone()),
            ("oauth_nonce", nonce.to_string()),
            ("oauth_signature_method", "HMAC-SHA1".to_string()),
            ("oauth_timestamp", timestamp.to_string()),
            ("oauth_version", "1.0".to_string()),
        ];

        let params: Vec<(&str, &str)> = query
            .iter()
            .chain(oauth.iter())
            .map(|(name, value)| (*name, value.as_str()))
            .collect();
        let base = signature_base_string(method, url, &params);
        let signature = sign(&base, self.secret.as_deref().unwrap_or_default(), "")?;
        oauth.push(("oauth_signature", signature));

        let fields: Vec<String> = oauth
            .iter()
            .map(|(name, value)| format!("{}=\"{}\"", name, encode(value)))
            .collect();
        Ok(format!("OAuth {}", fields.join(", ")))
    }
}

/// Percent-encodes per RFC 3986, as OAuth requires
fn encode(value: &str) -> String {
    utf8_percent_encode(value, OAUTH_ENCODE_SET).to_string()
}

/// `METHOD&url&params`, with parameters encoded, sorted and joined
fn signature_base_string(method: &str, url: &str, params: &[(&str, &str)]) -> String {
    let mut pairs: Vec<(String, String)> = params
        .iter()
        .map(|(name, value)| (encode(name), encode(value)))
        .collect();
    pairs.sort();

    let normalized = pairs
        .iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect::<Vec<_>>()
        .join("&");
    format!(
        "{}&{}&{}",
        method.to_uppercase(),
        encode(url),
        encode(&normalized)
    )
}

/// Base64 HMAC-SHA1 of `base` keyed with the encoded secrets
fn sign(base: &str, consumer_secret: &str, token_secret: &str) -> Result<String, FetchError> {
    let key = format!("{}&{}", encode(consumer_secret), encode(token_secret));
    let mut mac = HmacSha1::new_from_slice(key.as_bytes()).map_err(|_| FetchError::Signing)?;
    mac.update(base.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const RADIUS_URL: &str = "http://www.mapquestapi.com/search/v2/radius";

    fn radius_query() -> Vec<(&'static str, String)> {
        [
            ("key", "k"),
            ("origin", "48104"),
            ("radius", "10"),
            ("maxMatches", "10"),
            ("ambiguities", "ignore"),
            ("outFormat", "json"),
        ]
        .iter()
        .map(|(k, v)| (*k, v.to_string()))
        .collect()
    }

    #[test]
    fn test_rfc5849_photo_request_vector() {
        // RFC 5849 section 1.2, the signed photo request
        let params = [
            ("file", "vacation.jpg"),
            ("size", "original"),
            ("oauth_consumer_key", "dpf43f3p2l4k3l03"),
            ("oauth_token", "nnch734d00sl2jdk"),
            ("oauth_signature_method", "HMAC-SHA1"),
            ("oauth_timestamp", "137131202"),
            ("oauth_nonce", "chapoH"),
        ];

        let base = signature_base_string("GET", "http://photos.example.net/photos", &params);

        assert_eq!(
            base,
            "GET&http%3A%2F%2Fphotos.example.net%2Fphotos&file%3Dvacation.jpg%26\
             oauth_consumer_key%3Ddpf43f3p2l4k3l03%26oauth_nonce%3DchapoH%26\
             oauth_signature_method%3DHMAC-SHA1%26oauth_timestamp%3D137131202%26\
             oauth_token%3Dnnch734d00sl2jdk%26size%3Doriginal"
        );
        assert_eq!(
            sign(&base, "kd94hf93k423kf44", "pfkkdhi9sl3r4s00").unwrap(),
            "MdpQcU8iPSUjWoN/UDMsK2sui9I="
        );
    }

    #[test]
    fn test_header_is_signed_and_never_carries_the_secret() {
        let credentials = Credentials::new("k", Some("topsecret".to_string()));

        let header = credentials
            .authorization_header_with("GET", RADIUS_URL, &radius_query(), "n", 1)
            .unwrap();

        assert!(header.starts_with("OAuth "));
        assert!(header.contains(r#"oauth_consumer_key="k""#));
        assert!(header.contains(r#"oauth_signature_method="HMAC-SHA1""#));
        assert!(header.contains(r#"oauth_timestamp="1""#));
        assert!(header.contains(r#"oauth_signature="ckGzwjyKcAzVnKrwMQyWMYju22M%3D""#));
        assert!(!header.contains("topsecret"));
    }

    #[test]
    fn test_signature_covers_query_parameters() {
        let credentials = Credentials::new("k", Some("topsecret".to_string()));
        let mut other = radius_query();
        other[1].1 = "49931".to_string();

        let first = credentials
            .authorization_header_with("GET", RADIUS_URL, &radius_query(), "n", 1)
            .unwrap();
        let second = credentials
            .authorization_header_with("GET", RADIUS_URL, &other, "n", 1)
            .unwrap();

        assert_ne!(first, second);
    }

    #[test]
    fn test_encoding_follows_rfc3986() {
        assert_eq!(encode("a b~*/+"), "a%20b~%2A%2F%2B");
        assert_eq!(encode("Az09-._"), "Az09-._");
    }

    #[test]
    fn test_fresh_headers_use_distinct_nonces() {
        let credentials = Credentials::new("abc123", None);

        assert_ne!(
            credentials
                .authorization_header("GET", RADIUS_URL, &radius_query())
                .unwrap(),
            credentials
                .authorization_header("GET", RADIUS_URL, &radius_query())
                .unwrap()
        );
    }

    #[test]
    fn test_debug_redacts_secret() {
        let credentials = Credentials::new("abc123", Some("hunter2".to_string()));

        let debug = format!("{:?}", credentials);

        assert!(debug.contains("abc123"));
        assert!(!debug.contains("hunter2"));
    }
}
