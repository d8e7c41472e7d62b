//! HMAC-SHA256 signatures.
//!
//! The WebSocket `login` call signs the nonce alone:
//! ```text
//! base64(HMAC-SHA256(api_secret, nonce))
//! ```
//!
//! Private REST requests sign the nonce, the HTTP method, the path with its query
//! string and the body:
//! ```text
//! base64(HMAC-SHA256(api_secret, nonce + METHOD + path_and_query + body))
//! ```

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::auth::Credentials;
use crate::error::ClientError;

type HmacSha256 = Hmac<Sha256>;

/// Algorithm name sent in the `login` parameters.
pub const LOGIN_ALGORITHM: &str = "HS256";

/// Sign the nonce of a WebSocket `login` request.
///
/// # Example
///
/// ```rust
/// use exchange_stream_client::auth::{Credentials, sign_login};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let credentials = Credentials::new("api_key", "api_secret");
/// let signature = sign_login(&credentials, "1700000000000")?;
/// assert_eq!(signature.len(), 44);
/// # Ok(())
/// # }
/// ```
pub fn sign_login(credentials: &Credentials, nonce: &str) -> Result<String, ClientError> {
    let mut mac = hmac_for(credentials)?;
    mac.update(nonce.as_bytes());
    Ok(BASE64.encode(mac.finalize().into_bytes()))
}

/// Sign a private REST request.
///
/// # Arguments
///
/// * `credentials` - API credentials containing the secret
/// * `method` - HTTP method, upper case (e.g. "GET")
/// * `path_and_query` - Request path including the query string, if any
/// * `nonce` - The nonce value for this request
/// * `body` - The request body, empty for GET
pub fn sign_request(
    credentials: &Credentials,
    method: &str,
    path_and_query: &str,
    nonce: u64,
    body: &str,
) -> Result<String, ClientError> {
    let mut mac = hmac_for(credentials)?;
    mac.update(nonce.to_string().as_bytes());
    mac.update(method.to_ascii_uppercase().as_bytes());
    mac.update(path_and_query.as_bytes());
    mac.update(body.as_bytes());
    Ok(BASE64.encode(mac.finalize().into_bytes()))
}

fn hmac_for(credentials: &Credentials) -> Result<HmacSha256, ClientError> {
    let secret = credentials.expose_secret();
    if secret.is_empty() {
        return Err(ClientError::Auth("API secret must not be empty".to_string()));
    }
    HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| ClientError::Auth(format!("Invalid HMAC key: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_signature_shape() {
        let credentials = Credentials::new("key", "secret");
        let signature = sign_login(&credentials, "12345").unwrap();

        // HMAC-SHA256 produces 32 bytes, base64 encoded = 44 chars (with padding)
        assert_eq!(signature.len(), 44);
        assert!(BASE64.decode(&signature).is_ok());
    }

    #[test]
    fn test_login_signature_changes_with_nonce() {
        let credentials = Credentials::new("key", "secret");
        let sig1 = sign_login(&credentials, "12345").unwrap();
        let sig2 = sign_login(&credentials, "12346").unwrap();
        assert_ne!(sig1, sig2);
        assert_eq!(sig1, sign_login(&credentials, "12345").unwrap());
    }

    #[test]
    fn test_request_signature_covers_method_and_path() {
        let credentials = Credentials::new("key", "secret");

        let get = sign_request(&credentials, "GET", "/api/trading/balance", 1, "").unwrap();
        let lower = sign_request(&credentials, "get", "/api/trading/balance", 1, "").unwrap();
        let other_path = sign_request(&credentials, "GET", "/api/order", 1, "").unwrap();
        let other_nonce = sign_request(&credentials, "GET", "/api/trading/balance", 2, "").unwrap();

        assert_eq!(get, lower);
        assert_ne!(get, other_path);
        assert_ne!(get, other_nonce);
    }

    #[test]
    fn test_empty_secret_rejected() {
        let credentials = Credentials::new("key", "");
        assert!(matches!(
            sign_login(&credentials, "1"),
            Err(ClientError::Auth(_))
        ));
    }
}
