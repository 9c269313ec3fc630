//! Wire types exchanged between the client, the proxy, and the gateway.
//!
//! Request and response bodies through the proxy are [`Envelope`] JSON objects.
//! The proxy never parses them; only the client and the gateway do.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::error::EnvelopeError;

/// Byte length of the symmetric cipher IV (one AES block).
pub const IV_LEN: usize = 16;

/// Response header the proxy sets when the failure is its own and not the gateway's.
///
/// The proxy's own failures use ordinary statuses (400, 413, 502, 504), and a
/// gateway behind a load balancer can return the same ones. The status alone
/// is not a reliable signal; check for this header.
pub const PROXY_ERROR_HEADER: &str = "x-proxy-error";

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// The hybrid-encrypted wire artifact.
///
/// ```text
/// { "encrypted_data": "<base64>", "encrypted_key": "<base64>", "iv": "<base64>" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Symmetric-cipher output of the padded plaintext.
    pub encrypted_data: String,
    /// Asymmetric-cipher output wrapping the session key.
    pub encrypted_key: String,
    /// IV used for the symmetric cipher. Not secret.
    pub iv: String,
}

/// An [`Envelope`] with every field decoded to raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEnvelope {
    /// Raw symmetric ciphertext.
    pub data: Vec<u8>,
    /// Raw wrapped session key.
    pub wrapped_key: Vec<u8>,
    /// Raw IV.
    pub iv: [u8; IV_LEN],
}

impl Envelope {
    /// Encode raw cipher outputs into wire form.
    pub fn from_raw(data: &[u8], wrapped_key: &[u8], iv: &[u8; IV_LEN]) -> Self {
        Self {
            encrypted_data: STANDARD.encode(data),
            encrypted_key: STANDARD.encode(wrapped_key),
            iv: STANDARD.encode(iv),
        }
    }

    /// Decode all three fields.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::InvalidEnvelope`] if a field is empty, is not
    /// standard base64, or the IV is not [`IV_LEN`] bytes.
    pub fn decode(&self) -> Result<RawEnvelope, EnvelopeError> {
        let data = decode_field("encrypted_data", &self.encrypted_data)?;
        let wrapped_key = decode_field("encrypted_key", &self.encrypted_key)?;
        let iv_bytes = decode_field("iv", &self.iv)?;

        let iv: [u8; IV_LEN] = iv_bytes.as_slice().try_into().map_err(|_| {
            EnvelopeError::InvalidEnvelope(format!(
                "iv must be {IV_LEN} bytes, got {}",
                iv_bytes.len()
            ))
        })?;

        Ok(RawEnvelope {
            data,
            wrapped_key,
            iv,
        })
    }
}

fn decode_field(name: &str, value: &str) -> Result<Vec<u8>, EnvelopeError> {
    let bytes = STANDARD
        .decode(value.trim())
        .map_err(|_| EnvelopeError::InvalidEnvelope(format!("{name} is not valid base64")))?;
    if bytes.is_empty() {
        return Err(EnvelopeError::InvalidEnvelope(format!("{name} is empty")));
    }
    Ok(bytes)
}

// ---------------------------------------------------------------------------
// Key endpoint
// ---------------------------------------------------------------------------

/// Response body of the gateway's public-key endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicKeyResponse {
    /// PEM-armored SubjectPublicKeyInfo.
    pub public_key: String,
}

// ---------------------------------------------------------------------------
// Proxy
// ---------------------------------------------------------------------------

/// Body returned by the proxy when it fails on its own (unreachable, timeout).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyErrorResponse {
    /// Generic description; never includes upstream detail.
    pub error: String,
}

impl ProxyErrorResponse {
    /// Construct a [`ProxyErrorResponse`].
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Response body for the proxy's `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"ok"` while the process is serving.
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Envelope {
        Envelope::from_raw(&[1u8; 32], &[2u8; 256], &[3u8; IV_LEN])
    }

    #[test]
    fn wire_field_names() {
        let json = serde_json::to_value(sample()).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 3);
        assert!(obj.contains_key("encrypted_data"));
        assert!(obj.contains_key("encrypted_key"));
        assert!(obj.contains_key("iv"));
    }

    #[test]
    fn decode_recovers_raw_bytes() {
        let raw = sample().decode().unwrap();
        assert_eq!(raw.data, vec![1u8; 32]);
        assert_eq!(raw.wrapped_key.len(), 256);
        assert_eq!(raw.iv, [3u8; IV_LEN]);
    }

    #[test]
    fn decode_rejects_short_iv() {
        let mut env = sample();
        env.iv = STANDARD.encode([0u8; 8]);
        assert!(matches!(
            env.decode(),
            Err(EnvelopeError::InvalidEnvelope(_))
        ));
    }

    #[test]
    fn decode_rejects_empty_field() {
        let mut env = sample();
        env.encrypted_key = String::new();
        let err = env.decode().unwrap_err();
        assert!(err.to_string().contains("encrypted_key"));
    }

    #[test]
    fn decode_rejects_bad_base64() {
        let mut env = sample();
        env.encrypted_data = "!!not base64!!".into();
        assert!(env.decode().is_err());
    }

    #[test]
    fn missing_field_fails_deserialisation() {
        let res: Result<Envelope, _> =
            serde_json::from_str(r#"{"encrypted_data":"AA==","iv":"AA=="}"#);
        assert!(res.is_err());
    }

    #[test]
    fn public_key_response_serde() {
        let r: PublicKeyResponse =
            serde_json::from_str(r#"{"public_key":"-----BEGIN PUBLIC KEY-----"}"#).unwrap();
        assert!(r.public_key.starts_with("-----BEGIN"));
    }
}
