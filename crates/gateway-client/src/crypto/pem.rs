//! PEM armor stripping.
//!
//! Only the armor is removed; the label is not checked. Whatever follows is
//! handed to the key importer, which decides whether the DER is acceptable.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use thiserror::Error;

/// Errors produced while decoding PEM text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PemError {
    /// Nothing remained after stripping armor and whitespace.
    #[error("PEM body is empty")]
    Empty,

    /// The body is not valid standard base64.
    #[error("PEM body is not valid base64")]
    InvalidBase64,
}

/// Strip `-----BEGIN ...-----` / `-----END ...-----` lines and all whitespace,
/// then base64-decode the remainder.
///
/// # Errors
///
/// Returns [`PemError::Empty`] if no body remains and
/// [`PemError::InvalidBase64`] if the body does not decode.
pub fn decode(pem: &str) -> Result<Vec<u8>, PemError> {
    let body: String = strip_armor(pem)
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    if body.is_empty() {
        return Err(PemError::Empty);
    }
    STANDARD.decode(body).map_err(|_| PemError::InvalidBase64)
}

/// Remove every `-----BEGIN <label>-----` and `-----END <label>-----` marker,
/// wherever it sits in the text.
fn strip_armor(pem: &str) -> String {
    let mut out = String::with_capacity(pem.len());
    let mut rest = pem;
    while let Some(start) = rest.find("-----") {
        let after = &rest[start + 5..];
        let is_marker = after.starts_with("BEGIN ") || after.starts_with("END ");
        let close = after.find("-----");
        match (is_marker, close) {
            (true, Some(end)) => {
                out.push_str(&rest[..start]);
                rest = &after[end + 5..];
            }
            _ => {
                out.push_str(&rest[..start + 5]);
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
