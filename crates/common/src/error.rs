//! Error taxonomy shared by the envelope client and the proxy.

use thiserror::Error;

/// Every failure the envelope transport layer can report to its caller.
///
/// Variants split into three groups:
/// - key acquisition: [`EnvelopeError::KeyUnavailable`] (retryable) and
///   [`EnvelopeError::KeyFormat`] (fix the key material first)
/// - per-message cryptography: [`EnvelopeError::EncryptionFailure`],
///   [`EnvelopeError::UnwrapFailure`], [`EnvelopeError::Padding`],
///   [`EnvelopeError::MalformedPayload`], [`EnvelopeError::InvalidEnvelope`]
/// - transport: [`EnvelopeError::Transport`] (retryable) and
///   [`EnvelopeError::GatewayStatus`]
///
/// `Display` output is for local diagnostics only. Anything crossing a network
/// boundary or shown to a user must go through [`EnvelopeError::public_message`].
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// The key could not be fetched or read (non-2xx response, missing file).
    #[error("key unavailable: {0}")]
    KeyUnavailable(String),

    /// PEM decoding or key import rejected the key material.
    #[error("key format error: {0}")]
    KeyFormat(String),

    /// The cipher rejected inputs that should have been well-formed.
    #[error("encryption failure: {0}")]
    EncryptionFailure(String),

    /// Asymmetric unwrap of the session key failed. Carries no cause on purpose.
    #[error("session key unwrap failed")]
    UnwrapFailure,

    /// The decrypted payload had invalid block padding.
    #[error("invalid padding: {0}")]
    Padding(#[from] PaddingFault),

    /// Decryption succeeded but the plaintext is not valid JSON, or a request
    /// payload could not be serialised.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// An envelope field is missing, empty, not base64, or has the wrong length.
    #[error("invalid envelope: {0}")]
    InvalidEnvelope(String),

    /// The proxy or the network failed before a gateway response was received.
    #[error("transport error: {0}")]
    Transport(String),

    /// The gateway answered with a non-2xx status.
    #[error("gateway responded with status {0}")]
    GatewayStatus(u16),
}

impl EnvelopeError {
    /// Whether repeating the same call may succeed without any other change.
    ///
    /// This layer never retries on its own; the flag is for caller policy.
    pub fn is_retryable(&self) -> bool {
        match self {
            EnvelopeError::KeyUnavailable(_) | EnvelopeError::Transport(_) => true,
            EnvelopeError::GatewayStatus(status) => *status >= 500,
            _ => false,
        }
    }

    /// Short machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            EnvelopeError::KeyUnavailable(_) => "key_unavailable",
            EnvelopeError::KeyFormat(_) => "key_format_error",
            EnvelopeError::EncryptionFailure(_) => "encryption_failure",
            EnvelopeError::UnwrapFailure => "unwrap_failure",
            EnvelopeError::Padding(_) => "padding_error",
            EnvelopeError::MalformedPayload(_) => "malformed_payload",
            EnvelopeError::InvalidEnvelope(_) => "invalid_envelope",
            EnvelopeError::Transport(_) => "transport_error",
            EnvelopeError::GatewayStatus(_) => "gateway_status",
        }
    }

    /// Generic message safe to show to users. Never includes the inner cause.
    pub fn public_message(&self) -> &'static str {
        match self {
            EnvelopeError::KeyUnavailable(_) | EnvelopeError::KeyFormat(_) => {
                "encryption keys are unavailable"
            }
            EnvelopeError::EncryptionFailure(_) => "encryption failed",
            EnvelopeError::UnwrapFailure
            | EnvelopeError::Padding(_)
            | EnvelopeError::MalformedPayload(_)
            | EnvelopeError::InvalidEnvelope(_) => "decryption failed",
            EnvelopeError::Transport(_) | EnvelopeError::GatewayStatus(_) => {
                "gateway unavailable"
            }
        }
    }
}

/// Local-diagnostic detail of a padding failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PaddingFault {
    /// Nothing to unpad.
    #[error("input is empty")]
    Empty,

    /// Input length is not a whole number of blocks.
    #[error("length {len} is not a multiple of block size {block_size}")]
    Misaligned {
        /// Input length in bytes.
        len: usize,
        /// Expected block size in bytes.
        block_size: usize,
    },

    /// The final byte declares a pad length of zero or more than one block.
    #[error("declared pad length {0} is out of range")]
    InvalidLength(u8),

    /// A byte inside the pad region does not equal the declared pad length.
    #[error("pad byte mismatch at offset {0}")]
    Mismatch(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(EnvelopeError::KeyUnavailable("x".into()).is_retryable());
        assert!(EnvelopeError::Transport("x".into()).is_retryable());
        assert!(EnvelopeError::GatewayStatus(503).is_retryable());
        assert!(!EnvelopeError::GatewayStatus(400).is_retryable());
        assert!(!EnvelopeError::KeyFormat("x".into()).is_retryable());
        assert!(!EnvelopeError::UnwrapFailure.is_retryable());
        assert!(!EnvelopeError::Padding(PaddingFault::Empty).is_retryable());
    }

    #[test]
    fn public_message_hides_cause() {
        let e = EnvelopeError::Padding(PaddingFault::Mismatch(13));
        assert_eq!(e.public_message(), "decryption failed");
        assert!(!e.public_message().contains("13"));

        let e = EnvelopeError::KeyUnavailable("GET /api/public-key returned 404".into());
        assert!(!e.public_message().contains("404"));
    }

    #[test]
    fn display_includes_local_detail() {
        let e = EnvelopeError::from(PaddingFault::Misaligned {
            len: 17,
            block_size: 16,
        });
        assert!(e.to_string().contains("17"));
        assert_eq!(e.code(), "padding_error");
    }

    #[test]
    fn unwrap_failure_has_no_detail() {
        assert_eq!(
            EnvelopeError::UnwrapFailure.to_string(),
            "session key unwrap failed"
        );
    }
}
