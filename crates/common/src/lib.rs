//! Types, wire protocol, errors, and HTTP plumbing shared by the gateway
//! client and the pass-through proxy.

pub mod error;
pub mod http;
pub mod protocol;

pub use error::{EnvelopeError, PaddingFault};
pub use protocol::{Envelope, RawEnvelope};
