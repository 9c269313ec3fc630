//! Fixed RSA-2048 key pairs for tests.

use std::path::PathBuf;

pub const GATEWAY_PUBLIC_KEY: &str = include_str!("../tests/fixtures/gateway_public_key.pem");
pub const GATEWAY_PRIVATE_KEY: &str = include_str!("../tests/fixtures/gateway_private_key.pem");
pub const CLIENT_PUBLIC_KEY: &str = include_str!("../tests/fixtures/client_public_key.pem");
pub const CLIENT_PRIVATE_KEY: &str = include_str!("../tests/fixtures/client_private_key.pem");
pub const CLIENT_PRIVATE_KEY_PKCS1: &str =
    include_str!("../tests/fixtures/client_private_key_pkcs1.pem");
pub const EC_PUBLIC_KEY: &str = include_str!("../tests/fixtures/ec_public_key.pem");

/// Absolute path of a file under `tests/fixtures`.
pub fn path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}
