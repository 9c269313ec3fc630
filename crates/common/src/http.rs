//! Shared hyper client used by the gateway client and the proxy.
//!
//! Speaks plain HTTP and HTTPS (rustls, ring provider, webpki roots). The
//! provider is chosen explicitly so no process-wide default has to be installed.

use std::sync::Arc;

use bytes::Bytes;
use http_body_util::Full;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use rustls::{ClientConfig, RootCertStore};

/// Request body type used by [`HttpClient`].
pub type RequestBody = Full<Bytes>;

/// Pooled HTTP/HTTPS client.
pub type HttpClient = Client<HttpsConnector<HttpConnector>, RequestBody>;

/// Build an [`HttpClient`] that accepts both `http://` and `https://` URIs.
///
/// # Errors
///
/// Returns an error if rustls rejects the protocol-version configuration.
pub fn build_client() -> Result<HttpClient, rustls::Error> {
    let mut roots = RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let tls = ClientConfig::builder_with_provider(Arc::new(
        rustls::crypto::ring::default_provider(),
    ))
    .with_safe_default_protocol_versions()?
    .with_root_certificates(roots)
    .with_no_client_auth();

    let mut http = HttpConnector::new();
    http.enforce_http(false);

    let https = HttpsConnectorBuilder::new()
        .with_tls_config(tls)
        .https_or_http()
        .enable_http1()
        .wrap_connector(http);

    Ok(Client::builder(TokioExecutor::new()).build(https))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn builds_client() {
        assert!(build_client().is_ok());
    }
}
