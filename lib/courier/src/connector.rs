//! HTTPS connector using rustls with the Mozilla root store.

use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::connect::HttpConnector;

/// Create an HTTPS connector that also accepts plain `http://` URLs.
///
/// HTTP/2 is offered through ALPN only when `http2` is set.
#[must_use]
pub fn https_connector(http2: bool) -> HttpsConnector<HttpConnector> {
    let root_store: rustls::RootCertStore =
        webpki_roots::TLS_SERVER_ROOTS.iter().cloned().collect();

    let tls_config = rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    let builder = HttpsConnectorBuilder::new()
        .with_tls_config(tls_config)
        .https_or_http()
        .enable_http1();

    if http2 {
        builder.enable_http2().build()
    } else {
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_connector_with_and_without_http2() {
        let _h2 = https_connector(true);
        let _h1 = https_connector(false);
    }
}
