//! HTTP client construction with timeouts and a TLS verification toggle

use anyhow::Result;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Client;
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Build the client used for controller API calls.
///
/// `verify_tls: false` accepts self-signed controller certificates, which
/// is how most on-prem Omada installs ship.
pub fn build_client(timeout: Duration, verify_tls: bool) -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    let mut builder = Client::builder()
        .timeout(timeout)
        .connect_timeout(CONNECT_TIMEOUT)
        .default_headers(headers);

    if !verify_tls {
        builder = builder.danger_accept_invalid_certs(true);
    }

    Ok(builder.build()?)
}
