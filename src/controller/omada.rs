//! TP-Link Omada controller client (hotspot external-portal API, v5.x)
//!
//! Two calls: an operator login that returns a CSRF token in the JSON body
//! and a session id in a `TPOMADA_SESSIONID` cookie, then the extPortal
//! authorization that needs all three of token-as-query-parameter,
//! token-as-header and session cookie.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, COOKIE, SET_COOKIE};
use std::time::{Duration, Instant};

use crate::config::OmadaConfig;
use crate::controller::WirelessController;
use crate::error::PortalError;
use crate::http::build_client;
use crate::models::{AccessGrant, ApiEnvelope, AuthorizationResult, ControllerSession};

const SESSION_COOKIE: &str = "TPOMADA_SESSIONID";
/// authType for External Portal Server authorization.
const AUTH_TYPE_EXTERNAL_PORTAL: u32 = 4;

pub struct OmadaClient {
    config: OmadaConfig,
    base_url: String,
    client: reqwest::Client,
}

impl OmadaClient {
    pub fn new(config: OmadaConfig) -> Result<Self> {
        let base_url = config.base_url();
        Self::with_base_url(config, base_url)
    }

    /// Point the client at an explicit base URL (plain-HTTP lab and test
    /// controllers).
    pub fn with_base_url(config: OmadaConfig, base_url: impl Into<String>) -> Result<Self> {
        let client = build_client(Duration::from_secs(config.timeout_secs), config.verify_tls)?;
        Ok(Self {
            config,
            base_url: base_url.into(),
            client,
        })
    }
}

/// Take the value of the first Set-Cookie entry whose cookie name matches
/// `name` exactly. Cookie attributes after the first `;` are ignored.
fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|raw| {
            let pair = raw.split(';').next()?;
            let (cookie_name, cookie_value) = pair.split_once('=')?;
            (cookie_name.trim() == name).then(|| cookie_value.trim().to_string())
        })
}

#[async_trait]
impl WirelessController for OmadaClient {
    fn name(&self) -> &str {
        "Omada"
    }

    async fn login(&self) -> Result<ControllerSession, PortalError> {
        let url = format!("{}/api/v2/hotspot/login", self.base_url);
        tracing::info!(url = %url, "logging into Omada controller");

        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({
                "name": self.config.operator_username,
                "password": self.config.operator_password,
            }))
            .send()
            .await?;

        let status = response.status();
        let session_id = extract_cookie(response.headers(), SESSION_COOKIE);
        let raw = response.text().await?;

        // Parse the body regardless of HTTP status so structured error
        // codes surface even on non-2xx.
        let envelope: ApiEnvelope =
            serde_json::from_str(&raw).map_err(|e| PortalError::ControllerProtocol {
                detail: format!("login body is not the expected JSON envelope: {e}"),
                raw: raw.clone(),
            })?;

        if !status.is_success() {
            return Err(PortalError::ControllerNetwork {
                detail: format!("Omada login network error: HTTP {status}"),
                status: Some(status.as_u16()),
                body: Some(raw),
            });
        }

        if session_id.is_none() {
            tracing::warn!(
                "{SESSION_COOKIE} cookie not found in login response; \
                 the authorization call will be refused without it"
            );
        }

        if envelope.error_code == 0 {
            let token = envelope
                .result
                .as_ref()
                .and_then(|r| r.get("token"))
                .and_then(|t| t.as_str());
            match token {
                Some(token) => {
                    tracing::info!("Omada controller login successful, CSRF token obtained");
                    Ok(ControllerSession {
                        csrf_token: token.to_string(),
                        session_id,
                        obtained_at: Instant::now(),
                    })
                }
                None => Err(PortalError::ControllerApi {
                    code: 0,
                    message: "login reported success but returned no token".to_string(),
                }),
            }
        } else {
            Err(PortalError::ControllerApi {
                code: envelope.error_code,
                message: envelope
                    .msg
                    .unwrap_or_else(|| "Unknown login error".to_string()),
            })
        }
    }

    async fn authorize(
        &self,
        grant: &AccessGrant,
        session: &ControllerSession,
    ) -> Result<AuthorizationResult, PortalError> {
        // The call is meaningless without a session cookie; fail before
        // touching the network.
        let session_id = match session.session_id.as_deref().filter(|s| !s.is_empty()) {
            Some(sid) => sid,
            None => {
                return Err(PortalError::ControllerApi {
                    code: 1,
                    message: format!("Missing {SESSION_COOKIE} for Omada authorization."),
                })
            }
        };

        let url = format!("{}/api/v2/hotspot/extPortal/auth", self.base_url);
        let payload = serde_json::json!({
            "clientMac": grant.client_mac,
            "apMac": grant.ap_mac,
            "ssidName": grant.ssid_name,
            "radioId": grant.radio_id,
            "site": grant.site,
            "authType": AUTH_TYPE_EXTERNAL_PORTAL,
            "time": grant.duration_secs,
        });
        tracing::info!(
            client_mac = %grant.client_mac,
            ap_mac = %grant.ap_mac,
            ssid = %grant.ssid_name,
            site = %grant.site,
            "sending authorization to Omada controller"
        );

        let response = self
            .client
            .post(&url)
            .query(&[("token", session.csrf_token.as_str())])
            .header(COOKIE, format!("{SESSION_COOKIE}={session_id}"))
            .header("Csrf-Token", &session.csrf_token)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        // Read the body once as text, then parse.
        let raw = response.text().await?;
        let envelope: ApiEnvelope =
            serde_json::from_str(&raw).map_err(|e| PortalError::ControllerProtocol {
                detail: format!("authorization body is not the expected JSON envelope: {e}"),
                raw: raw.clone(),
            })?;

        if !status.is_success() {
            return Err(PortalError::ControllerNetwork {
                detail: format!("Omada API network error: HTTP {status}"),
                status: Some(status.as_u16()),
                body: Some(raw),
            });
        }

        if envelope.error_code == 0 {
            tracing::info!(client_mac = %grant.client_mac, "Omada authorization successful");
            Ok(AuthorizationResult {
                success: true,
                error_code: 0,
                message: envelope.msg.unwrap_or_default(),
            })
        } else {
            Err(PortalError::ControllerApi {
                code: envelope.error_code,
                message: envelope
                    .msg
                    .unwrap_or_else(|| "Unknown Omada error".to_string()),
            })
        }
    }
}
