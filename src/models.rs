//! Data models for the portal login flow

use serde::{Deserialize, Deserializer, Serialize};
use std::time::Instant;

/// One login attempt as submitted by the captive-portal page.
///
/// Field names follow the form payload the Omada redirect hands to the
/// portal. `gatewayMac` and `vid` are accepted but not forwarded anywhere.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub client_mac: String,
    #[serde(default)]
    pub client_ip: Option<String>,
    #[serde(default)]
    pub redirect_url: Option<String>,
    #[serde(default, deserialize_with = "de_radio_id")]
    pub radio_id: u8,
    #[serde(default)]
    pub ap_mac: String,
    #[serde(default)]
    pub ssid_name: String,
    #[serde(default)]
    pub gateway_mac: Option<String>,
    #[serde(default)]
    pub vid: Option<serde_json::Value>,
    #[serde(default)]
    pub site: String,
}

/// The radio id arrives as a number or a string depending on the form.
/// Anything unusable falls back to 0 (2.4 GHz).
fn de_radio_id<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_u64().map(|v| v.min(255) as u8).unwrap_or(0),
        Some(serde_json::Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    })
}

/// JSON body returned to the portal page for every login outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LoginResponse {
    pub fn authenticated(redirect_url: String) -> Self {
        Self {
            success: true,
            message: "Authenticated".to_string(),
            redirect_url: Some(redirect_url),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            redirect_url: None,
            error: None,
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// Short-lived operator session obtained from the controller login.
///
/// Owned by a single orchestration run and discarded after the
/// authorization call; never cached across requests.
#[derive(Debug, Clone)]
pub struct ControllerSession {
    pub csrf_token: String,
    pub session_id: Option<String>,
    pub obtained_at: Instant,
}

/// Everything the controller needs to whitelist one client.
#[derive(Debug, Clone)]
pub struct AccessGrant {
    pub client_mac: String,
    pub ap_mac: String,
    pub ssid_name: String,
    pub radio_id: u8,
    pub site: String,
    pub duration_secs: u32,
}

/// Terminal result of the authorization call. Success requires
/// `error_code == 0`.
#[derive(Debug, Clone)]
pub struct AuthorizationResult {
    pub success: bool,
    pub error_code: i64,
    pub message: String,
}

/// Envelope every Omada API response is wrapped in.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope {
    #[serde(rename = "errorCode")]
    pub error_code: i64,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
}
