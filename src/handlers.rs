//! Request orchestration: validate the submission, then RADIUS, controller
//! login and controller authorization in sequence
//!
//! Any stage failure short-circuits the chain; the error is logged with
//! username and MAC context here and rendered by `PortalError`'s
//! `IntoResponse`.

use axum::extract::State;
use axum::response::Json;
use std::sync::Arc;

use crate::config::Config;
use crate::controller::{OmadaClient, WirelessController};
use crate::error::PortalError;
use crate::models::{AccessGrant, AuthRequest, LoginResponse};
use crate::radius::{RadiusAuthenticator, RadiusClient};

/// Site used when the form does not carry one.
const DEFAULT_SITE: &str = "Default";

#[derive(Clone)]
pub struct AppState {
    pub radius: Arc<dyn RadiusAuthenticator>,
    pub controller: Arc<dyn WirelessController>,
    pub auth_duration_secs: u32,
    pub fallback_redirect: String,
}

impl AppState {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            radius: Arc::new(RadiusClient::new(&config.radius)?),
            controller: Arc::new(OmadaClient::new(config.omada.clone())?),
            auth_duration_secs: config.omada.auth_duration_secs,
            fallback_redirect: config.server.fallback_redirect.clone(),
        })
    }
}

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Username/password login for the Omada captive portal.
pub async fn omada_username_login(
    State(state): State<AppState>,
    Json(request): Json<AuthRequest>,
) -> Result<Json<LoginResponse>, PortalError> {
    match run_login_chain(&state, &request).await {
        Ok(redirect_url) => {
            tracing::info!(
                username = %request.username,
                client_mac = %request.client_mac,
                redirect = %redirect_url,
                "login complete, redirecting client"
            );
            Ok(Json(LoginResponse::authenticated(redirect_url)))
        }
        Err(err) => {
            tracing::error!(
                username = %request.username,
                client_mac = %request.client_mac,
                error = %err,
                "authentication error"
            );
            Err(err)
        }
    }
}

/// Alternate vendor login. Not implemented.
pub async fn aruba_username_login() -> PortalError {
    PortalError::Unimplemented("Aruba")
}

async fn run_login_chain(state: &AppState, request: &AuthRequest) -> Result<String, PortalError> {
    validate(request)?;
    let site = if request.site.is_empty() {
        DEFAULT_SITE
    } else {
        request.site.as_str()
    };

    let accepted = state
        .radius
        .authenticate(
            &request.username,
            &request.password,
            &request.client_mac,
            request.client_ip.as_deref(),
        )
        .await?;
    if !accepted {
        tracing::warn!(username = %request.username, "RADIUS authentication failed");
        return Err(PortalError::BadCredentials);
    }
    tracing::info!(username = %request.username, "RADIUS authentication successful");

    let session = state.controller.login().await?;

    let grant = AccessGrant {
        client_mac: request.client_mac.clone(),
        ap_mac: request.ap_mac.clone(),
        ssid_name: request.ssid_name.clone(),
        radio_id: request.radio_id,
        site: site.to_string(),
        duration_secs: state.auth_duration_secs,
    };
    state.controller.authorize(&grant, &session).await?;
    tracing::info!(
        client_mac = %request.client_mac,
        controller = state.controller.name(),
        "controller authorized client"
    );

    Ok(resolve_redirect(
        request.redirect_url.as_deref(),
        &state.fallback_redirect,
    ))
}

fn validate(request: &AuthRequest) -> Result<(), PortalError> {
    let mut missing = Vec::new();
    if request.username.is_empty() {
        missing.push("username");
    }
    if request.password.is_empty() {
        missing.push("password");
    }
    if request.client_mac.is_empty() {
        missing.push("clientMac");
    }
    if request.ap_mac.is_empty() {
        missing.push("apMac");
    }
    if request.ssid_name.is_empty() {
        missing.push("ssidName");
    }
    if missing.is_empty() {
        Ok(())
    } else {
        tracing::error!(?missing, "missing required authentication parameters");
        Err(PortalError::Validation { missing })
    }
}

/// Percent-decode the redirect target, falling back to the configured
/// destination when the form carried none. An undecodable value is used
/// verbatim rather than failing a login that already authorized the client.
fn resolve_redirect(redirect_url: Option<&str>, fallback: &str) -> String {
    let raw = match redirect_url {
        Some(r) if !r.is_empty() => r,
        _ => fallback,
    };
    match urlencoding::decode(raw) {
        Ok(decoded) => decoded.into_owned(),
        Err(err) => {
            tracing::warn!(%err, "redirect URL is not valid percent-encoding, using it verbatim");
            raw.to_string()
        }
    }
}
