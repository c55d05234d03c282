//! Error taxonomy for the authentication chain
//!
//! Every stage failure is caught once at the handler boundary and rendered
//! as the portal's JSON error shape with the matching HTTP status.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use thiserror::Error;

use crate::models::LoginResponse;

#[derive(Debug, Error)]
pub enum PortalError {
    /// Required form fields were missing or empty. Handled locally, no
    /// network call is attempted.
    #[error("Missing required authentication parameters.")]
    Validation { missing: Vec<&'static str> },

    /// RADIUS answered Access-Reject.
    #[error("Invalid username or password.")]
    BadCredentials,

    /// No matching RADIUS datagram arrived within the configured window.
    #[error("RADIUS server timeout")]
    RadiusTimeout,

    /// Socket-level failure talking to the RADIUS server.
    #[error("RADIUS transport failure: {0}")]
    RadiusTransport(#[from] std::io::Error),

    /// A datagram from the right server could not be decoded or failed
    /// response-authenticator verification.
    #[error("Failed to decode RADIUS response: {detail}")]
    RadiusProtocol { detail: String },

    /// The controller returned a structured nonzero error code, or a
    /// precondition for calling it was not met.
    #[error("Omada error code: {code}, Message: {message}")]
    ControllerApi { code: i64, message: String },

    /// Non-2xx HTTP status or transport failure against the controller.
    #[error("Controller network error: {detail}")]
    ControllerNetwork {
        detail: String,
        status: Option<u16>,
        body: Option<String>,
    },

    /// The controller's response body was not the expected JSON envelope.
    /// Carries the raw body for diagnostics.
    #[error("Controller returned a non-JSON response: {detail}")]
    ControllerProtocol { detail: String, raw: String },

    /// Alternate controller vendor that is not implemented.
    #[error("{0} authentication not yet implemented.")]
    Unimplemented(&'static str),
}

impl PortalError {
    pub fn status(&self) -> StatusCode {
        match self {
            PortalError::Validation { .. } => StatusCode::BAD_REQUEST,
            PortalError::BadCredentials
            | PortalError::RadiusTimeout
            | PortalError::RadiusProtocol { .. } => StatusCode::UNAUTHORIZED,
            PortalError::ControllerApi { .. } | PortalError::ControllerProtocol { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            PortalError::RadiusTransport(_) | PortalError::ControllerNetwork { .. } => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            PortalError::Unimplemented(_) => StatusCode::NOT_IMPLEMENTED,
        }
    }
}

impl From<reqwest::Error> for PortalError {
    fn from(err: reqwest::Error) -> Self {
        PortalError::ControllerNetwork {
            detail: err.to_string(),
            status: err.status().map(|s| s.as_u16()),
            body: None,
        }
    }
}

impl IntoResponse for PortalError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            PortalError::Validation { .. } => {
                LoginResponse::failure("Missing required authentication parameters.")
                    .with_error("One or more required parameters are missing.")
            }
            PortalError::BadCredentials
            | PortalError::RadiusTimeout
            | PortalError::RadiusProtocol { .. } => LoginResponse::failure(self.to_string()),
            PortalError::ControllerApi { code, .. } => LoginResponse::failure(format!(
                "Failed to authorize with Omada Controller. Omada Error Code: {code}"
            ))
            .with_error(self.to_string()),
            PortalError::ControllerProtocol { .. } => {
                LoginResponse::failure("Failed to authorize with Omada Controller.")
                    .with_error(self.to_string())
            }
            PortalError::RadiusTransport(_) | PortalError::ControllerNetwork { .. } => {
                LoginResponse::failure(format!("Network issue during authentication: {self}"))
            }
            PortalError::Unimplemented(_) => LoginResponse::failure(self.to_string()),
        };
        (status, Json(body)).into_response()
    }
}
