//! Wireless controller abstraction
//!
//! A controller vendor implements `WirelessController` to provide the
//! two-step hotspot handshake: an operator login that yields a short-lived
//! session, then the authorization call that whitelists the client MAC.

pub mod omada;

pub use omada::OmadaClient;

use async_trait::async_trait;

use crate::error::PortalError;
use crate::models::{AccessGrant, AuthorizationResult, ControllerSession};

#[async_trait]
pub trait WirelessController: Send + Sync {
    /// Human-readable vendor name for logs.
    fn name(&self) -> &str;

    /// Operator login; the returned session is consumed by exactly one
    /// `authorize` call and then discarded.
    async fn login(&self) -> Result<ControllerSession, PortalError>;

    /// Whitelist one client MAC for the grant's duration.
    async fn authorize(
        &self,
        grant: &AccessGrant,
        session: &ControllerSession,
    ) -> Result<AuthorizationResult, PortalError>;
}
