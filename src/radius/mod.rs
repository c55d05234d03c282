//! RADIUS client: the Access-Request/Accept/Reject exchange over UDP
//!
//! Each authentication binds a fresh ephemeral socket, so responses can
//! never be claimed by another in-flight request. A datagram only resolves
//! the exchange if it arrives from the configured server address/port with
//! the request's identifier and a response authenticator that verifies
//! against the shared secret.

pub mod auth;
pub mod packet;

use async_trait::async_trait;
use std::net::{Ipv4Addr, SocketAddr, ToSocketAddrs};
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;
use tokio::net::UdpSocket;

use crate::config::RadiusConfig;
use crate::error::PortalError;
use auth::{generate_request_authenticator, obscure_user_password, verify_response_authenticator};
use packet::{Attribute, AttributeType, Code, CodecError, Packet};

/// Seam for the orchestrator; lets the login chain run against a mock in
/// tests.
#[async_trait]
pub trait RadiusAuthenticator: Send + Sync {
    /// Resolves true on Access-Accept, false on Access-Reject.
    async fn authenticate(
        &self,
        username: &str,
        password: &str,
        client_mac: &str,
        client_ip: Option<&str>,
    ) -> Result<bool, PortalError>;
}

static NEXT_IDENTIFIER: AtomicU8 = AtomicU8::new(0);

fn next_identifier() -> u8 {
    NEXT_IDENTIFIER.fetch_add(1, Ordering::Relaxed)
}

fn codec_err(err: CodecError) -> PortalError {
    PortalError::RadiusProtocol {
        detail: err.to_string(),
    }
}

pub struct RadiusClient {
    server: SocketAddr,
    secret: String,
    timeout: Duration,
}

impl RadiusClient {
    pub fn new(config: &RadiusConfig) -> anyhow::Result<Self> {
        let server = format!("{}:{}", config.server_ip, config.server_port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| {
                anyhow::anyhow!("RADIUS server address did not resolve: {}", config.server_ip)
            })?;
        Ok(Self::with_server(
            server,
            config.shared_secret.clone(),
            Duration::from_millis(config.timeout_ms),
        ))
    }

    pub fn with_server(server: SocketAddr, secret: String, timeout: Duration) -> Self {
        Self {
            server,
            secret,
            timeout,
        }
    }

    fn build_access_request(
        &self,
        identifier: u8,
        authenticator: [u8; 16],
        username: &str,
        password: &str,
        client_mac: &str,
        client_ip: Option<&str>,
    ) -> Result<Vec<u8>, PortalError> {
        let mut request = Packet::new(Code::AccessRequest, identifier, authenticator);
        request.add_attribute(
            Attribute::string(AttributeType::UserName, username).map_err(codec_err)?,
        );
        request.add_attribute(
            Attribute::new(
                AttributeType::UserPassword,
                obscure_user_password(password, self.secret.as_bytes(), &authenticator),
            )
            .map_err(codec_err)?,
        );
        request.add_attribute(
            Attribute::string(AttributeType::CallingStationId, client_mac).map_err(codec_err)?,
        );
        // A parseable client IP goes out in the RFC 4-byte form; anything
        // else (including absent) as raw string bytes.
        let ip = client_ip.unwrap_or("");
        let ip_attr = match ip.parse::<Ipv4Addr>() {
            Ok(addr) => Attribute::ipv4(AttributeType::FramedIpAddress, addr),
            Err(_) => Attribute::string(AttributeType::FramedIpAddress, ip),
        }
        .map_err(codec_err)?;
        request.add_attribute(ip_attr);
        request.encode().map_err(codec_err)
    }
}

#[async_trait]
impl RadiusAuthenticator for RadiusClient {
    async fn authenticate(
        &self,
        username: &str,
        password: &str,
        client_mac: &str,
        client_ip: Option<&str>,
    ) -> Result<bool, PortalError> {
        let identifier = next_identifier();
        let authenticator = generate_request_authenticator();
        let request = self.build_access_request(
            identifier,
            authenticator,
            username,
            password,
            client_mac,
            client_ip,
        )?;

        let bind_addr = if self.server.is_ipv4() {
            SocketAddr::from((std::net::Ipv4Addr::UNSPECIFIED, 0))
        } else {
            SocketAddr::from((std::net::Ipv6Addr::UNSPECIFIED, 0))
        };
        let socket = UdpSocket::bind(bind_addr).await?;
        socket.send_to(&request, self.server).await?;
        tracing::debug!(
            username,
            server = %self.server,
            identifier,
            "sent RADIUS Access-Request"
        );

        let deadline = tokio::time::Instant::now() + self.timeout;
        let mut buf = vec![0u8; Packet::MAX_PACKET_SIZE];
        loop {
            let (len, src) =
                match tokio::time::timeout_at(deadline, socket.recv_from(&mut buf)).await {
                    Err(_) => return Err(PortalError::RadiusTimeout),
                    Ok(Err(e)) => return Err(PortalError::RadiusTransport(e)),
                    Ok(Ok(received)) => received,
                };

            if src != self.server {
                tracing::debug!(%src, "ignoring datagram from unexpected source");
                continue;
            }

            let raw = &buf[..len];
            let response = Packet::decode(raw).map_err(codec_err)?;

            if response.identifier != identifier {
                tracing::warn!(
                    got = response.identifier,
                    expected = identifier,
                    "ignoring RADIUS response with stale identifier"
                );
                continue;
            }

            if !verify_response_authenticator(raw, &authenticator, self.secret.as_bytes()) {
                return Err(PortalError::RadiusProtocol {
                    detail: "response authenticator mismatch".to_string(),
                });
            }

            tracing::debug!(code = ?response.code, "RADIUS response received");
            return Ok(response.code == Code::AccessAccept);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    /// Build a well-formed response to a raw Access-Request.
    fn make_response(request_raw: &[u8], code: Code, secret: &[u8]) -> Vec<u8> {
        let request = Packet::decode(request_raw).unwrap();
        let response = Packet::new(code, request.identifier, [0u8; 16]);
        let mut raw = response.encode().unwrap();
        let mut data = Vec::new();
        data.extend_from_slice(&raw[..4]);
        data.extend_from_slice(&request.authenticator);
        data.extend_from_slice(&raw[20..]);
        data.extend_from_slice(secret);
        raw[4..20].copy_from_slice(&md5::compute(&data).0);
        raw
    }

    fn test_client(server: &UdpSocket, timeout_ms: u64) -> RadiusClient {
        RadiusClient::with_server(
            server.local_addr().unwrap(),
            "s3cr3t".to_string(),
            Duration::from_millis(timeout_ms),
        )
    }

    #[tokio::test]
    async fn access_accept_resolves_true() {
        let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let client = test_client(&server, 1000);

        let echo = tokio::spawn(async move {
            let mut buf = vec![0u8; 4096];
            let (len, peer) = server.recv_from(&mut buf).await.unwrap();
            let reply = make_response(&buf[..len], Code::AccessAccept, b"s3cr3t");
            server.send_to(&reply, peer).await.unwrap();
        });

        let accepted = client
            .authenticate("alice", "correct", "AA:BB:CC:DD:EE:FF", Some("10.0.0.2"))
            .await
            .unwrap();
        assert!(accepted);
        echo.await.unwrap();
    }

    #[tokio::test]
    async fn access_reject_resolves_false() {
        let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let client = test_client(&server, 1000);

        tokio::spawn(async move {
            let mut buf = vec![0u8; 4096];
            let (len, peer) = server.recv_from(&mut buf).await.unwrap();
            let reply = make_response(&buf[..len], Code::AccessReject, b"s3cr3t");
            server.send_to(&reply, peer).await.unwrap();
        });

        let accepted = client
            .authenticate("alice", "wrong", "AA:BB:CC:DD:EE:FF", None)
            .await
            .unwrap();
        assert!(!accepted);
    }

    #[tokio::test]
    async fn foreign_source_is_ignored() {
        let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let client = test_client(&server, 2000);

        tokio::spawn(async move {
            let mut buf = vec![0u8; 4096];
            let (len, peer) = server.recv_from(&mut buf).await.unwrap();

            // A rogue socket answers first with a well-formed Reject; only
            // the source address distinguishes it from the real server.
            let rogue = UdpSocket::bind("127.0.0.1:0").await.unwrap();
            let fake = make_response(&buf[..len], Code::AccessReject, b"s3cr3t");
            rogue.send_to(&fake, peer).await.unwrap();

            tokio::time::sleep(Duration::from_millis(50)).await;
            let reply = make_response(&buf[..len], Code::AccessAccept, b"s3cr3t");
            server.send_to(&reply, peer).await.unwrap();
        });

        let accepted = client
            .authenticate("alice", "correct", "AA:BB:CC:DD:EE:FF", None)
            .await
            .unwrap();
        assert!(accepted, "rogue reject must not resolve the request");
    }

    #[tokio::test]
    async fn no_response_times_out() {
        let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let client = test_client(&server, 200);

        // Keep the server socket alive but silent.
        let started = Instant::now();
        let result = client
            .authenticate("alice", "correct", "AA:BB:CC:DD:EE:FF", None)
            .await;
        assert!(matches!(result, Err(PortalError::RadiusTimeout)));
        assert!(started.elapsed() >= Duration::from_millis(200));
        drop(server);
    }

    #[tokio::test]
    async fn undecodable_response_is_a_protocol_error() {
        let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let client = test_client(&server, 1000);

        tokio::spawn(async move {
            let mut buf = vec![0u8; 4096];
            let (_, peer) = server.recv_from(&mut buf).await.unwrap();
            server.send_to(b"garbage", peer).await.unwrap();
        });

        let result = client
            .authenticate("alice", "correct", "AA:BB:CC:DD:EE:FF", None)
            .await;
        assert!(matches!(result, Err(PortalError::RadiusProtocol { .. })));
    }

    #[tokio::test]
    async fn bad_response_authenticator_is_a_protocol_error() {
        let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let client = test_client(&server, 1000);

        tokio::spawn(async move {
            let mut buf = vec![0u8; 4096];
            let (len, peer) = server.recv_from(&mut buf).await.unwrap();
            let reply = make_response(&buf[..len], Code::AccessAccept, b"wrong-secret");
            server.send_to(&reply, peer).await.unwrap();
        });

        let result = client
            .authenticate("alice", "correct", "AA:BB:CC:DD:EE:FF", None)
            .await;
        assert!(matches!(result, Err(PortalError::RadiusProtocol { .. })));
    }
}
