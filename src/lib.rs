//! radgate: captive portal authentication bridge
//!
//! Accepts a username/password submission from a Wi-Fi captive-portal
//! login page, validates the credentials against a RADIUS server, and on
//! success calls the wireless controller's hotspot API to whitelist the
//! client's MAC address.

pub mod config;
pub mod controller;
pub mod crypto;
pub mod error;
pub mod handlers;
pub mod http;
pub mod models;
pub mod radius;
pub mod routes;
