//! Synchronous REST client core for a TeamCity server.
//!
//! # Overview
//! Builds `HttpRequest` values and classifies `HttpResponse` values as plain
//! data; the only network I/O goes through the [`Transport`] seam. On top of
//! that primitive sit per-entity operations (projects, versioned settings,
//! users, groups, roles, VCS roots, pools, server settings).
//!
//! # Design
//! - `TeamCityClient` is immutable after construction and cheap to clone.
//! - Status classification is total: 200/204 succeed, 404 is the "absent"
//!   sentinel ([`Outcome::NotFound`], surfaced by reads as `Ok(None)`), every
//!   other status is an [`ApiError::Status`] with the body verbatim.
//! - Retries are opt-in per call through a [`RetryPolicy`]; plain requests
//!   are sent exactly once.
//! - Writing versioned settings reconciles the fields the server is known to
//!   coerce, see [`TeamCityClient::set_versioned_settings`].

pub mod api;
pub mod client;
pub mod connection;
pub mod error;
pub mod http;
pub mod locator;
pub mod retry;
pub mod settings;
pub mod transport;
pub mod types;

#[cfg(test)]
mod testing;

pub use api::{generate_group_key, SECURE_TOKEN_PREFIX};
pub use client::{classify, expect_found, TeamCityClient};
pub use connection::{Connection, Credentials};
pub use error::ApiError;
pub use http::{ContentType, HttpMethod, HttpRequest, HttpResponse, Outcome};
pub use locator::{Endpoint, Locator};
pub use retry::{
    DefaultRetryPolicy, RetryAbort, RetryConfig, RetryOnNotFound, RetryOnServerError, RetryPolicy,
};
pub use settings::{SettingsField, VERSIONED_SETTINGS_FIELDS};
pub use transport::{Transport, TransportError, UreqTransport};
