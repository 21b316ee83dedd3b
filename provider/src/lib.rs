//! Resource lifecycle layer over `teamcity_core`.
//!
//! # Overview
//! Maps the create/read/update/delete/import lifecycle of a declarative
//! resource onto REST operations: the plan becomes a request, the server's
//! answer becomes the tracked state, and an absent entity on read means
//! "remove from state".
//!
//! # Design
//! - `ProviderConfig` is resolved once into a `Connection`; the resulting
//!   client is shared read-only through an `Arc` by every resource.
//! - Each resource owns a typed model; there is no string-keyed state bag.
//! - Errors carry a summary naming the operation and entity plus the
//!   underlying `ApiError`.

pub mod config;
pub mod data_sources;
pub mod provider;
pub mod resource;
pub mod resources;

pub use config::{ConfigError, ProviderConfig};
pub use provider::TeamCityProvider;
pub use resource::{DataSource, Resource, ResourceError};
