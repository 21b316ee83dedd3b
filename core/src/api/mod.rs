//! Per-entity REST operations.
//!
//! Every operation follows the same shape: serialize, issue one verb,
//! deserialize. Reads return `Ok(None)` when the entity is absent. The one
//! exception to the single-call shape is
//! [`TeamCityClient::set_versioned_settings`], which may issue a corrective
//! second write.
//!
//! [`TeamCityClient::set_versioned_settings`]: crate::TeamCityClient::set_versioned_settings

mod access;
mod build_type;
mod pool;
mod project;
mod server;
mod vcs_root;
mod versioned_settings;

pub use access::generate_group_key;
pub use versioned_settings::SECURE_TOKEN_PREFIX;
