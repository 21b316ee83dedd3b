//! Versioned settings, context parameters and secure tokens of a project.
//!
//! A full-record write of the settings is not trustworthy: the server may
//! echo a different `showSettingsChanges` than it was sent. Fields marked
//! `coerced` in [`VERSIONED_SETTINGS_FIELDS`] are compared after the write
//! and each mismatch is re-sent once through the scalar property endpoint.
//!
//! [`VERSIONED_SETTINGS_FIELDS`]: crate::settings::VERSIONED_SETTINGS_FIELDS

use std::collections::BTreeMap;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::client::{expect_found, TeamCityClient};
use crate::error::ApiError;
use crate::http::{ContentType, HttpMethod};
use crate::locator::{Endpoint, Locator};
use crate::retry::RetryOnServerError;
use crate::settings::coerced_mismatches;
use crate::types::{ContextParams, Property, SecureTokens, VersionedSettings};

/// Prefix of generated secure token ids.
pub const SECURE_TOKEN_PREFIX: &str = "credentialsJSON:";

fn versioned_settings(project_id: &str) -> Endpoint {
    Endpoint::rest()
        .segment("projects")
        .locator(&Locator::id(project_id))
        .segment("versionedSettings")
}

impl TeamCityClient {
    pub fn get_versioned_settings(
        &self,
        project_id: &str,
    ) -> Result<Option<VersionedSettings>, ApiError> {
        self.get_json(&versioned_settings(project_id).segment("config"))
    }

    /// Write the full settings record and reconcile coerced fields.
    ///
    /// Issues one PUT of `settings`. For every coerced field whose requested
    /// value differs from the echo, issues exactly one corrective property
    /// write and stores the value that write echoes. Returns the reconciled
    /// record; the server's answers are authoritative over the request.
    pub fn set_versioned_settings(
        &self,
        project_id: &str,
        settings: &VersionedSettings,
    ) -> Result<VersionedSettings, ApiError> {
        let mut actual: VersionedSettings =
            self.put_json(&versioned_settings(project_id).segment("config"), settings)?;

        for (field, wanted) in coerced_mismatches(settings, &actual) {
            warn!(
                project = project_id,
                property = field.property,
                requested = %wanted,
                echoed = ?field.format(&actual),
                "server did not apply versioned settings field, correcting"
            );
            let echoed = self
                .set_versioned_settings_property(project_id, field.property, &wanted)
                .map_err(|source| ApiError::CorrectionFailed {
                    property: field.property,
                    source: Box::new(source),
                })?;
            if echoed.trim().is_empty() {
                return Err(ApiError::MalformedCorrection {
                    property: field.property,
                    value: echoed,
                });
            }
            field
                .apply(&mut actual, &echoed)
                .map_err(|err| ApiError::MalformedCorrection {
                    property: err.property,
                    value: err.value,
                })?;
        }

        info!(project = project_id, mode = ?actual.synchronization_mode, "versioned settings written");
        Ok(actual)
    }

    /// Write one settings property as plain text and return the echo.
    ///
    /// The server answers 500 while a freshly written settings record is
    /// still being applied, so the write is retried on 500 within the
    /// connection's retry budget.
    pub fn set_versioned_settings_property(
        &self,
        project_id: &str,
        property: &str,
        value: &str,
    ) -> Result<String, ApiError> {
        let endpoint = versioned_settings(project_id)
            .path("config/parameters")
            .segment(property);
        let request =
            self.build_request(HttpMethod::Put, &endpoint, Some(value.to_string()), ContentType::Text)?;
        let outcome =
            self.send_with_retry(&request, &RetryOnServerError, self.connection().retry())?;
        let response = expect_found(&request.label(), outcome)?;
        debug!(project = project_id, property, echoed = %response.body, "property written");
        Ok(response.body)
    }

    /// Turn synchronization off. This is how settings are "deleted".
    pub fn disable_versioned_settings(&self, project_id: &str) -> Result<(), ApiError> {
        let _: VersionedSettings = self.put_json(
            &versioned_settings(project_id).segment("config"),
            &VersionedSettings::disabled(),
        )?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Context parameters
    // -----------------------------------------------------------------------

    pub fn get_context_params(
        &self,
        project_id: &str,
    ) -> Result<Option<BTreeMap<String, String>>, ApiError> {
        let params: Option<ContextParams> =
            self.get_json(&versioned_settings(project_id).segment("contextParameters"))?;
        Ok(params.map(params_to_map))
    }

    /// Replace the context parameters and return the stored set.
    pub fn set_context_params(
        &self,
        project_id: &str,
        params: &BTreeMap<String, String>,
    ) -> Result<BTreeMap<String, String>, ApiError> {
        let body = ContextParams {
            params: params
                .iter()
                .map(|(name, value)| Property {
                    name: name.clone(),
                    value: value.clone(),
                })
                .collect(),
        };
        let stored: ContextParams =
            self.put_json(&versioned_settings(project_id).segment("contextParameters"), &body)?;
        Ok(params_to_map(stored))
    }

    // -----------------------------------------------------------------------
    // Secure tokens
    // -----------------------------------------------------------------------

    /// Store a secure value and return its generated `credentialsJSON:` id.
    pub fn add_secure_token(&self, project_id: &str, value: &str) -> Result<String, ApiError> {
        let id = format!("{SECURE_TOKEN_PREFIX}{}", Uuid::new_v4());
        let body = SecureTokens {
            tokens: vec![Property {
                name: id.clone(),
                value: value.to_string(),
            }],
        };
        self.write_json(HttpMethod::Post, &versioned_settings(project_id).segment("tokens"), &body)?;
        info!(project = project_id, token = %id, "added secure token");
        Ok(id)
    }

    /// Ids of the secure tokens stored for a project.
    pub fn get_secure_tokens(&self, project_id: &str) -> Result<Option<Vec<String>>, ApiError> {
        let tokens: Option<SecureTokens> =
            self.get_json(&versioned_settings(project_id).segment("tokens"))?;
        Ok(tokens.map(|tokens| tokens.tokens.into_iter().map(|t| t.name).collect()))
    }

    pub fn delete_secure_token(&self, project_id: &str, id: &str) -> Result<(), ApiError> {
        let body = SecureTokens {
            tokens: vec![Property {
                name: id.to_string(),
                value: String::new(),
            }],
        };
        let request = self.build_json_request(
            HttpMethod::Delete,
            &versioned_settings(project_id).segment("tokens"),
            &body,
        )?;
        self.send(&request)?;
        Ok(())
    }
}

fn params_to_map(params: ContextParams) -> BTreeMap<String, String> {
    params
        .params
        .into_iter()
        .map(|p| (p.name, p.value))
        .collect()
}
