use std::sync::Arc;

use serde::{Deserialize, Serialize};
use teamcity_core::types::{SynchronizationMode, VersionedSettings};
use teamcity_core::{SettingsField, TeamCityClient, VERSIONED_SETTINGS_FIELDS};
use tracing::{debug, info};

use crate::resource::{Context, Resource, ResourceError, Result};

const KOTLIN_FORMAT: &str = "kotlin";
const IMPORT_FROM_VCS: &str = "importFromVCS";

/// Versioned-settings configuration of one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionedSettingsModel {
    pub project_id: String,
    pub vcs_root_id: String,
    pub allow_ui_editing: bool,
    /// `useFromVCS` or `useCurrentByDefault`.
    pub build_settings_mode: String,
    pub show_settings_changes: bool,
}

impl VersionedSettingsModel {
    fn to_settings(&self) -> VersionedSettings {
        VersionedSettings {
            vcs_root_id: Some(self.vcs_root_id.clone()),
            format: Some(KOTLIN_FORMAT.to_string()),
            allow_ui_editing: Some(self.allow_ui_editing),
            store_secure_values_outside_vcs: Some(true),
            build_settings_mode: Some(self.build_settings_mode.clone()),
            show_settings_changes: Some(self.show_settings_changes),
            import_decision: Some(IMPORT_FROM_VCS.to_string()),
            ..VersionedSettings::new(SynchronizationMode::Enabled)
        }
    }

    fn from_settings(project_id: &str, settings: &VersionedSettings) -> Result<Self> {
        let missing = |field: &str| {
            ResourceError::invalid(
                format!("Error reading versioned settings for project: {project_id}"),
                format!("server response carries no {field}"),
            )
        };
        Ok(Self {
            project_id: project_id.to_string(),
            vcs_root_id: settings.vcs_root_id.clone().ok_or_else(|| missing("vcsRootId"))?,
            allow_ui_editing: settings.allow_ui_editing.ok_or_else(|| missing("allowUIEditing"))?,
            build_settings_mode: settings
                .build_settings_mode
                .clone()
                .ok_or_else(|| missing("buildSettingsMode"))?,
            show_settings_changes: settings
                .show_settings_changes
                .ok_or_else(|| missing("showSettingsChanges"))?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct VersionedSettingsResource {
    client: Arc<TeamCityClient>,
}

impl VersionedSettingsResource {
    pub fn new(client: Arc<TeamCityClient>) -> Self {
        Self { client }
    }

    fn changed_fields(
        plan: &VersionedSettings,
        state: &VersionedSettings,
    ) -> Vec<(&'static SettingsField, String)> {
        VERSIONED_SETTINGS_FIELDS
            .iter()
            .filter_map(|field| {
                let wanted = field.format(plan)?;
                (field.format(state).as_deref() != Some(wanted.as_str())).then_some((field, wanted))
            })
            .collect()
    }
}

/// Store the value a scalar property write echoed. An empty echo is
/// rejected rather than clearing the field.
fn apply_echo(
    field: &SettingsField,
    settings: &mut VersionedSettings,
    echoed: &str,
    project_id: &str,
) -> Result<()> {
    let summary = || {
        format!(
            "Error setting versioned settings field {} for project: {project_id}",
            field.property
        )
    };
    if echoed.trim().is_empty() {
        return Err(ResourceError::invalid(summary(), "server echoed an empty value"));
    }
    field
        .apply(settings, echoed)
        .map_err(|err| ResourceError::invalid(summary(), err.to_string()))
}

impl Resource for VersionedSettingsResource {
    type Model = VersionedSettingsModel;

    fn type_name(&self) -> &'static str {
        "teamcity_versioned_settings"
    }

    fn create(&self, plan: &VersionedSettingsModel) -> Result<VersionedSettingsModel> {
        let actual = self
            .client
            .set_versioned_settings(&plan.project_id, &plan.to_settings())
            .context(|| format!("Error setting versioned settings for project: {}", plan.project_id))?;
        info!(project = %plan.project_id, "versioned settings enabled");
        VersionedSettingsModel::from_settings(&plan.project_id, &actual)
    }

    fn read(&self, state: &VersionedSettingsModel) -> Result<Option<VersionedSettingsModel>> {
        let actual = self
            .client
            .get_versioned_settings(&state.project_id)
            .context(|| format!("Error reading versioned settings for project: {}", state.project_id))?;
        match actual {
            Some(settings) if settings.format.as_deref() == Some(KOTLIN_FORMAT) => {
                VersionedSettingsModel::from_settings(&state.project_id, &settings).map(Some)
            }
            _ => Ok(None),
        }
    }

    fn update(
        &self,
        plan: &VersionedSettingsModel,
        state: &VersionedSettingsModel,
    ) -> Result<VersionedSettingsModel> {
        let project_id = &state.project_id;
        let mut actual = state.to_settings();
        for (field, wanted) in Self::changed_fields(&plan.to_settings(), &actual) {
            let echoed = self
                .client
                .set_versioned_settings_property(project_id, field.property, &wanted)
                .context(|| {
                    format!(
                        "Error setting versioned settings field {} for project: {project_id}",
                        field.property
                    )
                })?;
            debug!(project = %project_id, property = field.property, echoed = %echoed, "field updated");
            apply_echo(field, &mut actual, &echoed, project_id)?;
        }
        VersionedSettingsModel::from_settings(project_id, &actual)
    }

    fn delete(&self, state: &VersionedSettingsModel) -> Result<()> {
        self.client
            .disable_versioned_settings(&state.project_id)
            .context(|| format!("Error disabling versioned settings for project: {}", state.project_id))
    }

    fn import_state(&self, id: &str) -> Result<Option<VersionedSettingsModel>> {
        let actual = self
            .client
            .get_versioned_settings(id)
            .context(|| format!("Error reading versioned settings for project: {id}"))?;
        actual
            .map(|settings| VersionedSettingsModel::from_settings(id, &settings))
            .transpose()
    }
}
