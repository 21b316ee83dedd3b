//! Wire DTOs for the TeamCity REST API.
//!
//! Field names follow the server's JSON. Optional fields are skipped when
//! `None` so an unset value means "server default". Unknown fields in
//! responses (`href`, `webUrl`, ...) are ignored.

use serde::{Deserialize, Serialize};

/// Raw type the server expects for password parameters.
pub const SECURE_PARAM_RAW_TYPE: &str = "password display='normal'";

// ---------------------------------------------------------------------------
// Property bags
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Properties {
    #[serde(default)]
    pub property: Vec<Property>,
}

impl Properties {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.property
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            property: iter
                .into_iter()
                .map(|(name, value)| Property {
                    name: name.into(),
                    value: value.into(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Property {
    pub name: String,
    #[serde(default)]
    pub value: String,
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_project: Option<ProjectRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_features: Option<ProjectFeatures>,
}

/// Reference to a project by id, as embedded in other entities.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectRef {
    pub id: String,
}

impl ProjectRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Projects {
    #[serde(default)]
    pub project: Vec<Project>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFeatures {
    #[serde(default)]
    pub project_feature: Vec<ProjectFeature>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectFeature {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub properties: Properties,
}

/// Parameter written through the JSON parameters endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TypedParameter {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub inherited: bool,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<ParameterType>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ParameterType {
    pub raw_value: String,
}

// ---------------------------------------------------------------------------
// Versioned settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SynchronizationMode {
    Enabled,
    Disabled,
    UseParentProjectSettings,
}

/// Versioned-settings configuration of a project.
///
/// Only `synchronization_mode` is mandatory. After a write the server's echo
/// is authoritative, not the request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VersionedSettings {
    pub synchronization_mode: SynchronizationMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vcs_root_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(rename = "allowUIEditing", default, skip_serializing_if = "Option::is_none")]
    pub allow_ui_editing: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_secure_values_outside_vcs: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_settings_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_settings_changes: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import_decision: Option<String>,
}

impl VersionedSettings {
    pub fn new(synchronization_mode: SynchronizationMode) -> Self {
        Self {
            synchronization_mode,
            vcs_root_id: None,
            format: None,
            allow_ui_editing: None,
            store_secure_values_outside_vcs: None,
            build_settings_mode: None,
            show_settings_changes: None,
            import_decision: None,
        }
    }

    /// Record that turns synchronization off.
    pub fn disabled() -> Self {
        Self::new(SynchronizationMode::Disabled)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SecureTokens {
    #[serde(rename = "versionedSettingsToken", default)]
    pub tokens: Vec<Property>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContextParams {
    #[serde(rename = "versionedSettingsContextParameter", default)]
    pub params: Vec<Property>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SshKeys {
    #[serde(rename = "sshKey", default)]
    pub keys: Vec<SshKey>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SshKey {
    pub name: String,
}

// ---------------------------------------------------------------------------
// Users, groups, roles
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<RoleAssignments>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Properties>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoleAssignments {
    #[serde(rename = "role", default)]
    pub assignments: Vec<RoleAssignment>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoleAssignment {
    #[serde(rename = "roleId")]
    pub role_id: String,
    pub scope: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Group {
    pub key: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<RoleAssignments>,
    #[serde(rename = "parent-groups", default, skip_serializing_if = "Option::is_none")]
    pub parents: Option<ParentGroups>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParentGroups {
    #[serde(default)]
    pub group: Vec<Group>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Role {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub included: Option<IncludedRoles>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Permissions>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct IncludedRoles {
    #[serde(default)]
    pub role: Vec<Role>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Permissions {
    #[serde(default)]
    pub permission: Vec<Permission>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Permission {
    pub id: String,
}

// ---------------------------------------------------------------------------
// VCS roots, build types, agent pools
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VcsRoot {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub vcs_name: String,
    #[serde(
        rename = "modificationCheckInterval",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub polling_interval: Option<i64>,
    pub project: ProjectRef,
    #[serde(default)]
    pub properties: Properties,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BuildType {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BuildTypes {
    #[serde(default)]
    pub build_type: Vec<BuildType>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pool {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(rename = "maxAgents", default, skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projects: Option<Projects>,
}

// ---------------------------------------------------------------------------
// Server-wide settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GlobalSettings {
    pub artifact_directories: String,
    pub root_url: String,
    pub max_artifact_size: i64,
    #[serde(rename = "maxArtifactsNumber")]
    pub max_artifact_number: i64,
    pub default_execution_timeout: i64,
    #[serde(rename = "defaultVCSCheckInterval")]
    pub default_vcs_check_interval: i64,
    #[serde(rename = "enforceDefaultVCSCheckInterval")]
    pub enforce_default_vcs_check_interval: bool,
    pub default_quiet_period: i64,
    pub use_encryption: bool,
    #[serde(default)]
    pub encryption_key: String,
    pub artifacts_domain_isolation: bool,
    #[serde(default)]
    pub artifacts_url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuthSettings {
    pub allow_guest: bool,
    #[serde(default)]
    pub guest_username: String,
    #[serde(default)]
    pub welcome_text: String,
    pub collapse_login_form: bool,
    pub two_factor_mode: String,
    pub per_project_permissions: bool,
    pub email_verification: bool,
    #[serde(default)]
    pub modules: Modules,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Modules {
    #[serde(default)]
    pub module: Vec<Module>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Module {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Properties>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CleanupSettings {
    pub enabled: bool,
    #[serde(rename = "maxCleanupDuration")]
    pub max_duration: i64,
    #[serde(default)]
    pub daily: Option<CleanupDaily>,
    #[serde(default)]
    pub cron: Option<CleanupCron>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CleanupDaily {
    pub hour: i64,
    pub minute: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CleanupCron {
    pub minute: String,
    pub hour: String,
    pub day: String,
    pub month: String,
    pub day_week: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EmailSettings {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    pub from: String,
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub password: Option<String>,
    pub secure_connection: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_skips_unset_fields() {
        let project = Project {
            name: "Test".to_string(),
            ..Default::default()
        };
        assert_eq!(serde_json::to_string(&project).unwrap(), r#"{"name":"Test"}"#);
    }

    #[test]
    fn project_ignores_unknown_response_fields() {
        let project: Project = serde_json::from_str(
            r#"{"id":"Test","name":"Test","href":"/app/rest/projects/id:Test","parentProject":{"id":"_Root","name":"<Root project>"}}"#,
        )
        .unwrap();
        assert_eq!(project.id.as_deref(), Some("Test"));
        assert_eq!(project.parent_project, Some(ProjectRef::new("_Root")));
    }

    #[test]
    fn versioned_settings_use_server_field_names() {
        let mut settings = VersionedSettings::new(SynchronizationMode::Enabled);
        settings.allow_ui_editing = Some(true);
        settings.show_settings_changes = Some(false);
        settings.vcs_root_id = Some("Root".to_string());
        let json = serde_json::to_value(&settings).unwrap();
        assert_eq!(json["synchronizationMode"], "enabled");
        assert_eq!(json["allowUIEditing"], true);
        assert_eq!(json["showSettingsChanges"], false);
        assert_eq!(json["vcsRootId"], "Root");
        assert!(json.get("format").is_none());
    }

    #[test]
    fn disabled_settings_serialize_mode_only() {
        let json = serde_json::to_string(&VersionedSettings::disabled()).unwrap();
        assert_eq!(json, r#"{"synchronizationMode":"disabled"}"#);
    }

    #[test]
    fn properties_collect_and_lookup() {
        let props: Properties = [("url", "git@example.com:repo.git"), ("branch", "main")]
            .into_iter()
            .collect();
        assert_eq!(props.get("branch"), Some("main"));
        assert_eq!(props.get("missing"), None);
    }

    #[test]
    fn group_parents_use_hyphenated_key() {
        let group = Group {
            key: "DEV".to_string(),
            name: "Dev".to_string(),
            parents: Some(ParentGroups {
                group: vec![Group {
                    key: "ALL_USERS_GROUP".to_string(),
                    ..Default::default()
                }],
            }),
            ..Default::default()
        };
        let json = serde_json::to_value(&group).unwrap();
        assert_eq!(json["parent-groups"]["group"][0]["key"], "ALL_USERS_GROUP");
    }
}
