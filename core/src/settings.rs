//! Field mapping table for versioned settings.
//!
//! Each row ties a typed field of [`VersionedSettings`] to the wire name used
//! by the scalar property endpoint
//! (`/projects/<locator>/versionedSettings/config/parameters/<property>`),
//! together with the functions that format and parse the plain-text value.
//! Rows marked `coerced` are fields the server is known to silently rewrite
//! on a full-record write; those are re-sent individually afterwards.

use crate::types::VersionedSettings;

/// A scalar value echoed by the server could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid value {value:?} for {property}")]
pub struct FieldParseError {
    pub property: &'static str,
    pub value: String,
}

/// One row of the mapping table.
#[derive(Debug)]
pub struct SettingsField {
    /// Name of the typed field.
    pub field: &'static str,
    /// Name on the wire, in JSON and in the property endpoint path.
    pub property: &'static str,
    /// The server may rewrite this field on a full-record write.
    pub coerced: bool,
    format: fn(&VersionedSettings) -> Option<String>,
    apply: fn(&mut VersionedSettings, Option<bool>, Option<String>),
    boolean: bool,
}

impl SettingsField {
    /// Plain-text value of this field in `settings`, if set.
    pub fn format(&self, settings: &VersionedSettings) -> Option<String> {
        (self.format)(settings)
    }

    /// Parse a plain-text value and store it in `settings`. An empty value
    /// clears the field.
    pub fn apply(&self, settings: &mut VersionedSettings, raw: &str) -> Result<(), FieldParseError> {
        let raw = raw.trim();
        if raw.is_empty() {
            (self.apply)(settings, None, None);
            return Ok(());
        }
        if self.boolean {
            let value = raw.parse::<bool>().map_err(|_| FieldParseError {
                property: self.property,
                value: raw.to_string(),
            })?;
            (self.apply)(settings, Some(value), None);
        } else {
            (self.apply)(settings, None, Some(raw.to_string()));
        }
        Ok(())
    }

    pub fn lookup(property: &str) -> Option<&'static SettingsField> {
        VERSIONED_SETTINGS_FIELDS
            .iter()
            .find(|field| field.property == property)
    }
}

fn fmt_bool(value: Option<bool>) -> Option<String> {
    value.map(|v| v.to_string())
}

pub static VERSIONED_SETTINGS_FIELDS: &[SettingsField] = &[
    SettingsField {
        field: "vcs_root_id",
        property: "vcsRootId",
        coerced: false,
        format: |s| s.vcs_root_id.clone(),
        apply: |s, _, text| s.vcs_root_id = text,
        boolean: false,
    },
    SettingsField {
        field: "format",
        property: "format",
        coerced: false,
        format: |s| s.format.clone(),
        apply: |s, _, text| s.format = text,
        boolean: false,
    },
    SettingsField {
        field: "allow_ui_editing",
        property: "allowUIEditing",
        coerced: false,
        format: |s| fmt_bool(s.allow_ui_editing),
        apply: |s, flag, _| s.allow_ui_editing = flag,
        boolean: true,
    },
    SettingsField {
        field: "store_secure_values_outside_vcs",
        property: "storeSecureValuesOutsideVcs",
        coerced: false,
        format: |s| fmt_bool(s.store_secure_values_outside_vcs),
        apply: |s, flag, _| s.store_secure_values_outside_vcs = flag,
        boolean: true,
    },
    SettingsField {
        field: "build_settings_mode",
        property: "buildSettingsMode",
        coerced: false,
        format: |s| s.build_settings_mode.clone(),
        apply: |s, _, text| s.build_settings_mode = text,
        boolean: false,
    },
    SettingsField {
        field: "show_settings_changes",
        property: "showSettingsChanges",
        coerced: true,
        format: |s| fmt_bool(s.show_settings_changes),
        apply: |s, flag, _| s.show_settings_changes = flag,
        boolean: true,
    },
    SettingsField {
        field: "import_decision",
        property: "importDecision",
        coerced: false,
        format: |s| s.import_decision.clone(),
        apply: |s, _, text| s.import_decision = text,
        boolean: false,
    },
];

/// Coerced fields whose requested value is set and differs from the echo,
/// paired with the requested plain-text value.
pub fn coerced_mismatches(
    requested: &VersionedSettings,
    echoed: &VersionedSettings,
) -> Vec<(&'static SettingsField, String)> {
    VERSIONED_SETTINGS_FIELDS
        .iter()
        .filter(|field| field.coerced)
        .filter_map(|field| {
            let wanted = field.format(requested)?;
            let differs = field.format(echoed).as_deref() != Some(wanted.as_str());
            differs.then_some((field, wanted))
        })
        .collect()
}
