mod license;
mod project;
mod project_parameter;
mod versioned_settings;

pub use license::{LicenseModel, LicenseResource};
pub use project::{ProjectModel, ProjectResource, ROOT_PROJECT_ID};
pub use project_parameter::{ProjectParameterModel, ProjectParameterResource};
pub use versioned_settings::{VersionedSettingsModel, VersionedSettingsResource};
