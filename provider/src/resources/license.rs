use std::sync::Arc;

use serde::{Deserialize, Serialize};
use teamcity_core::TeamCityClient;

use crate::resource::{Context, Resource, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseModel {
    pub key: String,
}

#[derive(Debug, Clone)]
pub struct LicenseResource {
    client: Arc<TeamCityClient>,
}

impl LicenseResource {
    pub fn new(client: Arc<TeamCityClient>) -> Self {
        Self { client }
    }
}

impl Resource for LicenseResource {
    type Model = LicenseModel;

    fn type_name(&self) -> &'static str {
        "teamcity_license"
    }

    fn create(&self, plan: &LicenseModel) -> Result<LicenseModel> {
        self.client
            .add_license(&plan.key)
            .context(|| "Error adding license key".to_string())?;
        Ok(plan.clone())
    }

    fn read(&self, state: &LicenseModel) -> Result<Option<LicenseModel>> {
        let present = self
            .client
            .has_license(&state.key)
            .context(|| "Error reading license key".to_string())?;
        Ok(present.then(|| state.clone()))
    }

    // Keys are immutable; a changed key is a replacement, not an update.
    fn update(&self, plan: &LicenseModel, _state: &LicenseModel) -> Result<LicenseModel> {
        Ok(plan.clone())
    }

    fn delete(&self, state: &LicenseModel) -> Result<()> {
        self.client
            .delete_license(&state.key)
            .context(|| "Error deleting license key".to_string())
    }

    fn import_state(&self, id: &str) -> Result<Option<LicenseModel>> {
        self.read(&LicenseModel { key: id.to_string() })
    }
}
