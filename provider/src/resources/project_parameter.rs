use std::sync::Arc;

use serde::{Deserialize, Serialize};
use teamcity_core::TeamCityClient;
use tracing::info;

use crate::resource::{Context, Resource, ResourceError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectParameterModel {
    pub project_id: String,
    pub name: String,
    pub value: String,
    /// Stored as a password parameter; the server never echoes the value.
    pub secure: bool,
}

#[derive(Debug, Clone)]
pub struct ProjectParameterResource {
    client: Arc<TeamCityClient>,
}

impl ProjectParameterResource {
    pub fn new(client: Arc<TeamCityClient>) -> Self {
        Self { client }
    }

    fn write(&self, plan: &ProjectParameterModel) -> Result<ProjectParameterModel> {
        let written = if plan.secure {
            self.client
                .set_secure_parameter(&plan.project_id, &plan.name, &plan.value)
        } else {
            self.client.set_parameter(&plan.project_id, &plan.name, &plan.value)
        };
        written.context(|| {
            format!(
                "Error setting parameter {} for project: {}",
                plan.name, plan.project_id
            )
        })?;
        Ok(plan.clone())
    }
}

/// Split a `project_id/name` import identifier.
fn parse_import_id(id: &str) -> Result<(&str, &str)> {
    match id.split_once('/') {
        Some((project_id, name))
            if !project_id.is_empty() && !name.is_empty() && !name.contains('/') =>
        {
            Ok((project_id, name))
        }
        _ => Err(ResourceError::invalid(
            "Unexpected import identifier",
            format!("expected project_id/name, got {id:?}"),
        )),
    }
}

impl Resource for ProjectParameterResource {
    type Model = ProjectParameterModel;

    fn type_name(&self) -> &'static str {
        "teamcity_project_parameter"
    }

    fn create(&self, plan: &ProjectParameterModel) -> Result<ProjectParameterModel> {
        let created = self.write(plan)?;
        info!(project = %plan.project_id, name = %plan.name, secure = plan.secure, "parameter set");
        Ok(created)
    }

    fn read(&self, state: &ProjectParameterModel) -> Result<Option<ProjectParameterModel>> {
        let value = self
            .client
            .get_parameter(&state.project_id, &state.name)
            .context(|| {
                format!(
                    "Error reading parameter {} for project: {}",
                    state.name, state.project_id
                )
            })?;
        Ok(value.map(|value| ProjectParameterModel {
            value: if state.secure { state.value.clone() } else { value },
            ..state.clone()
        }))
    }

    fn update(
        &self,
        plan: &ProjectParameterModel,
        _state: &ProjectParameterModel,
    ) -> Result<ProjectParameterModel> {
        self.write(plan)
    }

    fn delete(&self, state: &ProjectParameterModel) -> Result<()> {
        self.client
            .delete_parameter(&state.project_id, &state.name)
            .context(|| {
                format!(
                    "Error deleting parameter {} for project: {}",
                    state.name, state.project_id
                )
            })
    }

    fn import_state(&self, id: &str) -> Result<Option<ProjectParameterModel>> {
        let (project_id, name) = parse_import_id(id)?;
        self.read(&ProjectParameterModel {
            project_id: project_id.to_string(),
            name: name.to_string(),
            value: String::new(),
            secure: false,
        })
    }
}
