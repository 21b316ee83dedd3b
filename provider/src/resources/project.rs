use std::sync::Arc;

use serde::{Deserialize, Serialize};
use teamcity_core::types::{Project, ProjectRef};
use teamcity_core::TeamCityClient;
use tracing::info;

use crate::resource::{Context, Resource, ResourceError, Result};

/// Id of the implicit top-level project.
pub const ROOT_PROJECT_ID: &str = "_Root";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectModel {
    pub name: String,
    /// Chosen by the server from the name when left unset.
    pub id: Option<String>,
    pub parent_project_id: String,
}

impl ProjectModel {
    /// A top-level project with a server-assigned id.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            parent_project_id: ROOT_PROJECT_ID.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProjectResource {
    client: Arc<TeamCityClient>,
}

impl ProjectResource {
    pub fn new(client: Arc<TeamCityClient>) -> Self {
        Self { client }
    }

    fn to_state(project: Project) -> Result<ProjectModel> {
        let id = project.id.ok_or_else(|| {
            ResourceError::invalid(
                format!("Error reading project: {}", project.name),
                "server response carries no project id",
            )
        })?;
        Ok(ProjectModel {
            name: project.name,
            id: Some(id),
            parent_project_id: project
                .parent_project
                .map(|parent| parent.id)
                .unwrap_or_else(|| ROOT_PROJECT_ID.to_string()),
        })
    }
}

fn tracked_id(state: &ProjectModel) -> Result<&str> {
    state.id.as_deref().ok_or_else(|| {
        ResourceError::invalid(
            format!("Error reading project: {}", state.name),
            "tracked state has no project id",
        )
    })
}

impl Resource for ProjectResource {
    type Model = ProjectModel;

    fn type_name(&self) -> &'static str {
        "teamcity_project"
    }

    fn create(&self, plan: &ProjectModel) -> Result<ProjectModel> {
        let project = Project {
            name: plan.name.clone(),
            id: plan.id.clone(),
            parent_project: Some(ProjectRef::new(&plan.parent_project_id)),
            project_features: None,
        };
        let created = self
            .client
            .create_project(&project)
            .context(|| format!("Error setting project: {}", plan.name))?;
        Self::to_state(created)
    }

    fn read(&self, state: &ProjectModel) -> Result<Option<ProjectModel>> {
        let id = tracked_id(state)?;
        let actual = self
            .client
            .get_project(id)
            .context(|| format!("Error reading project with ID: {id}"))?;
        actual.map(Self::to_state).transpose()
    }

    fn update(&self, plan: &ProjectModel, state: &ProjectModel) -> Result<ProjectModel> {
        let mut id = tracked_id(state)?.to_string();
        let mut next = state.clone();

        if plan.name != state.name {
            next.name = self
                .client
                .set_project_field(&id, "name", &plan.name)
                .context(|| format!("Error setting project field name for the Project with ID: {id}"))?;
        }

        if let Some(new_id) = plan.id.as_deref().filter(|new_id| *new_id != id) {
            let echoed = self
                .client
                .set_project_field(&id, "id", new_id)
                .context(|| format!("Error setting project field id for the Project with ID: {id}"))?;
            info!(from = %id, to = %echoed, "project id changed");
            id = echoed;
            next.id = Some(id.clone());
        }

        if plan.parent_project_id != state.parent_project_id {
            self.client
                .set_project_parent(&id, &plan.parent_project_id)
                .context(|| {
                    format!(
                        "Error setting Project parent to {}, for the Project with ID: {id}",
                        plan.parent_project_id
                    )
                })?;
            next.parent_project_id = plan.parent_project_id.clone();
        }

        Ok(next)
    }

    fn delete(&self, state: &ProjectModel) -> Result<()> {
        let id = tracked_id(state)?;
        self.client
            .delete_project(id)
            .context(|| format!("Error deleting project with ID: {id}"))
    }

    fn import_state(&self, id: &str) -> Result<Option<ProjectModel>> {
        self.read(&ProjectModel {
            id: Some(id.to_string()),
            ..ProjectModel::new("")
        })
    }
}
