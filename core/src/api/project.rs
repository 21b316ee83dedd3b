use serde_json::json;
use tracing::info;

use crate::client::TeamCityClient;
use crate::error::ApiError;
use crate::http::HttpMethod;
use crate::locator::{Endpoint, Locator};
use crate::types::{
    ParameterType, Project, ProjectFeature, SshKeys, TypedParameter, SECURE_PARAM_RAW_TYPE,
};

fn project_endpoint(id: &str) -> Endpoint {
    Endpoint::rest().segment("projects").locator(&Locator::id(id))
}

impl TeamCityClient {
    pub fn create_project(&self, project: &Project) -> Result<Project, ApiError> {
        let created: Project = self.post_json(&Endpoint::rest().segment("projects"), project)?;
        info!(id = created.id.as_deref().unwrap_or_default(), "created project");
        Ok(created)
    }

    pub fn get_project(&self, id: &str) -> Result<Option<Project>, ApiError> {
        self.get_json(&project_endpoint(id))
    }

    pub fn delete_project(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&project_endpoint(id))
    }

    /// Rename or re-id a project through its scalar field endpoint.
    pub fn set_project_field(&self, id: &str, field: &str, value: &str) -> Result<String, ApiError> {
        self.set_field("projects", &Locator::id(id), field, Some(value))
    }

    /// Move a project under another parent.
    pub fn set_project_parent(&self, id: &str, parent_id: &str) -> Result<String, ApiError> {
        self.set_field_json(
            "projects",
            &Locator::id(id),
            "parentProject",
            Some(&json!({ "id": parent_id })),
        )
    }

    // -----------------------------------------------------------------------
    // Project features
    // -----------------------------------------------------------------------

    pub fn create_project_feature(
        &self,
        project_id: &str,
        feature: &ProjectFeature,
    ) -> Result<ProjectFeature, ApiError> {
        self.post_json(&project_endpoint(project_id).segment("projectFeatures"), feature)
    }

    pub fn get_project_feature(
        &self,
        project_id: &str,
        feature_id: &str,
    ) -> Result<Option<ProjectFeature>, ApiError> {
        self.get_json(
            &project_endpoint(project_id)
                .segment("projectFeatures")
                .locator(&Locator::id(feature_id)),
        )
    }

    pub fn delete_project_feature(&self, project_id: &str, feature_id: &str) -> Result<(), ApiError> {
        self.delete(
            &project_endpoint(project_id)
                .segment("projectFeatures")
                .locator(&Locator::id(feature_id)),
        )
    }

    // -----------------------------------------------------------------------
    // Parameters
    // -----------------------------------------------------------------------

    /// Set a plain-text project parameter.
    pub fn set_parameter(&self, project_id: &str, name: &str, value: &str) -> Result<(), ApiError> {
        self.set_field("projects", &Locator::id(project_id), &parameter_path(name), Some(value))?;
        Ok(())
    }

    /// Set a password parameter. The server only accepts those through the
    /// JSON endpoint with a typed raw value.
    pub fn set_secure_parameter(&self, project_id: &str, name: &str, value: &str) -> Result<(), ApiError> {
        let param = TypedParameter {
            name: name.to_string(),
            value: value.to_string(),
            inherited: false,
            kind: Some(ParameterType {
                raw_value: SECURE_PARAM_RAW_TYPE.to_string(),
            }),
        };
        self.set_field_json("projects", &Locator::id(project_id), &parameter_path(name), Some(&param))?;
        Ok(())
    }

    pub fn get_parameter(&self, project_id: &str, name: &str) -> Result<Option<String>, ApiError> {
        self.get_field("projects", &Locator::id(project_id), &parameter_path(name))
    }

    pub fn delete_parameter(&self, project_id: &str, name: &str) -> Result<(), ApiError> {
        self.delete(&project_endpoint(project_id).segment("parameters").segment(name))
    }

    // -----------------------------------------------------------------------
    // SSH keys
    // -----------------------------------------------------------------------

    pub fn upload_ssh_key(&self, project_id: &str, name: &str, key: &str) -> Result<(), ApiError> {
        let endpoint = project_endpoint(project_id)
            .segment("sshKeys")
            .query("fileName", name);
        self.send_text(HttpMethod::Post, &endpoint, Some(key))?;
        Ok(())
    }

    /// Names of the SSH keys uploaded to a project.
    pub fn get_ssh_keys(&self, project_id: &str) -> Result<Option<Vec<String>>, ApiError> {
        let keys: Option<SshKeys> = self.get_json(&project_endpoint(project_id).segment("sshKeys"))?;
        Ok(keys.map(|keys| keys.keys.into_iter().map(|key| key.name).collect()))
    }
}

fn parameter_path(name: &str) -> String {
    format!("parameters/{name}")
}
