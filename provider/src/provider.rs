use std::sync::Arc;

use teamcity_core::{ApiError, TeamCityClient};
use tracing::info;

use crate::config::{ConfigError, ProviderConfig};
use crate::data_sources::{BuildConfigurationDataSource, ServerDataSource};
use crate::resources::{
    LicenseResource, ProjectParameterResource, ProjectResource, VersionedSettingsResource,
};

/// Entry point: owns the shared client and hands out resources bound to it.
#[derive(Debug, Clone)]
pub struct TeamCityProvider {
    client: Arc<TeamCityClient>,
}

impl TeamCityProvider {
    /// Resolve `config` (with environment fallback) into a client. No request
    /// is sent.
    pub fn configure(config: ProviderConfig) -> Result<Self, ConfigError> {
        let connection = config.with_env_fallback().resolve()?;
        info!(host = %connection.app_url(), "provider configured");
        Ok(Self::from_client(TeamCityClient::new(connection)))
    }

    pub fn from_client(client: TeamCityClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    pub fn client(&self) -> &TeamCityClient {
        &self.client
    }

    /// Probe the server with the configured credentials.
    pub fn verify(&self) -> Result<(), ApiError> {
        self.client.verify_connection().map(|_| ())
    }

    pub fn resource_types(&self) -> [&'static str; 4] {
        [
            "teamcity_project",
            "teamcity_versioned_settings",
            "teamcity_project_parameter",
            "teamcity_license",
        ]
    }

    pub fn data_source_types(&self) -> [&'static str; 2] {
        ["teamcity_server", "teamcity_build_configuration"]
    }

    pub fn project(&self) -> ProjectResource {
        ProjectResource::new(self.client.clone())
    }

    pub fn versioned_settings(&self) -> VersionedSettingsResource {
        VersionedSettingsResource::new(self.client.clone())
    }

    pub fn project_parameter(&self) -> ProjectParameterResource {
        ProjectParameterResource::new(self.client.clone())
    }

    pub fn license(&self) -> LicenseResource {
        LicenseResource::new(self.client.clone())
    }

    pub fn server(&self) -> ServerDataSource {
        ServerDataSource::new(self.client.clone())
    }

    pub fn build_configuration(&self) -> BuildConfigurationDataSource {
        BuildConfigurationDataSource::new(self.client.clone())
    }
}
