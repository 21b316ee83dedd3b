use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use teamcity_core::{RetryConfig, TeamCityClient};

use crate::resource::{Context, DataSource, ResourceError, Result};

/// Lookups keep polling while a freshly imported build configuration is
/// not yet visible: 60 retries, 5 seconds apart.
pub const DEFAULT_LOOKUP_RETRY: RetryConfig = RetryConfig {
    max_retries: 60,
    wait_min: Duration::from_secs(5),
    wait_max: Duration::from_secs(5),
    deadline: None,
};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BuildConfigurationConfig {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildConfigurationModel {
    pub id: String,
    pub name: String,
    pub project_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BuildConfigurationDataSource {
    client: Arc<TeamCityClient>,
    retry: RetryConfig,
}

impl BuildConfigurationDataSource {
    pub fn new(client: Arc<TeamCityClient>) -> Self {
        Self {
            client,
            retry: DEFAULT_LOOKUP_RETRY,
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

impl DataSource for BuildConfigurationDataSource {
    type Config = BuildConfigurationConfig;
    type Model = BuildConfigurationModel;

    fn type_name(&self) -> &'static str {
        "teamcity_build_configuration"
    }

    fn read(&self, config: &BuildConfigurationConfig) -> Result<BuildConfigurationModel> {
        let summary = || format!("Error reading build configuration with ID: {}", config.id);
        let build_type = self
            .client
            .get_build_type(&config.id, &self.retry)
            .context(summary)?
            .ok_or_else(|| ResourceError::invalid(summary(), "build configuration not found"))?;
        Ok(BuildConfigurationModel {
            id: build_type.id,
            name: build_type.name,
            project_id: build_type.project_id,
        })
    }
}
