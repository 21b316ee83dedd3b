use std::sync::Arc;

use serde::Serialize;
use teamcity_core::TeamCityClient;

use crate::resource::{Context, DataSource, ResourceError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerModel {
    /// The server's application URL.
    pub id: String,
    pub version: String,
}

#[derive(Debug, Clone)]
pub struct ServerDataSource {
    client: Arc<TeamCityClient>,
}

impl ServerDataSource {
    pub fn new(client: Arc<TeamCityClient>) -> Self {
        Self { client }
    }
}

impl DataSource for ServerDataSource {
    type Config = ();
    type Model = ServerModel;

    fn type_name(&self) -> &'static str {
        "teamcity_server"
    }

    fn read(&self, _config: &()) -> Result<ServerModel> {
        let version = self
            .client
            .get_version()
            .context(|| "Unable to Read version".to_string())?
            .ok_or_else(|| ResourceError::invalid("Unable to Read version", "server has no version endpoint"))?;
        Ok(ServerModel {
            id: self.client.connection().app_url().to_string(),
            version,
        })
    }
}
