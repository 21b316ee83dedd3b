//! Server-wide endpoints: version, licensing and global configuration.

use tracing::info;

use crate::client::TeamCityClient;
use crate::error::ApiError;
use crate::http::HttpMethod;
use crate::locator::{Endpoint, Locator};
use crate::types::{AuthSettings, CleanupSettings, EmailSettings, GlobalSettings};

fn server() -> Endpoint {
    Endpoint::rest().segment("server")
}

fn license_keys() -> Endpoint {
    server().path("licensingData/licenseKeys")
}

fn email() -> Endpoint {
    Endpoint::app().path("email/rest")
}

impl TeamCityClient {
    pub fn get_version(&self) -> Result<Option<String>, ApiError> {
        self.get_text(&server().segment("version"))
    }

    pub fn add_license(&self, key: &str) -> Result<(), ApiError> {
        self.send_text(HttpMethod::Post, &license_keys(), Some(key))?;
        info!("added license key");
        Ok(())
    }

    pub fn has_license(&self, key: &str) -> Result<bool, ApiError> {
        let found = self.get_text(&license_keys().locator(&Locator::key(key)))?;
        Ok(found.is_some())
    }

    pub fn delete_license(&self, key: &str) -> Result<(), ApiError> {
        self.delete(&license_keys().locator(&Locator::key(key)))
    }

    pub fn get_global_settings(&self) -> Result<Option<GlobalSettings>, ApiError> {
        self.get_json(&server().segment("globalSettings"))
    }

    pub fn set_global_settings(&self, settings: &GlobalSettings) -> Result<GlobalSettings, ApiError> {
        self.put_json(&server().segment("globalSettings"), settings)
    }

    pub fn get_auth_settings(&self) -> Result<Option<AuthSettings>, ApiError> {
        self.get_json(&server().segment("authSettings"))
    }

    pub fn set_auth_settings(&self, settings: &AuthSettings) -> Result<AuthSettings, ApiError> {
        self.put_json(&server().segment("authSettings"), settings)
    }

    pub fn get_cleanup(&self) -> Result<Option<CleanupSettings>, ApiError> {
        self.get_json(&server().segment("cleanup"))
    }

    pub fn set_cleanup(&self, settings: &CleanupSettings) -> Result<CleanupSettings, ApiError> {
        self.put_json(&server().segment("cleanup"), settings)
    }

    pub fn get_email_settings(&self) -> Result<Option<EmailSettings>, ApiError> {
        self.get_json(&email())
    }

    /// Email settings are written with POST, not PUT.
    pub fn set_email_settings(&self, settings: &EmailSettings) -> Result<EmailSettings, ApiError> {
        self.post_json(&email(), settings)
    }
}
