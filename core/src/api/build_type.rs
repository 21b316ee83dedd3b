use crate::client::{decode, TeamCityClient};
use crate::error::ApiError;
use crate::http::{ContentType, HttpMethod};
use crate::locator::{Endpoint, Locator};
use crate::retry::{RetryConfig, RetryOnNotFound};
use crate::types::BuildType;

impl TeamCityClient {
    /// Read a build configuration that may not be visible yet.
    ///
    /// Build configurations created from versioned settings show up some
    /// time after the settings are applied, so a 404 is retried within
    /// `retry`. Still absent after the last attempt reads as `Ok(None)`.
    pub fn get_build_type(&self, id: &str, retry: &RetryConfig) -> Result<Option<BuildType>, ApiError> {
        let endpoint = Endpoint::rest().segment("buildTypes").locator(&Locator::id(id));
        let request = self.build_request(HttpMethod::Get, &endpoint, None, ContentType::Json)?;
        match self.send_with_retry(&request, &RetryOnNotFound, retry)?.found() {
            Some(response) => decode(&request.label(), &response.body).map(Some),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::testing::Scripted;

    fn quick(max_retries: u32) -> RetryConfig {
        RetryConfig::new(max_retries, Duration::ZERO, Duration::ZERO)
    }

    #[test]
    fn not_found_is_retried_until_visible() {
        let scripted = Scripted::new([
            (404, ""),
            (404, ""),
            (200, r#"{"id":"P_Build","name":"Build","projectId":"P"}"#),
        ]);
        let build = scripted
            .client()
            .get_build_type("P_Build", &quick(5))
            .unwrap()
            .unwrap();
        assert_eq!(build.project_id.as_deref(), Some("P"));
        assert_eq!(scripted.requests().len(), 3);
    }

    #[test]
    fn exhausted_retries_read_as_absent() {
        let scripted = Scripted::new([(404, ""), (404, ""), (404, "")]);
        let build = scripted.client().get_build_type("P_Build", &quick(2)).unwrap();
        assert!(build.is_none());
        assert_eq!(scripted.requests().len(), 3);
    }

    #[test]
    fn client_errors_are_not_retried() {
        let scripted = Scripted::new([(403, "forbidden")]);
        let err = scripted.client().get_build_type("P_Build", &quick(5)).unwrap_err();
        assert_eq!(err.status(), Some(403));
        assert_eq!(scripted.requests().len(), 1);
    }
}
