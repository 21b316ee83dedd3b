//! Lifecycle contracts implemented by every resource and data source.

use teamcity_core::ApiError;

/// A failed lifecycle step.
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    /// The server call behind the step failed.
    #[error("{summary}: {source}")]
    Api {
        summary: String,
        #[source]
        source: ApiError,
    },

    /// The step could not be carried out with what it was given or what the
    /// server returned.
    #[error("{summary}: {detail}")]
    Invalid { summary: String, detail: String },
}

impl ResourceError {
    pub fn api(summary: impl Into<String>, source: ApiError) -> Self {
        ResourceError::Api {
            summary: summary.into(),
            source,
        }
    }

    pub fn invalid(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        ResourceError::Invalid {
            summary: summary.into(),
            detail: detail.into(),
        }
    }

    /// Short description of the failed step.
    pub fn summary(&self) -> &str {
        match self {
            ResourceError::Api { summary, .. } | ResourceError::Invalid { summary, .. } => summary,
        }
    }

    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            ResourceError::Api { source, .. } => Some(source),
            ResourceError::Invalid { .. } => None,
        }
    }
}

pub type Result<T, E = ResourceError> = std::result::Result<T, E>;

/// Attach a summary to an `ApiError` result.
pub(crate) trait Context<T> {
    fn context(self, summary: impl FnOnce() -> String) -> Result<T>;
}

impl<T> Context<T> for std::result::Result<T, ApiError> {
    fn context(self, summary: impl FnOnce() -> String) -> Result<T> {
        self.map_err(|source| ResourceError::api(summary(), source))
    }
}

/// A managed entity with a full lifecycle.
///
/// `read` returning `Ok(None)` means the entity no longer exists and must be
/// dropped from tracked state. `import_state` builds the tracked state from
/// an import identifier.
pub trait Resource {
    type Model;

    fn type_name(&self) -> &'static str;

    fn create(&self, plan: &Self::Model) -> Result<Self::Model>;

    fn read(&self, state: &Self::Model) -> Result<Option<Self::Model>>;

    fn update(&self, plan: &Self::Model, state: &Self::Model) -> Result<Self::Model>;

    fn delete(&self, state: &Self::Model) -> Result<()>;

    fn import_state(&self, id: &str) -> Result<Option<Self::Model>>;
}

/// A read-only lookup.
pub trait DataSource {
    type Config;
    type Model;

    fn type_name(&self) -> &'static str;

    fn read(&self, config: &Self::Config) -> Result<Self::Model>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_errors_keep_summary_and_cause() {
        let err: Result<()> = Err(ApiError::Status {
            request: "GET http://tc/app/rest/projects/id:X".to_string(),
            status: 500,
            body: "boom".to_string(),
        })
        .context(|| "Error reading project with ID: X".to_string());

        let err = err.unwrap_err();
        assert_eq!(err.summary(), "Error reading project with ID: X");
        assert_eq!(err.api_error().and_then(ApiError::status), Some(500));
        let text = err.to_string();
        assert!(text.starts_with("Error reading project with ID: X: "), "{text}");
        assert!(text.contains("boom"), "{text}");
    }

    #[test]
    fn invalid_errors_have_no_api_cause() {
        let err = ResourceError::invalid("Unexpected import identifier", "expected project_id/name");
        assert!(err.api_error().is_none());
        assert_eq!(
            err.to_string(),
            "Unexpected import identifier: expected project_id/name"
        );
    }
}
