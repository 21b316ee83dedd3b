use tracing::{debug, info};

use crate::client::TeamCityClient;
use crate::error::ApiError;
use crate::locator::{Endpoint, Locator};
use crate::types::{BuildTypes, VcsRoot};

fn vcs_root(id: &str) -> Endpoint {
    Endpoint::rest().segment("vcs-roots").locator(&Locator::id(id))
}

impl TeamCityClient {
    pub fn create_vcs_root(&self, root: &VcsRoot) -> Result<VcsRoot, ApiError> {
        let created: VcsRoot = self.post_json(&Endpoint::rest().segment("vcs-roots"), root)?;
        info!(id = created.id.as_deref().unwrap_or_default(), "created vcs root");
        Ok(created)
    }

    pub fn get_vcs_root(&self, id: &str) -> Result<Option<VcsRoot>, ApiError> {
        self.get_json(&vcs_root(id))
    }

    pub fn delete_vcs_root(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&vcs_root(id))
    }

    /// Remove the VCS root from every build configuration attached to it, so
    /// the root itself can be deleted.
    pub fn detach_vcs_root(&self, id: &str) -> Result<(), ApiError> {
        let attached: Option<BuildTypes> = self.get_json(
            &Endpoint::rest()
                .segment("buildTypes")
                .query("locator", format!("vcsRoot:{id}")),
        )?;
        for build_type in attached.unwrap_or_default().build_type {
            debug!(vcs_root = id, build_type = %build_type.id, "detaching vcs root");
            self.delete(
                &Endpoint::rest()
                    .segment("buildTypes")
                    .locator(&Locator::id(&build_type.id))
                    .segment("vcs-root-entries")
                    .segment(id),
            )?;
        }
        Ok(())
    }
}
