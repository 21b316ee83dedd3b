use crate::client::TeamCityClient;
use crate::error::ApiError;
use crate::locator::{Endpoint, Locator};
use crate::types::Pool;

impl TeamCityClient {
    pub fn create_pool(&self, pool: &Pool) -> Result<Pool, ApiError> {
        self.post_json(&Endpoint::rest().segment("agentPools"), pool)
    }

    /// Agent pools are looked up by name.
    pub fn get_pool(&self, name: &str) -> Result<Option<Pool>, ApiError> {
        self.get_json(&Endpoint::rest().segment("agentPools").locator(&Locator::name(name)))
    }

    pub fn delete_pool(&self, id: i64) -> Result<(), ApiError> {
        self.delete(
            &Endpoint::rest()
                .segment("agentPools")
                .locator(&Locator::id(id.to_string())),
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::testing::Scripted;

    #[test]
    fn pool_size_maps_to_max_agents() {
        let scripted = Scripted::new([(200, r#"{"id":3,"name":"linux","maxAgents":5}"#)]);
        let pool = scripted.client().get_pool("linux").unwrap().unwrap();
        assert_eq!(pool.id, Some(3));
        assert_eq!(pool.size, Some(5));
        assert_eq!(
            scripted.requests()[0].path,
            "http://tc:8111/app/rest/agentPools/name:linux"
        );
    }
}
