//! Latest build lookup

use bkpaas_core::EnvironmentRef;

use crate::error::Result;
use crate::storage::BuildStore;

/// Resolves the most recent build of an environment
pub struct LatestBuildResolver<S> {
    store: S,
}

impl<S: BuildStore> LatestBuildResolver<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Id of the most recently created build, `None` if nothing was built yet
    pub async fn latest_build_id(&self, env: &EnvironmentRef) -> Result<Option<String>> {
        let builds = self.store.list_builds(env).await?;
        Ok(builds.into_iter().last().map(|b| b.id))
    }
}
