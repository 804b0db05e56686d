//! Build commands

use bkpaas_core::{Environment, EnvironmentRef};
use bkpaas_engine::LatestBuildResolver;

use crate::context::Context;
use crate::error::Result;

/// Run the latest command
pub async fn latest(ctx: &Context, code: &str, module: &str, env: &str) -> Result<()> {
    let environment: Environment = env.parse()?;
    let env = EnvironmentRef::new(code, module, environment);

    let resolver = LatestBuildResolver::new(ctx.store()?);
    match resolver.latest_build_id(&env).await? {
        Some(id) => println!("{}", id),
        None => println!("none"),
    }

    Ok(())
}
