//! Deploy commands - interrupt and inspect deployments

use bkpaas_engine::{DeployInterruptionCoordinator, DeploymentStore, StoreBuildProcessController};
use console::style;

use crate::context::Context;
use crate::error::{CliError, Result};

/// Run the interrupt command
pub async fn interrupt(ctx: &Context, id: &str, user: Option<&str>) -> Result<()> {
    let user = ctx.user(user)?;
    // Clones share the update lock
    let store = ctx.store()?;
    let coordinator =
        DeployInterruptionCoordinator::new(store.clone(), StoreBuildProcessController::new(store));

    println!(
        "{} Requesting interruption of deployment {}",
        style("→").blue().bold(),
        style(id).cyan()
    );

    let deployment = coordinator.interrupt_by_id(id, &user).await?;

    println!(
        "{} Interruption requested (status: {})",
        style("✓").green().bold(),
        style(deployment.status).yellow()
    );
    println!("The deployment stops once the builder or the release poller picks up the request.");

    Ok(())
}

/// Run the status command
pub async fn status(ctx: &Context, id: &str, output_json: bool) -> Result<()> {
    let store = ctx.store()?;
    let deployment = store.get_deployment(id).await?;

    if output_json {
        let json = serde_json::to_string_pretty(&deployment).map_err(|e| CliError::Other {
            message: e.to_string(),
        })?;
        println!("{}", json);
        return Ok(());
    }

    let status_style = if deployment.status.is_finished() {
        style(deployment.status.to_string()).dim()
    } else {
        style(deployment.status.to_string()).yellow()
    };

    println!("{}", style("DEPLOYMENT").bold().underlined());
    println!("  Id:          {}", style(&deployment.id).cyan());
    println!("  Environment: {}", deployment.env);
    println!("  Operator:    {}", deployment.operator);
    println!("  Status:      {}", status_style);
    if let Some(process_id) = &deployment.build_process_id {
        println!("  Build:       {}", process_id);
    }
    println!(
        "  Updated:     {}",
        deployment.updated_at.format("%Y-%m-%d %H:%M:%S")
    );

    if let Some(at) = deployment.release_int_requested_at {
        println!(
            "\n{} Interruption requested at {}",
            style("!").yellow().bold(),
            at.format("%Y-%m-%d %H:%M:%S")
        );
    }

    Ok(())
}
