//! Autoscaling commands - render, inspect, apply and delete GPA resources

use bkpaas_core::{AutoscalingConfig, MetricTarget, ScalingObjectRef};
use bkpaas_kube::{
    ProcAutoscaling, ProcAutoscalingCodec, ProcessOwner, ResourceClient, ResourceCodec,
};
use console::style;
use kube::api::DynamicObject;
use serde::Deserialize;
use std::path::Path;

use crate::context::Context;
use crate::error::{CliError, Result};

/// Autoscaling file, as written by users
///
/// ```yaml
/// name: demo--web
/// namespace: demo-prod
/// app: demo
/// process: web
/// targetRef:
///   apiVersion: apps/v1
///   kind: Deployment
///   name: demo--web
/// spec:
///   minReplicas: 1
///   maxReplicas: 5
///   metrics:
///     - resource: cpu
///       target:
///         type: utilization
///         averageUtilization: 85
/// ```
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AutoscalingFile {
    name: String,
    #[serde(default)]
    namespace: Option<String>,
    app: String,
    process: String,
    target_ref: ScalingObjectRef,
    spec: AutoscalingConfig,
}

fn load_entity(ctx: &Context, path: &Path) -> Result<ProcAutoscaling> {
    let content = std::fs::read_to_string(path)?;
    let file: AutoscalingFile = serde_yaml::from_str(&content).map_err(|e| {
        CliError::validation(format!("invalid autoscaling file {}: {}", path.display(), e))
    })?;

    file.spec.validate()?;
    file.target_ref.validate()?;

    let namespace = ctx.namespace(file.namespace.as_deref()).to_string();
    Ok(ProcAutoscaling::new(
        file.name,
        namespace,
        ProcessOwner::new(file.app, file.process),
        file.spec,
        file.target_ref,
    ))
}

/// Run the render command
pub fn render(ctx: &Context, path: &Path) -> Result<()> {
    let entity = load_entity(ctx, path)?;
    let obj = ProcAutoscalingCodec.serialize(&entity)?;

    let yaml = serde_yaml::to_string(&obj).map_err(|e| CliError::Other {
        message: e.to_string(),
    })?;
    print!("{}", yaml);

    Ok(())
}

/// Run the inspect command
pub fn inspect(path: &Path) -> Result<()> {
    let content = std::fs::read_to_string(path)?;
    let obj: DynamicObject = serde_yaml::from_str(&content).map_err(|e| {
        CliError::validation(format!("invalid resource file {}: {}", path.display(), e))
    })?;

    let entity = ProcAutoscalingCodec.deserialize(&obj)?;

    println!("{}", style("AUTOSCALING").bold().underlined());
    println!("  Name:       {}", style(&entity.name).cyan());
    println!("  Namespace:  {}", style(&entity.namespace).yellow());
    println!(
        "  Process:    {}/{}",
        entity.owner.app_name, entity.owner.process_type
    );
    println!(
        "  Target:     {} {} ({})",
        entity.target_ref.kind, entity.target_ref.name, entity.target_ref.api_version
    );
    println!(
        "  Replicas:   {}-{}",
        entity.spec.min_replicas, entity.spec.max_replicas
    );
    println!("  Policy:     {}", entity.spec.policy.as_str());
    if let Some(version) = &entity.resource_version {
        println!("  Version:    {}", version);
    }

    println!("\n{}", style("METRICS").bold().underlined());
    for metric in &entity.spec.metrics {
        let target = match &metric.target {
            MetricTarget::Utilization {
                average_utilization,
            } => format!("{}% utilization", average_utilization),
            MetricTarget::AverageValue { average_value } => {
                format!("{} average", average_value)
            }
        };
        println!("  {:<8} {}", metric.resource.as_str(), target);
    }

    Ok(())
}

/// Run the apply command
pub async fn apply(ctx: &Context, path: &Path) -> Result<()> {
    let entity = load_entity(ctx, path)?;
    let client = ResourceClient::try_default(ProcAutoscalingCodec).await?;

    let (stored, created) = client.upsert(&entity).await?;
    let action = if created { "created" } else { "configured" };

    println!(
        "{} {}/{} {}",
        style("✓").green().bold(),
        style(&stored.namespace).yellow(),
        style(&stored.name).cyan(),
        action
    );

    Ok(())
}

/// Run the delete command
pub async fn delete(ctx: &Context, name: &str, namespace: Option<&str>) -> Result<()> {
    let namespace = ctx.namespace(namespace);
    let client = ResourceClient::try_default(ProcAutoscalingCodec).await?;

    if client.delete(namespace, name).await? {
        println!(
            "{} {}/{} deleted",
            style("✓").green().bold(),
            style(namespace).yellow(),
            style(name).cyan()
        );
    } else {
        println!(
            "{} {}/{} not found, nothing to delete",
            style("-").dim(),
            style(namespace).yellow(),
            style(name).cyan()
        );
    }

    Ok(())
}
