//! Process autoscaling as a GeneralPodAutoscaler resource
//!
//! The process configuration is the source of truth. The GPA resource is a
//! one-way projection of it:
//!
//! ```yaml
//! apiVersion: autoscaling.tkex.tencent.com/v1alpha1
//! kind: GeneralPodAutoscaler
//! metadata:
//!   name: demo--web
//!   namespace: demo-prod
//!   labels:
//!     bkapp.paas.bk.tencent.com/name: demo
//!     bkapp.paas.bk.tencent.com/process-name: web
//! spec:
//!   minReplicas: 1
//!   maxReplicas: 5
//!   metric:
//!     metrics:
//!       - type: Resource
//!         resource:
//!           name: cpu
//!           target:
//!             type: Utilization
//!             averageUtilization: 85
//!   scaleTargetRef:
//!     apiVersion: apps/v1
//!     kind: Deployment
//!     name: demo--web
//! ```

use bkpaas_core::{
    AutoscalingConfig, MetricResource, MetricTarget, ScalingMetric, ScalingObjectRef,
    ScalingPolicy,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::DynamicObject;
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;

use crate::codec::{ResourceCodec, ResourceEntity};
use crate::error::{KubeError, Result};
use crate::kind::{GPA, ResourceKind};

/// Label holding the owning application name
pub const APP_NAME_LABEL: &str = "bkapp.paas.bk.tencent.com/name";
/// Label holding the owning process type
pub const PROCESS_NAME_LABEL: &str = "bkapp.paas.bk.tencent.com/process-name";
/// Standard managed-by label
pub const MANAGED_BY_LABEL: &str = "app.kubernetes.io/managed-by";
pub const MANAGED_BY: &str = "bkpaas";

/// Makes the GPA compute utilization against limits instead of requests
pub const COMPUTE_BY_LIMITS_ANNOTATION: &str = "compute-by-limits";
pub const POLICY_ANNOTATION: &str = "bkapp.paas.bk.tencent.com/autoscaling-policy";

/// Process owning an autoscaling resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOwner {
    pub app_name: String,
    pub process_type: String,
}

impl ProcessOwner {
    pub fn new(app_name: impl Into<String>, process_type: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            process_type: process_type.into(),
        }
    }
}

/// Autoscaling of one process type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcAutoscaling {
    pub name: String,
    pub namespace: String,
    pub owner: ProcessOwner,
    /// Assigned by the API server, `None` for entities not yet created
    pub resource_version: Option<String>,
    pub spec: AutoscalingConfig,
    pub target_ref: ScalingObjectRef,
}

impl ProcAutoscaling {
    pub fn new(
        name: impl Into<String>,
        namespace: impl Into<String>,
        owner: ProcessOwner,
        spec: AutoscalingConfig,
        target_ref: ScalingObjectRef,
    ) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            owner,
            resource_version: None,
            spec,
            target_ref,
        }
    }

    /// Equality on the desired state, ignoring server-assigned fields
    pub fn same_desired_state(&self, other: &Self) -> bool {
        self.name == other.name
            && self.namespace == other.namespace
            && self.owner == other.owner
            && self.spec == other.spec
            && self.target_ref == other.target_ref
    }
}

impl ResourceEntity for ProcAutoscaling {
    fn name(&self) -> &str {
        &self.name
    }

    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn resource_version(&self) -> Option<&str> {
        self.resource_version.as_deref()
    }

    fn set_resource_version(&mut self, version: Option<String>) {
        self.resource_version = version;
    }
}

/// Codec between [`ProcAutoscaling`] and GeneralPodAutoscaler documents
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcAutoscalingCodec;

impl ResourceCodec for ProcAutoscalingCodec {
    type Entity = ProcAutoscaling;

    fn kind(&self) -> &ResourceKind {
        &GPA
    }

    fn serialize(&self, entity: &ProcAutoscaling) -> Result<DynamicObject> {
        entity.spec.validate()?;
        entity.target_ref.validate()?;

        let labels = BTreeMap::from([
            (APP_NAME_LABEL.to_string(), entity.owner.app_name.clone()),
            (
                PROCESS_NAME_LABEL.to_string(),
                entity.owner.process_type.clone(),
            ),
            (MANAGED_BY_LABEL.to_string(), MANAGED_BY.to_string()),
        ]);
        let annotations = BTreeMap::from([
            (COMPUTE_BY_LIMITS_ANNOTATION.to_string(), "true".to_string()),
            (
                POLICY_ANNOTATION.to_string(),
                entity.spec.policy.as_str().to_string(),
            ),
        ]);

        let metrics: Vec<Value> = entity.spec.metrics.iter().map(metric_to_value).collect();

        let mut obj = DynamicObject::new(&entity.name, &GPA.api_resource())
            .within(&entity.namespace)
            .data(json!({
                "spec": {
                    "minReplicas": entity.spec.min_replicas,
                    "maxReplicas": entity.spec.max_replicas,
                    "metric": { "metrics": metrics },
                    "scaleTargetRef": {
                        "apiVersion": entity.target_ref.api_version,
                        "kind": entity.target_ref.kind,
                        "name": entity.target_ref.name,
                    },
                },
            }));
        obj.metadata.labels = Some(labels);
        obj.metadata.annotations = Some(annotations);
        obj.metadata.resource_version = entity.resource_version.clone();

        Ok(obj)
    }

    fn deserialize(&self, obj: &DynamicObject) -> Result<ProcAutoscaling> {
        if let Some(types) = &obj.types
            && (types.kind != GPA.kind || types.api_version != GPA.api_version())
        {
            return Err(malformed(format!(
                "expected {}, got {}/{}",
                GPA, types.api_version, types.kind
            )));
        }

        let (name, namespace, owner) = parse_metadata(&obj.metadata)?;

        let spec = obj
            .data
            .get("spec")
            .and_then(Value::as_object)
            .ok_or_else(|| malformed("missing 'spec'"))?;

        let target_ref = parse_target_ref(spec.get("scaleTargetRef"))?;

        let policy = obj
            .metadata
            .annotations
            .as_ref()
            .and_then(|a| a.get(POLICY_ANNOTATION))
            .map(|p| {
                ScalingPolicy::parse(p)
                    .ok_or_else(|| malformed(format!("unknown autoscaling policy '{}'", p)))
            })
            .transpose()?
            .unwrap_or_default();

        let config = AutoscalingConfig {
            min_replicas: parse_replicas(spec, "minReplicas")?,
            max_replicas: parse_replicas(spec, "maxReplicas")?,
            metrics: parse_metrics(spec.get("metric"))?,
            policy,
        };
        config
            .validate()
            .map_err(|e| malformed(format!("invalid spec: {}", e)))?;

        Ok(ProcAutoscaling {
            name,
            namespace,
            owner,
            resource_version: obj.metadata.resource_version.clone(),
            spec: config,
            target_ref,
        })
    }
}

fn malformed(reason: impl Into<String>) -> KubeError {
    KubeError::malformed(GPA.kind, reason)
}

fn metric_to_value(metric: &ScalingMetric) -> Value {
    let target = match &metric.target {
        MetricTarget::Utilization {
            average_utilization,
        } => json!({ "type": "Utilization", "averageUtilization": average_utilization }),
        MetricTarget::AverageValue { average_value } => {
            json!({ "type": "AverageValue", "averageValue": average_value })
        }
    };
    json!({
        "type": "Resource",
        "resource": {
            "name": metric.resource.as_str(),
            "target": target,
        },
    })
}

fn parse_metadata(meta: &ObjectMeta) -> Result<(String, String, ProcessOwner)> {
    let name = meta
        .name
        .clone()
        .ok_or_else(|| malformed("missing 'metadata.name'"))?;
    let namespace = meta
        .namespace
        .clone()
        .ok_or_else(|| malformed("missing 'metadata.namespace'"))?;

    let label = |key: &str| {
        meta.labels
            .as_ref()
            .and_then(|l| l.get(key))
            .cloned()
            .ok_or_else(|| malformed(format!("missing label '{}'", key)))
    };
    let owner = ProcessOwner {
        app_name: label(APP_NAME_LABEL)?,
        process_type: label(PROCESS_NAME_LABEL)?,
    };

    Ok((name, namespace, owner))
}

fn parse_target_ref(value: Option<&Value>) -> Result<ScalingObjectRef> {
    let target = value
        .and_then(Value::as_object)
        .ok_or_else(|| malformed("missing 'spec.scaleTargetRef'"))?;

    let field = |key: &str| {
        target
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .ok_or_else(|| malformed(format!("missing 'spec.scaleTargetRef.{}'", key)))
    };

    Ok(ScalingObjectRef {
        api_version: field("apiVersion")?,
        kind: field("kind")?,
        name: field("name")?,
    })
}

fn parse_replicas(spec: &Map<String, Value>, key: &str) -> Result<u32> {
    let value = spec
        .get(key)
        .ok_or_else(|| malformed(format!("missing 'spec.{}'", key)))?;
    value
        .as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| malformed(format!("'spec.{}' must be a non-negative integer", key)))
}

fn parse_metrics(value: Option<&Value>) -> Result<Vec<ScalingMetric>> {
    let metrics = value
        .and_then(|m| m.get("metrics"))
        .and_then(Value::as_array)
        .ok_or_else(|| malformed("missing 'spec.metric.metrics'"))?;

    if metrics.is_empty() {
        return Err(malformed("'spec.metric.metrics' must not be empty"));
    }

    metrics
        .iter()
        .enumerate()
        .map(|(index, m)| parse_metric(index, m))
        .collect()
}

fn parse_metric(index: usize, value: &Value) -> Result<ScalingMetric> {
    let at = |what: &str| malformed(format!("metric #{}: {}", index, what));

    let metric_type = value.get("type").and_then(Value::as_str);
    if metric_type != Some("Resource") {
        return Err(at("only 'Resource' metrics are supported"));
    }

    let resource = value
        .get("resource")
        .ok_or_else(|| at("missing 'resource'"))?;
    let name = resource
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| at("missing 'resource.name'"))?;
    let resource_name =
        MetricResource::parse(name).ok_or_else(|| at(&format!("unknown resource '{}'", name)))?;

    let target = resource
        .get("target")
        .ok_or_else(|| at("missing 'resource.target'"))?;
    let target = match target.get("type").and_then(Value::as_str) {
        Some("Utilization") => {
            let utilization = target
                .get("averageUtilization")
                .and_then(Value::as_u64)
                .and_then(|n| u32::try_from(n).ok())
                .ok_or_else(|| at("missing 'averageUtilization'"))?;
            MetricTarget::Utilization {
                average_utilization: utilization,
            }
        }
        Some("AverageValue") => {
            // Quantities may come back as plain numbers
            let average_value = match target.get("averageValue") {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Number(n)) => n.to_string(),
                _ => return Err(at("missing 'averageValue'")),
            };
            MetricTarget::AverageValue { average_value }
        }
        other => {
            return Err(at(&format!(
                "unsupported target type '{}'",
                other.unwrap_or_default()
            )));
        }
    };

    Ok(ScalingMetric {
        resource: resource_name,
        target,
    })
}
