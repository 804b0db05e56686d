//! Autoscaling policy of a process type
//!
//! These are the *desired* values, as configured on the process. The cluster
//! representation lives in `bkpaas-kube`.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Desired autoscaling policy: replica bounds plus trigger rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoscalingConfig {
    pub min_replicas: u32,
    pub max_replicas: u32,
    pub metrics: Vec<ScalingMetric>,
    #[serde(default)]
    pub policy: ScalingPolicy,
}

impl AutoscalingConfig {
    /// Check replica bounds and that at least one trigger exists
    pub fn validate(&self) -> Result<()> {
        if self.min_replicas == 0 {
            return Err(CoreError::InvalidAutoscaling {
                message: "minReplicas must be at least 1".to_string(),
            });
        }
        if self.min_replicas > self.max_replicas {
            return Err(CoreError::InvalidAutoscaling {
                message: format!(
                    "minReplicas ({}) is greater than maxReplicas ({})",
                    self.min_replicas, self.max_replicas
                ),
            });
        }
        if self.metrics.is_empty() {
            return Err(CoreError::InvalidAutoscaling {
                message: "at least one metric is required".to_string(),
            });
        }
        for metric in &self.metrics {
            metric.target.validate()?;
        }
        Ok(())
    }
}

/// Scaling policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScalingPolicy {
    #[default]
    Default,
}

impl ScalingPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "default" => Some(Self::Default),
            _ => None,
        }
    }
}

/// A metric-based trigger rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScalingMetric {
    pub resource: MetricResource,
    pub target: MetricTarget,
}

impl ScalingMetric {
    /// Trigger on average CPU utilization (percent of limits)
    pub fn cpu_utilization(percent: u32) -> Self {
        Self {
            resource: MetricResource::Cpu,
            target: MetricTarget::Utilization {
                average_utilization: percent,
            },
        }
    }

    /// Trigger on an average absolute value, e.g. `"512Mi"`
    pub fn average_value(resource: MetricResource, value: impl Into<String>) -> Self {
        Self {
            resource,
            target: MetricTarget::AverageValue {
                average_value: value.into(),
            },
        }
    }
}

/// Resource a metric is computed from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricResource {
    Cpu,
    Memory,
}

impl MetricResource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cpu => "cpu",
            Self::Memory => "memory",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "cpu" => Some(Self::Cpu),
            "memory" => Some(Self::Memory),
            _ => None,
        }
    }
}

/// Target value of a metric
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum MetricTarget {
    /// Percentage of the requested resource
    #[serde(rename_all = "camelCase")]
    Utilization { average_utilization: u32 },
    /// Absolute quantity, kept as a Kubernetes quantity string
    #[serde(rename_all = "camelCase")]
    AverageValue { average_value: String },
}

impl MetricTarget {
    fn validate(&self) -> Result<()> {
        match self {
            Self::Utilization { average_utilization } if *average_utilization == 0 => {
                Err(CoreError::InvalidAutoscaling {
                    message: "averageUtilization must be greater than 0".to_string(),
                })
            }
            Self::AverageValue { average_value } if average_value.trim().is_empty() => {
                Err(CoreError::InvalidAutoscaling {
                    message: "averageValue must not be empty".to_string(),
                })
            }
            _ => Ok(()),
        }
    }
}

/// Reference to the workload an autoscaling policy targets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScalingObjectRef {
    pub api_version: String,
    pub kind: String,
    pub name: String,
}

impl ScalingObjectRef {
    pub fn new(
        api_version: impl Into<String>,
        kind: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            api_version: api_version.into(),
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Every field must be set, the autoscaler cannot guess a workload
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("apiVersion", &self.api_version),
            ("kind", &self.kind),
            ("name", &self.name),
        ] {
            if value.trim().is_empty() {
                return Err(CoreError::InvalidAutoscaling {
                    message: format!("scaleTargetRef.{} must not be empty", field),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(min: u32, max: u32) -> AutoscalingConfig {
        AutoscalingConfig {
            min_replicas: min,
            max_replicas: max,
            metrics: vec![ScalingMetric::cpu_utilization(85)],
            policy: ScalingPolicy::Default,
        }
    }

    #[test]
    fn test_validate_ok() {
        assert!(config(1, 5).validate().is_ok());
        assert!(config(3, 3).validate().is_ok());
    }

    #[test]
    fn test_validate_bounds() {
        assert!(config(0, 5).validate().is_err());
        assert!(config(6, 5).validate().is_err());
    }

    #[test]
    fn test_validate_requires_metric() {
        let mut c = config(1, 2);
        c.metrics.clear();
        let err = c.validate().unwrap_err();
        assert!(err.to_string().contains("at least one metric"));
    }

    #[test]
    fn test_validate_metric_target() {
        let mut c = config(1, 2);
        c.metrics = vec![ScalingMetric::average_value(MetricResource::Memory, " ")];
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_validate_target_ref() {
        assert!(
            ScalingObjectRef::new("apps/v1", "Deployment", "demo--web")
                .validate()
                .is_ok()
        );

        let err = ScalingObjectRef::new("apps/v1", "", "demo--web")
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("scaleTargetRef.kind"));
        assert!(ScalingObjectRef::new("", "Deployment", "x").validate().is_err());
        assert!(ScalingObjectRef::new("apps/v1", "Deployment", "").validate().is_err());
    }

    #[test]
    fn test_yaml_config() {
        let yaml = r#"
minReplicas: 2
maxReplicas: 10
metrics:
  - resource: cpu
    target:
      type: utilization
      averageUtilization: 70
  - resource: memory
    target:
      type: averageValue
      averageValue: 512Mi
"#;
        let c: AutoscalingConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(c.min_replicas, 2);
        assert_eq!(c.policy, ScalingPolicy::Default);
        assert_eq!(c.metrics[0], ScalingMetric::cpu_utilization(70));
        assert_eq!(
            c.metrics[1],
            ScalingMetric::average_value(MetricResource::Memory, "512Mi")
        );
        assert!(c.validate().is_ok());
    }
}
