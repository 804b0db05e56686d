//! Custom resource kinds managed by the platform

use kube::core::GroupVersionKind;
use kube::discovery::ApiResource;

/// Static description of a namespaced resource kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceKind {
    pub group: &'static str,
    pub version: &'static str,
    pub kind: &'static str,
    pub plural: &'static str,
}

/// GeneralPodAutoscaler, the autoscaling resource of the cluster
pub const GPA: ResourceKind = ResourceKind {
    group: "autoscaling.tkex.tencent.com",
    version: "v1alpha1",
    kind: "GeneralPodAutoscaler",
    plural: "generalpodautoscalers",
};

impl ResourceKind {
    /// `group/version`, or just `version` for the core group
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.to_string()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }

    pub fn gvk(&self) -> GroupVersionKind {
        GroupVersionKind::gvk(self.group, self.version, self.kind)
    }

    /// Resource description for dynamic `Api` clients
    pub fn api_resource(&self) -> ApiResource {
        ApiResource::from_gvk_with_plural(&self.gvk(), self.plural)
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.api_version(), self.kind)
    }
}
