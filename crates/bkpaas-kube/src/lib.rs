//! BkPaaS Kube - Kubernetes integration for BkPaaS
//!
//! This crate provides:
//! - **Resource kinds**: descriptors of the custom resources the platform manages
//! - **Codecs**: explicit translation between domain entities and cluster documents
//! - **Autoscaling**: the `ProcAutoscaling` entity and its GeneralPodAutoscaler codec
//! - **Client**: a generic get/create/replace/delete client driven by a codec
//!
//! Codecs only decide *how* an entity looks in the cluster. Deciding *when* to
//! create, update or delete belongs to the reconciliation loop.

pub mod autoscaling;
pub mod client;
pub mod codec;
pub mod error;
pub mod kind;

pub use autoscaling::{ProcAutoscaling, ProcAutoscalingCodec, ProcessOwner};
pub use client::ResourceClient;
pub use codec::{ResourceCodec, ResourceEntity};
pub use error::{KubeError, Result};
pub use kind::{GPA, ResourceKind};
