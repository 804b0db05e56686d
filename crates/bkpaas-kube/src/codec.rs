//! Codecs between domain entities and cluster documents

use kube::api::DynamicObject;

use crate::error::Result;
use crate::kind::ResourceKind;

/// An entity with a cluster identity
pub trait ResourceEntity: Clone + Send + Sync {
    fn name(&self) -> &str;

    fn namespace(&self) -> &str;

    /// Server-assigned version used for optimistic concurrency
    fn resource_version(&self) -> Option<&str>;

    fn set_resource_version(&mut self, version: Option<String>);
}

/// Translates one entity type to and from one resource kind
///
/// `deserialize(serialize(x))` must equal `x`, ignoring server-assigned
/// fields.
pub trait ResourceCodec: Send + Sync {
    type Entity: ResourceEntity;

    /// Kind of resource this codec produces
    fn kind(&self) -> &ResourceKind;

    /// Build the cluster document for an entity
    fn serialize(&self, entity: &Self::Entity) -> Result<DynamicObject>;

    /// Read an entity back from a cluster document
    fn deserialize(&self, obj: &DynamicObject) -> Result<Self::Entity>;
}
