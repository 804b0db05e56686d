//! Generic resource client driven by a codec
//!
//! The client only moves documents between the codec and the API server.
//! The reconciliation loop decides which operation to call.

use kube::{
    Client,
    api::{Api, DeleteParams, DynamicObject, PostParams},
};

use crate::codec::{ResourceCodec, ResourceEntity};
use crate::error::{KubeError, Result};

/// Client for the resources of one codec
pub struct ResourceClient<C: ResourceCodec> {
    client: Client,
    codec: C,
}

impl<C: ResourceCodec> ResourceClient<C> {
    /// Create a client using the default kube config
    pub async fn try_default(codec: C) -> Result<Self> {
        let client = Client::try_default().await?;
        Ok(Self { client, codec })
    }

    /// Create with an existing Kubernetes client
    pub fn with_client(client: Client, codec: C) -> Self {
        Self { client, codec }
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    fn api(&self, namespace: &str) -> Api<DynamicObject> {
        Api::namespaced_with(
            self.client.clone(),
            namespace,
            &self.codec.kind().api_resource(),
        )
    }

    /// Read an entity, `None` if the resource does not exist
    pub async fn get(&self, namespace: &str, name: &str) -> Result<Option<C::Entity>> {
        self.api(namespace)
            .get_opt(name)
            .await?
            .map(|obj| self.codec.deserialize(&obj))
            .transpose()
    }

    /// Create the resource of an entity
    pub async fn create(&self, entity: &C::Entity) -> Result<C::Entity> {
        let obj = self.codec.serialize(entity)?;
        let created = self
            .api(entity.namespace())
            .create(&PostParams::default(), &obj)
            .await?;

        tracing::info!(
            kind = self.codec.kind().kind,
            namespace = entity.namespace(),
            name = entity.name(),
            "resource created"
        );
        self.codec.deserialize(&created)
    }

    /// Replace the resource of an entity
    ///
    /// The entity must carry the resource version it was read with, the API
    /// server rejects the update with a conflict if the resource changed since.
    pub async fn replace(&self, entity: &C::Entity) -> Result<C::Entity> {
        if entity.resource_version().is_none() {
            return Err(KubeError::InvalidEntity(format!(
                "cannot replace {} '{}' without a resource version",
                self.codec.kind().kind,
                entity.name()
            )));
        }

        let obj = self.codec.serialize(entity)?;
        let replaced = self
            .api(entity.namespace())
            .replace(entity.name(), &PostParams::default(), &obj)
            .await?;

        tracing::info!(
            kind = self.codec.kind().kind,
            namespace = entity.namespace(),
            name = entity.name(),
            "resource replaced"
        );
        self.codec.deserialize(&replaced)
    }

    /// Create or replace, returning the stored entity and whether it was created
    pub async fn upsert(&self, entity: &C::Entity) -> Result<(C::Entity, bool)> {
        let existing = self
            .api(entity.namespace())
            .get_opt(entity.name())
            .await?;

        match existing {
            None => Ok((self.create(entity).await?, true)),
            Some(obj) => {
                let mut desired = entity.clone();
                desired.set_resource_version(obj.metadata.resource_version);
                Ok((self.replace(&desired).await?, false))
            }
        }
    }

    /// Delete a resource, returns `false` if it did not exist
    pub async fn delete(&self, namespace: &str, name: &str) -> Result<bool> {
        match self
            .api(namespace)
            .delete(name, &DeleteParams::default())
            .await
        {
            Ok(_) => {
                tracing::info!(
                    kind = self.codec.kind().kind,
                    namespace,
                    name,
                    "resource deleted"
                );
                Ok(true)
            }
            Err(e) => {
                let err = KubeError::from(e);
                if err.is_not_found() { Ok(false) } else { Err(err) }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autoscaling::{ProcAutoscaling, ProcAutoscalingCodec, ProcessOwner};
    use bkpaas_core::{AutoscalingConfig, ScalingMetric, ScalingObjectRef, ScalingPolicy};
    use http::{Method, Request, Response, StatusCode};
    use kube::client::Body;
    use serde_json::{Value, json};
    use std::convert::Infallible;
    use std::sync::{Arc, Mutex};

    const COLLECTION: &str =
        "/apis/autoscaling.tkex.tencent.com/v1alpha1/namespaces/demo-prod/generalpodautoscalers";

    /// Request received by the fake API server
    #[derive(Debug, Clone)]
    struct Call {
        method: Method,
        path: String,
        body: Option<Value>,
    }

    type Handler = Arc<dyn Fn(&Call) -> (StatusCode, Value) + Send + Sync>;

    /// Client talking to an in-process API server answering with `handler`
    fn fake_client(
        handler: impl Fn(&Call) -> (StatusCode, Value) + Send + Sync + 'static,
    ) -> (ResourceClient<ProcAutoscalingCodec>, Arc<Mutex<Vec<Call>>>) {
        let handler: Handler = Arc::new(handler);
        let calls = Arc::new(Mutex::new(Vec::new()));
        let recorded = calls.clone();

        let service = tower::service_fn(move |req: Request<Body>| {
            let handler = handler.clone();
            let calls = recorded.clone();
            async move {
                let (parts, body) = req.into_parts();
                let bytes = body.collect_bytes().await.unwrap();
                let call = Call {
                    method: parts.method,
                    path: parts.uri.path().to_string(),
                    body: serde_json::from_slice(&bytes).ok(),
                };
                let (status, payload) = handler(&call);
                calls.lock().unwrap().push(call);

                let response = Response::builder()
                    .status(status)
                    .header("content-type", "application/json")
                    .body(Body::from(serde_json::to_vec(&payload).unwrap()))
                    .unwrap();
                Ok::<_, Infallible>(response)
            }
        });

        let client = Client::new(service, "default");
        (ResourceClient::with_client(client, ProcAutoscalingCodec), calls)
    }

    fn entity() -> ProcAutoscaling {
        ProcAutoscaling::new(
            "demo--web",
            "demo-prod",
            ProcessOwner::new("demo", "web"),
            AutoscalingConfig {
                min_replicas: 1,
                max_replicas: 5,
                metrics: vec![ScalingMetric::cpu_utilization(85)],
                policy: ScalingPolicy::Default,
            },
            ScalingObjectRef::new("apps/v1", "Deployment", "demo--web"),
        )
    }

    /// The resource as the API server returns it
    fn stored(version: &str) -> Value {
        let mut obj = ProcAutoscalingCodec.serialize(&entity()).unwrap();
        obj.metadata.resource_version = Some(version.to_string());
        serde_json::to_value(obj).unwrap()
    }

    fn status(code: u16, reason: &str) -> Value {
        json!({
            "kind": "Status",
            "apiVersion": "v1",
            "metadata": {},
            "status": "Failure",
            "message": reason,
            "reason": reason,
            "code": code,
        })
    }

    fn item_path() -> String {
        format!("{}/demo--web", COLLECTION)
    }

    fn methods(calls: &Arc<Mutex<Vec<Call>>>) -> Vec<Method> {
        calls.lock().unwrap().iter().map(|c| c.method.clone()).collect()
    }

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let (client, calls) = fake_client(|_| (StatusCode::NOT_FOUND, status(404, "NotFound")));

        let result = client.get("demo-prod", "demo--web").await.unwrap();
        assert!(result.is_none());
        assert_eq!(calls.lock().unwrap()[0].path, item_path());
    }

    #[tokio::test]
    async fn test_get_decodes_entity() {
        let (client, _) = fake_client(|_| (StatusCode::OK, stored("7")));

        let found = client.get("demo-prod", "demo--web").await.unwrap().unwrap();
        assert_eq!(found.resource_version.as_deref(), Some("7"));
        assert!(found.same_desired_state(&entity()));
    }

    #[tokio::test]
    async fn test_replace_requires_resource_version() {
        let (client, calls) = fake_client(|_| (StatusCode::OK, stored("1")));

        let result = client.replace(&entity()).await;
        assert!(matches!(result, Err(KubeError::InvalidEntity(_))));
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_replace_conflict() {
        let (client, _) = fake_client(|_| (StatusCode::CONFLICT, status(409, "Conflict")));

        let mut e = entity();
        e.resource_version = Some("3".to_string());
        let err = client.replace(&e).await.unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_upsert_creates_missing_resource() {
        let (client, calls) = fake_client(|call| match call.method {
            Method::GET => (StatusCode::NOT_FOUND, status(404, "NotFound")),
            _ => (StatusCode::CREATED, stored("1")),
        });

        let (created, was_created) = client.upsert(&entity()).await.unwrap();
        assert!(was_created);
        assert_eq!(created.resource_version.as_deref(), Some("1"));
        assert_eq!(methods(&calls), vec![Method::GET, Method::POST]);

        let post = calls.lock().unwrap()[1].clone();
        assert_eq!(post.path, COLLECTION);
        let body = post.body.unwrap();
        assert!(body["metadata"]["resourceVersion"].is_null());
        assert_eq!(body["kind"], "GeneralPodAutoscaler");
    }

    #[tokio::test]
    async fn test_upsert_replaces_with_server_version() {
        let (client, calls) = fake_client(|call| match call.method {
            Method::GET => (StatusCode::OK, stored("42")),
            _ => (StatusCode::OK, stored("43")),
        });

        let (replaced, was_created) = client.upsert(&entity()).await.unwrap();
        assert!(!was_created);
        assert_eq!(replaced.resource_version.as_deref(), Some("43"));
        assert_eq!(methods(&calls), vec![Method::GET, Method::PUT]);

        let put = calls.lock().unwrap()[1].clone();
        assert_eq!(put.path, item_path());
        assert_eq!(put.body.unwrap()["metadata"]["resourceVersion"], "42");
    }

    #[tokio::test]
    async fn test_delete() {
        let (client, calls) = fake_client(|_| (StatusCode::OK, stored("5")));
        assert!(client.delete("demo-prod", "demo--web").await.unwrap());
        assert_eq!(methods(&calls), vec![Method::DELETE]);

        let (client, _) = fake_client(|_| (StatusCode::NOT_FOUND, status(404, "NotFound")));
        assert!(!client.delete("demo-prod", "demo--web").await.unwrap());

        let (client, _) = fake_client(|_| (StatusCode::FORBIDDEN, status(403, "Forbidden")));
        assert!(client.delete("demo-prod", "demo--web").await.is_err());
    }
}
