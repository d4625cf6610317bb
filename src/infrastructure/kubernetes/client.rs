// Copyright 2025 JiangLong.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use super::graph::{Resource, ResourceGraph};
use crate::infrastructure::constants::FIELD_MANAGER;
use crate::shared::error::{LabError, Result};
use backon::{ExponentialBuilder, Retryable};
use kube::api::{DeleteParams, DynamicObject, Patch, PatchParams};
use kube::{Api, Client};
use serde_json::Value;
use std::time::Duration;

#[async_trait::async_trait]
pub trait KubeClient: Send + Sync {
    async fn apply(&self, resource: &Resource) -> Result<()>;

    async fn delete(&self, resource: &Resource) -> Result<()>;

    /// Applies every resource in graph order; stops at the first failure.
    async fn apply_graph(&self, graph: &ResourceGraph) -> Result<usize> {
        for resource in graph.resources() {
            self.apply(resource).await?;
        }
        Ok(graph.len())
    }
}

pub struct LabKubeClient {
    client: Client,
    dry_run: bool,
}

/// Conflicts, throttling and server errors are worth another attempt.
fn is_transient(err: &kube::Error) -> bool {
    match err {
        kube::Error::Api(ae) => ae.code == 409 || ae.code == 429 || ae.code >= 500,
        kube::Error::HyperError(_) | kube::Error::Service(_) => true,
        _ => false,
    }
}

fn backoff() -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_millis(500))
        .with_max_delay(Duration::from_secs(10))
        .with_max_times(5)
}

impl LabKubeClient {
    pub async fn new() -> Result<Self> {
        let client = Client::try_default().await.map_err(|e| {
            LabError::KubeError(format!("Failed to create Kubernetes client: {}", e))
        })?;
        Ok(Self {
            client,
            dry_run: false,
        })
    }

    pub async fn new_with_config(
        kubeconfig_path: Option<String>,
        context: Option<String>,
    ) -> Result<Self> {
        use kube::config::{KubeConfigOptions, Kubeconfig};

        let kubeconfig = if let Some(path) = kubeconfig_path {
            Kubeconfig::read_from(path)
                .map_err(|e| LabError::KubeError(format!("Failed to load kubeconfig: {}", e)))?
        } else {
            Kubeconfig::read()
                .map_err(|e| LabError::KubeError(format!("Failed to load kubeconfig: {}", e)))?
        };

        let config_options = KubeConfigOptions {
            context,
            cluster: None,
            user: None,
        };

        let config = kube::Config::from_custom_kubeconfig(kubeconfig, &config_options)
            .await
            .map_err(|e| {
                LabError::KubeError(format!("Failed to create Kubernetes config: {}", e))
            })?;

        let client = Client::try_from(config).map_err(|e| {
            LabError::KubeError(format!("Failed to create Kubernetes client: {}", e))
        })?;

        Ok(Self {
            client,
            dry_run: false,
        })
    }

    /// Server-side dry run: the API server validates but persists nothing.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    fn api_for(&self, resource: &Resource) -> Api<DynamicObject> {
        match &resource.id.namespace {
            Some(ns) => Api::namespaced_with(self.client.clone(), ns, &resource.api),
            None => Api::all_with(self.client.clone(), &resource.api),
        }
    }

    /// Whether the live object must go before `resource` can be applied.
    async fn needs_replacement(&self, api: &Api<DynamicObject>, resource: &Resource) -> Result<bool> {
        Ok(match api.get_opt(&resource.id.name).await? {
            Some(live) => !is_subset(&resource.object.data, &live.data),
            None => false,
        })
    }
}

/// True when every field set in `desired` has the same value in `live`.
/// Fields only the server fills in are ignored.
fn is_subset(desired: &Value, live: &Value) -> bool {
    match (desired, live) {
        (Value::Object(desired), Value::Object(live)) => desired
            .iter()
            .all(|(key, value)| live.get(key).is_some_and(|live| is_subset(value, live))),
        _ => desired == live,
    }
}

#[async_trait::async_trait]
impl KubeClient for LabKubeClient {
    async fn apply(&self, resource: &Resource) -> Result<()> {
        let api = self.api_for(resource);
        let name = resource.id.name.as_str();

        if resource.delete_before_replace
            && !self.dry_run
            && self.needs_replacement(&api, resource).await?
        {
            tracing::info!("Replacing {}, immutable fields changed", resource.id);
            self.delete(resource).await?;
        }

        let mut params = PatchParams::apply(FIELD_MANAGER).force();
        params.dry_run = self.dry_run;
        let patch = Patch::Apply(&resource.object);

        (|| async { api.patch(name, &params, &patch).await })
            .retry(&backoff())
            .when(is_transient)
            .notify(|err, delay| {
                tracing::warn!("Retrying {} in {:?}: {}", resource.id, delay, err);
            })
            .await?;

        tracing::info!(
            "Applied {}{}",
            resource.id,
            if self.dry_run { " (dry run)" } else { "" }
        );
        Ok(())
    }

    async fn delete(&self, resource: &Resource) -> Result<()> {
        let api = self.api_for(resource);
        match api
            .delete(&resource.id.name, &DeleteParams::default())
            .await
        {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(ae)) if ae.code == 404 => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::error::ErrorResponse;

    fn api_error(code: u16) -> kube::Error {
        kube::Error::Api(ErrorResponse {
            status: "Failure".to_string(),
            message: "test".to_string(),
            reason: "test".to_string(),
            code,
        })
    }

    #[test]
    fn test_unchanged_object_is_not_replaced() {
        let desired = serde_json::json!({
            "provisioner": "driver.longhorn.io",
            "parameters": { "numberOfReplicas": "2" },
        });
        let live = serde_json::json!({
            "provisioner": "driver.longhorn.io",
            "parameters": { "numberOfReplicas": "2", "fsType": "ext4" },
            "reclaimPolicy": "Delete",
        });
        assert!(is_subset(&desired, &live));

        let changed = serde_json::json!({
            "provisioner": "driver.longhorn.io",
            "parameters": { "numberOfReplicas": "3" },
        });
        assert!(!is_subset(&changed, &live));
        assert!(!is_subset(&desired, &serde_json::json!({ "provisioner": "driver.longhorn.io" })));
    }

    #[test]
    fn test_transient_errors() {
        assert!(is_transient(&api_error(409)));
        assert!(is_transient(&api_error(503)));
        assert!(!is_transient(&api_error(404)));
        assert!(!is_transient(&api_error(422)));
    }
}
