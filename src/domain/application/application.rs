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

//! Facade that owns one application's components and its slice of the graph.

use super::databases::{DatabaseArgs, DatabaseConfig, Databases};
use super::metadata::Metadata;
use super::network::Network;
use super::nodes::Nodes;
use super::spec::{ContainerSpec, InitContainerSpec, VolumeMountSpec};
use super::storage::{LocalVolumeArgs, PersistentVolumeArgs, Storage};
use super::validator::NameValidator;
use crate::domain::config::{AppSettings, Config, GpuEnvSettings, PlatformConfig};
use crate::infrastructure::constants::*;
use crate::infrastructure::kubernetes::graph::{Resource, ResourceGraph, ResourceId, ResourceSink};
use crate::infrastructure::kubernetes::resources::backup::build_recurring_backup;
use crate::infrastructure::kubernetes::resources::backup::recurring_job_api;
use crate::infrastructure::kubernetes::resources::{PodTemplateBuilder, SecretBuilder, WorkloadBuilder};
use crate::shared::error::{LabError, Result};
use k8s_openapi::api::core::v1::Namespace;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

/// Immutable inputs shared by every application of a lab.
#[derive(Debug, Clone)]
pub struct LabContext {
    pub config: Config,
    pub platform: Arc<PlatformConfig>,
}

impl LabContext {
    pub fn new(config: Config) -> Result<Self> {
        let platform = Arc::new(PlatformConfig::load(&config)?);
        Ok(Self { config, platform })
    }
}

#[derive(Debug, Clone, Default)]
pub struct ApplicationOutput {
    pub resources: ResourceGraph,
    pub endpoints: BTreeMap<String, String>,
    pub cluster_endpoints: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WorkloadKind {
    Deployment,
    DaemonSet,
    Job,
}

impl fmt::Display for WorkloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            WorkloadKind::Deployment => "deployment",
            WorkloadKind::DaemonSet => "daemonset",
            WorkloadKind::Job => "job",
        };
        f.write_str(kind)
    }
}

pub struct Application {
    name: String,
    config: Config,
    platform: Arc<PlatformConfig>,
    settings: AppSettings,
    validator: NameValidator,
    metadata: Metadata,
    nodes: Nodes,
    storage: Storage,
    network: Network,
    databases: Databases,
    graph: ResourceGraph,
    namespace_id: ResourceId,
    workloads: BTreeSet<String>,
}

impl Application {
    /// Declares the app namespace (named after the app) and, with a
    /// `backupSchedule`, its Longhorn recurring backup job.
    pub fn new(name: &str, context: &LabContext) -> Result<Self> {
        let validator = NameValidator::new()?;
        validator.validate("app", name)?;

        let config = context.config.clone();
        let settings = AppSettings::load(&config, name)?;
        let metadata = Metadata::new(name, name, settings.version.clone());

        let mut graph = ResourceGraph::new();
        let identity = metadata.get(None, false);
        let namespace = Namespace {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                labels: Some(identity.labels.clone()),
                ..Default::default()
            },
            ..Default::default()
        };
        let namespace_id = graph.push(Resource::typed(name, &namespace)?)?;

        let backup_group = match &settings.backup_schedule {
            Some(cron) => {
                config.require_enabled(name, "longhorn")?;
                let group = format!("{}-backup", name);
                let job = build_recurring_backup(
                    &group,
                    LONGHORN_NAMESPACE,
                    identity.labels.clone(),
                    &group,
                    cron,
                    BACKUP_RETAIN,
                );
                graph.push(Resource::dynamic(name, recurring_job_api(), job)?)?;
                tracing::info!("{}: volumes backed up on '{}'", name, cron);
                Some(group)
            }
            None => None,
        };

        let storage = Storage::new(
            &metadata,
            namespace_id.clone(),
            config.clone(),
            &context.platform,
            backup_group,
        );
        let network = Network::new(
            name,
            config.clone(),
            context.platform.clone(),
            namespace_id.clone(),
        );
        let databases = Databases::new(&metadata, config.clone(), namespace_id.clone());
        let nodes = Nodes::new(name, config.clone())?;

        Ok(Self {
            name: name.to_string(),
            config,
            platform: context.platform.clone(),
            settings,
            validator,
            metadata,
            nodes,
            storage,
            network,
            databases,
            graph,
            namespace_id,
            workloads: BTreeSet::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn is_storage_only(&self) -> bool {
        self.settings.storage_only
    }

    pub fn add_storage(&mut self, args: PersistentVolumeArgs) -> Result<&mut Self> {
        if let Some(name) = &args.name {
            self.validator.validate("volume", name)?;
        }
        self.storage
            .add_persistent_volume(&mut self.graph, &self.metadata, args)?;
        Ok(self)
    }

    pub fn add_local_storage(&mut self, args: LocalVolumeArgs) -> Result<&mut Self> {
        if let Some(name) = &args.name {
            self.validator.validate("volume", name)?;
        }
        self.storage.add_local_volume(args)?;
        Ok(self)
    }

    pub fn add_config_volume(
        &mut self,
        name: &str,
        files: BTreeMap<String, String>,
    ) -> Result<&mut Self> {
        self.validator.validate("volume", name)?;
        self.storage
            .add_config_volume(&mut self.graph, &mut self.metadata, name, files)?;
        Ok(self)
    }

    pub fn add_mariadb(&mut self, args: DatabaseArgs) -> Result<&mut Self> {
        self.databases
            .add_mariadb(&mut self.graph, &self.metadata, &mut self.storage, args)?;
        Ok(self)
    }

    pub fn add_postgres(&mut self, args: DatabaseArgs) -> Result<&mut Self> {
        self.databases
            .add_postgres(&mut self.graph, &self.metadata, &mut self.storage, args)?;
        Ok(self)
    }

    pub fn database(&self, name: &str) -> Result<DatabaseConfig> {
        self.databases.get_config(name)
    }

    pub fn database_wait_container(&self, name: &str) -> Result<InitContainerSpec> {
        self.databases.get_wait_container(name)
    }

    pub fn add_deployment(&mut self, spec: ContainerSpec) -> Result<&mut Self> {
        self.add_workload(WorkloadKind::Deployment, spec)
    }

    pub fn add_daemonset(&mut self, spec: ContainerSpec) -> Result<&mut Self> {
        self.add_workload(WorkloadKind::DaemonSet, spec)
    }

    pub fn add_job(&mut self, spec: ContainerSpec) -> Result<&mut Self> {
        self.add_workload(WorkloadKind::Job, spec)
    }

    fn add_workload(&mut self, kind: WorkloadKind, spec: ContainerSpec) -> Result<&mut Self> {
        if self.settings.storage_only {
            tracing::info!(
                "{}: storageOnly is set, skipping {} '{}'",
                self.name,
                kind,
                spec.name.as_deref().unwrap_or(&self.name)
            );
            return Ok(self);
        }

        let component = spec.name.clone();
        let component = component.as_deref();
        match (kind, component) {
            (WorkloadKind::Deployment, _) if spec.ports.is_empty() => {
                return Err(LabError::contract(format!(
                    "deployment '{}' of '{}' exposes no ports",
                    component.unwrap_or(&self.name),
                    self.name
                )))
            }
            (WorkloadKind::DaemonSet | WorkloadKind::Job, None) => {
                return Err(LabError::contract(format!(
                    "{} of '{}' needs a name",
                    kind, self.name
                )))
            }
            _ => {}
        }
        if let Some(component) = component {
            self.validator.validate("component", component)?;
        }
        let key = component.unwrap_or(DEFAULT_COMPONENT).to_string();
        if self.workloads.contains(&key) {
            return Err(LabError::duplicate("workload", key, &self.name));
        }

        let gpu = self.nodes.resolve_gpu(spec.gpu);
        if let Some(gpu) = gpu {
            self.storage.add_device_volumes(gpu)?;
        }

        let mut volume_names: Vec<&str> = Vec::new();
        let mounts = spec
            .volume_mounts
            .iter()
            .chain(spec.init_containers.iter().flat_map(|i| i.volume_mounts.iter()));
        for mount in mounts {
            if !volume_names.contains(&mount.name.as_str()) {
                volume_names.push(&mount.name);
            }
        }
        let device_mounts = if gpu.is_some() {
            self.storage.device_mounts()
        } else {
            Vec::new()
        };
        let mut volumes = Vec::new();
        for name in volume_names
            .into_iter()
            .chain(device_mounts.iter().map(|(name, _)| name.as_str()))
        {
            volumes.push(self.storage.pod_volume(name)?);
        }

        let local_mounts: Vec<VolumeMountSpec> = spec
            .volume_mounts
            .iter()
            .filter(|m| self.storage.is_local(&m.name))
            .cloned()
            .collect();
        let pinned_node = if local_mounts.is_empty() {
            None
        } else {
            self.storage.pinned_node()
        };
        let affinity = self.nodes.get_affinity(component, gpu, pinned_node)?;

        let identity = self.metadata.get(component, false);
        let mut dependencies = vec![self.namespace_id.clone()];
        dependencies.extend(self.storage.resource_ids().iter().cloned());
        dependencies.extend(self.databases.cluster_ids().iter().cloned());

        let env_secret = if spec.secret_env.is_empty() {
            None
        } else {
            let secret_name = format!("{}{}", identity.name, SECRET_SUFFIX_ENV);
            let mut builder =
                SecretBuilder::new(identity.renamed(secret_name.clone()).to_object_meta());
            for (key, value) in &spec.secret_env {
                builder = builder.with_entry(key, value.expose());
            }
            let id = self.graph.push(
                Resource::typed(&self.name, &builder.build())?.depends_on([&self.namespace_id]),
            )?;
            dependencies.push(id);
            Some(secret_name)
        };

        let pod_identity = self.metadata.get(component, true);
        let pod_metadata = ObjectMeta {
            labels: Some(pod_identity.labels),
            annotations: (!pod_identity.annotations.is_empty()).then_some(pod_identity.annotations),
            ..Default::default()
        };
        let gpu_env = GpuEnvSettings::load(
            &self.config,
            &self.name,
            self.platform.amd_gfx_version.as_deref(),
            self.platform.amd_target.as_deref(),
        );
        let template = PodTemplateBuilder::new(&spec, component.unwrap_or(&self.name), pod_metadata)
            .with_volumes(volumes)
            .with_local_mounts(local_mounts)
            .with_device_mounts(device_mounts)
            .with_gpu(gpu, gpu_env.gfx_version, gpu_env.target)
            .with_affinity(affinity)
            .with_env_secret(env_secret)
            .build()?;

        let builder = WorkloadBuilder::new(
            identity.to_object_meta(),
            self.metadata.get_selector_labels(component),
            template,
        );
        let resource = match kind {
            WorkloadKind::Deployment => Resource::typed(&self.name, &builder.build_deployment())?,
            WorkloadKind::DaemonSet => Resource::typed(&self.name, &builder.build_daemon_set())?,
            WorkloadKind::Job => Resource::typed(&self.name, &builder.build_job())?,
        };
        self.graph.push(resource.depends_on(dependencies.iter()))?;
        tracing::info!("{}: {} '{}'", self.name, kind, identity.name);

        if kind == WorkloadKind::Deployment {
            self.network
                .create_endpoints(&mut self.graph, &self.metadata, &spec, component)?;
        }
        self.workloads.insert(key);
        Ok(self)
    }

    pub fn endpoints(&self) -> &BTreeMap<String, String> {
        self.network.endpoints()
    }

    pub fn cluster_endpoints(&self) -> &BTreeMap<String, String> {
        self.network.cluster_endpoints()
    }

    pub fn finish(self) -> ApplicationOutput {
        let (endpoints, cluster_endpoints) = self.network.into_endpoints();
        ApplicationOutput {
            resources: self.graph,
            endpoints,
            cluster_endpoints,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::application::spec::{HealthCheck, PortSpec};
    use crate::domain::application::storage::StorageType;
    use crate::domain::config::StaticConfigProvider;
    use k8s_openapi::api::apps::v1::{DaemonSet, Deployment};
    use k8s_openapi::api::batch::v1::Job;
    use k8s_openapi::api::core::v1::Secret;

    fn context(provider: StaticConfigProvider) -> LabContext {
        let provider = provider.set("tailscale", "tailnet", "tailnet.example");
        LabContext::new(Config::new(provider)).unwrap()
    }

    #[test]
    fn test_deployment_with_storage_and_endpoint() {
        let ctx = context(StaticConfigProvider::new());
        let mut app = Application::new("widget", &ctx).unwrap();
        app.add_storage(PersistentVolumeArgs::default())
            .unwrap()
            .add_deployment(
                ContainerSpec::new("widget:1.0")
                    .port(PortSpec::http("http", 8080))
                    .mount("widget", "/data")
                    .liveness(HealthCheck::http("/healthz")),
            )
            .unwrap();
        let output = app.finish();

        assert_eq!(output.endpoints["widget"], "https://widget.tailnet.example");
        let deployment = output.resources.find("Deployment", Some("widget"), "widget").unwrap();
        assert!(deployment
            .depends_on
            .iter()
            .any(|d| d.kind == "PersistentVolumeClaim"));

        let deployment: Deployment = deployment.to_typed().unwrap();
        let pod = deployment.spec.unwrap().template.spec.unwrap();
        let volume = &pod.volumes.unwrap()[0];
        assert_eq!(
            volume.persistent_volume_claim.as_ref().unwrap().claim_name,
            "widget"
        );
    }

    #[test]
    fn test_config_volume_sets_checksum_on_pod_template() {
        let ctx = context(StaticConfigProvider::new());
        let mut app = Application::new("bitcoin-core", &ctx).unwrap();
        let mut files = BTreeMap::new();
        files.insert("bitcoin.conf".to_string(), "server=1".to_string());
        app.add_config_volume("config", files)
            .unwrap()
            .add_deployment(
                ContainerSpec::new("bitcoin:27")
                    .port(PortSpec::tcp("rpc", 8332))
                    .mount_file("config", "/etc/bitcoin/bitcoin.conf", "bitcoin.conf"),
            )
            .unwrap();
        let output = app.finish();

        let deployment: Deployment = output
            .resources
            .get_typed(Some("bitcoin-core"), "bitcoin-core")
            .unwrap()
            .unwrap();
        let annotations = deployment
            .spec
            .unwrap()
            .template
            .metadata
            .unwrap()
            .annotations
            .unwrap();
        assert!(annotations.contains_key(ANNOTATION_CONFIG_CHECKSUM));
        assert!(deployment.metadata.annotations.is_none());
        assert_eq!(output.endpoints["bitcoin-core-rpc"], "bitcoin-core.tailnet.example:8332");
    }

    #[test]
    fn test_storage_only_skips_workloads() {
        let ctx = context(StaticConfigProvider::new().set("ollama", "storageOnly", "true"));
        let mut app = Application::new("ollama", &ctx).unwrap();
        app.add_storage(PersistentVolumeArgs {
            storage_type: StorageType::Gpu,
            ..Default::default()
        })
        .unwrap()
        .add_deployment(ContainerSpec::new("ollama:latest").port(PortSpec::http("http", 11434)))
        .unwrap();
        let output = app.finish();

        assert_eq!(output.resources.of_kind("PersistentVolumeClaim").count(), 1);
        assert_eq!(output.resources.of_kind("Deployment").count(), 0);
        assert!(output.endpoints.is_empty());
    }

    #[test]
    fn test_workload_contracts() {
        let ctx = context(StaticConfigProvider::new());
        let mut app = Application::new("beszel", &ctx).unwrap();
        assert!(matches!(
            app.add_deployment(ContainerSpec::new("hub:1")),
            Err(LabError::ContractViolation(_))
        ));
        assert!(matches!(
            app.add_daemonset(ContainerSpec::new("agent:1")),
            Err(LabError::ContractViolation(_))
        ));
        assert!(matches!(
            app.add_deployment(ContainerSpec::new("hub:1").port(PortSpec::http("http", 8090)).mount("missing", "/x")),
            Err(LabError::ContractViolation(_))
        ));

        app.add_deployment(ContainerSpec::new("hub:1").port(PortSpec::http("http", 8090)))
            .unwrap();
        assert!(matches!(
            app.add_deployment(ContainerSpec::new("hub:2").port(PortSpec::http("http", 8090))),
            Err(LabError::Duplicate { .. })
        ));
    }

    #[test]
    fn test_job_runs_once_against_app_storage() {
        let ctx = context(StaticConfigProvider::new());
        let mut app = Application::new("bitcoin-core", &ctx).unwrap();
        assert!(matches!(
            app.add_job(ContainerSpec::new("bitcoin:27")),
            Err(LabError::ContractViolation(_))
        ));

        app.add_storage(PersistentVolumeArgs::default())
            .unwrap()
            .add_job(
                ContainerSpec::new("bitcoin:27")
                    .named("reindex")
                    .mount("bitcoin-core", "/data")
                    .restart_policy("OnFailure"),
            )
            .unwrap();
        let output = app.finish();

        let resource = output
            .resources
            .find("Job", Some("bitcoin-core"), "bitcoin-core-reindex")
            .unwrap();
        let claim = ResourceId::new("PersistentVolumeClaim", Some("bitcoin-core"), "bitcoin-core");
        assert!(resource.depends_on.contains(&claim));

        let job: Job = resource.to_typed().unwrap();
        let pod = job.spec.unwrap().template.spec.unwrap();
        assert_eq!(pod.restart_policy.as_deref(), Some("OnFailure"));
        assert_eq!(
            pod.volumes.unwrap()[0]
                .persistent_volume_claim
                .as_ref()
                .unwrap()
                .claim_name,
            "bitcoin-core"
        );
        assert_eq!(output.resources.of_kind("Service").count(), 0);
        assert_eq!(output.resources.of_kind("Ingress").count(), 0);
        assert!(output.endpoints.is_empty());
    }

    #[test]
    fn test_secret_env_goes_to_env_secret() {
        let ctx = context(StaticConfigProvider::new());
        let mut app = Application::new("beszel", &ctx).unwrap();
        app.add_daemonset(
            ContainerSpec::new("henrygd/beszel-agent:latest")
                .named("agent")
                .secret_env("KEY", crate::domain::config::Secret::new("ssh-ed25519 AAAA")),
        )
        .unwrap();
        let output = app.finish();

        let secret: Secret = output
            .resources
            .get_typed(Some("beszel"), "beszel-agent-env")
            .unwrap()
            .unwrap();
        assert_eq!(secret.string_data.unwrap()["KEY"], "ssh-ed25519 AAAA");

        let daemonset: DaemonSet = output
            .resources
            .get_typed(Some("beszel"), "beszel-agent")
            .unwrap()
            .unwrap();
        let env = daemonset.spec.unwrap().template.spec.unwrap().containers[0]
            .env
            .clone()
            .unwrap();
        assert!(env[0].value.is_none());
        assert_eq!(output.resources.of_kind("Service").count(), 0);
    }

    #[test]
    fn test_backup_schedule_creates_recurring_job() {
        let ctx = context(
            StaticConfigProvider::new()
                .set("longhorn", "enabled", "true")
                .set("n8n", "backupSchedule", "0 3 * * *"),
        );
        let mut app = Application::new("n8n", &ctx).unwrap();
        app.add_storage(PersistentVolumeArgs::default()).unwrap();
        let output = app.finish();

        let job = output
            .resources
            .find("RecurringJob", Some(LONGHORN_NAMESPACE), "n8n-backup")
            .unwrap();
        assert_eq!(job.object.data["spec"]["cron"], "0 3 * * *");
        let claim = output
            .resources
            .find("PersistentVolumeClaim", Some("n8n"), "n8n")
            .unwrap();
        let labels = claim.object.metadata.labels.as_ref().unwrap();
        assert_eq!(
            labels
                .get("recurring-job-group.longhorn.io/n8n-backup")
                .map(String::as_str),
            Some("enabled")
        );
    }
}
