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

//! Named volumes of one application.
//!
//! Each logical volume moves once from unprovisioned to one of the persistent,
//! local, config or device states. Persistent volumes are dynamic (freshly
//! provisioned) unless they are cloned from a claim or attached to an existing
//! volume handle via `fromVolume`.

use super::metadata::{Metadata, ResourceIdentity};
use crate::domain::config::{Config, GpuType, PlatformConfig, StorageClasses, StorageSettings};
use crate::infrastructure::constants::*;
use crate::infrastructure::kubernetes::graph::{Resource, ResourceId, ResourceSink};
use crate::infrastructure::kubernetes::resources::configmap::ConfigMapBuilder;
use crate::infrastructure::kubernetes::resources::volume::{
    build_restored_volume, build_static_storage_class, PersistentVolumeClaimBuilder,
};
use crate::shared::error::{LabError, Result};
use k8s_openapi::api::core::v1::{
    ConfigMapVolumeSource, HostPathVolumeSource, PersistentVolumeClaimVolumeSource, Volume,
};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageType {
    #[default]
    Default,
    Gpu,
    Database,
    Large,
}

impl StorageType {
    pub fn storage_class<'a>(&self, classes: &'a StorageClasses) -> &'a str {
        match self {
            StorageType::Default => classes.default.as_str(),
            StorageType::Gpu => classes.gpu.as_str(),
            StorageType::Database => classes.database.as_str(),
            StorageType::Large => classes.large.as_str(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PersistentVolumeArgs {
    /// Logical name; defaults to the app name.
    pub name: Option<String>,
    pub size: Option<String>,
    pub storage_class: Option<String>,
    pub storage_type: StorageType,
    pub from_volume: Option<String>,
    pub clone_from_claim: Option<String>,
    pub override_full_name: Option<String>,
    /// The claim itself is created by an operator's volume-claim template.
    pub claim_template: bool,
}

#[derive(Debug, Clone, Default)]
pub struct LocalVolumeArgs {
    pub name: Option<String>,
    pub host_path: Option<String>,
    pub size: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistentVolumeState {
    pub claim_name: String,
    pub size: String,
    pub storage_class: String,
    pub volume_handle: Option<String>,
    pub clone_from_claim: Option<String>,
    pub dynamic: bool,
    pub claim_template: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalVolume {
    pub host_path: String,
    pub size: Option<String>,
    pub node: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigVolume {
    pub config_map: String,
    pub files: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceVolume {
    pub host_path: String,
    pub device_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VolumeSpec {
    Persistent(PersistentVolumeState),
    Local(LocalVolume),
    Config(ConfigVolume),
    Device(DeviceVolume),
}

#[derive(Debug, Clone)]
pub struct Storage {
    app_name: String,
    namespace: String,
    namespace_id: ResourceId,
    config: Config,
    classes: StorageClasses,
    backup_by_default: bool,
    backup_group: Option<String>,
    volumes: BTreeMap<String, VolumeSpec>,
    resource_ids: Vec<ResourceId>,
    class_ids: BTreeMap<String, ResourceId>,
    amd_devices_added: bool,
}

impl Storage {
    pub fn new(
        metadata: &Metadata,
        namespace_id: ResourceId,
        config: Config,
        platform: &PlatformConfig,
        backup_group: Option<String>,
    ) -> Self {
        Self {
            app_name: metadata.app_name().to_string(),
            namespace: metadata.namespace().to_string(),
            namespace_id,
            config,
            classes: platform.storage_classes.clone(),
            backup_by_default: platform.backup_by_default,
            backup_group,
            volumes: BTreeMap::new(),
            resource_ids: Vec::new(),
            class_ids: BTreeMap::new(),
            amd_devices_added: false,
        }
    }

    /// Config prefix and component suffix for a logical volume name.
    fn prefix<'a>(&self, name: &'a str) -> Option<&'a str> {
        if name == self.app_name {
            None
        } else {
            Some(name)
        }
    }

    fn ensure_new(&self, name: &str) -> Result<()> {
        if self.volumes.contains_key(name) {
            Err(LabError::duplicate("volume", name, &self.app_name))
        } else {
            Ok(())
        }
    }

    pub fn add_persistent_volume(
        &mut self,
        sink: &mut dyn ResourceSink,
        metadata: &Metadata,
        args: PersistentVolumeArgs,
    ) -> Result<String> {
        let name = args.name.clone().unwrap_or_else(|| self.app_name.clone());
        self.ensure_new(&name)?;

        let prefix = self.prefix(&name);
        let settings = StorageSettings::load(&self.config, &self.app_name, prefix)?;

        let from_volume = args.from_volume.or(settings.from_volume);
        let clone_from_claim = args.clone_from_claim.or(settings.clone_from_claim);
        // database volumes keep their own class unless one is set for them by name
        let configured_class = if args.claim_template || args.storage_type == StorageType::Database {
            settings.own_storage_class
        } else {
            settings.storage_class
        };
        let explicit_class = args.storage_class.or(configured_class);

        if from_volume.is_some() && explicit_class.is_some() {
            return Err(LabError::contract(format!(
                "volume '{}' of '{}' sets both fromVolume and storageClass; an existing volume keeps its own class",
                name, self.app_name
            )));
        }
        if from_volume.is_some() && clone_from_claim.is_some() {
            return Err(LabError::contract(format!(
                "volume '{}' of '{}' sets both fromVolume and cloneFromClaim",
                name, self.app_name
            )));
        }
        if args.claim_template && clone_from_claim.is_some() {
            return Err(LabError::contract(format!(
                "volume '{}' of '{}' is provisioned from a claim template and cannot be cloned",
                name, self.app_name
            )));
        }

        let size = args
            .size
            .or(settings.size)
            .unwrap_or_else(|| DEFAULT_STORAGE_SIZE.to_string());
        let mut storage_class = explicit_class
            .unwrap_or_else(|| args.storage_type.storage_class(&self.classes).to_string());
        let claim_name = args
            .override_full_name
            .unwrap_or_else(|| metadata.name(prefix));

        let mut identity = metadata.get(prefix, false).renamed(claim_name.clone());
        self.add_backup_labels(&mut identity, settings.backup);
        let volume_name = format!("{}-{}", self.namespace, name);

        match (&from_volume, args.claim_template) {
            (Some(handle), true) => {
                // claim templates select the restored volume by a dedicated class
                storage_class = volume_name.clone();
                let class = build_static_storage_class(&storage_class, identity.labels.clone());
                let class_id = sink.push(
                    Resource::typed(&self.app_name, &class)?.delete_before_replace(),
                )?;
                let pv = build_restored_volume(
                    &volume_name,
                    identity.labels.clone(),
                    handle,
                    &size,
                    &storage_class,
                );
                let pv_id = sink.push(Resource::typed(&self.app_name, &pv)?.depends_on([&class_id]))?;
                self.resource_ids.push(class_id.clone());
                self.resource_ids.push(pv_id);
                self.class_ids.insert(name.clone(), class_id);
            }
            (Some(handle), false) => {
                let pv = build_restored_volume(
                    &volume_name,
                    identity.labels.clone(),
                    handle,
                    &size,
                    &storage_class,
                );
                let pv_id = sink.push(Resource::typed(&self.app_name, &pv)?)?;
                let claim = PersistentVolumeClaimBuilder::new(
                    identity.to_object_meta(),
                    &size,
                    &storage_class,
                )
                .bound_to(&volume_name)
                .build();
                let claim_id = sink.push(
                    Resource::typed(&self.app_name, &claim)?
                        .depends_on([&self.namespace_id, &pv_id]),
                )?;
                self.resource_ids.push(pv_id);
                self.resource_ids.push(claim_id);
            }
            (None, true) => {}
            (None, false) => {
                let mut builder = PersistentVolumeClaimBuilder::new(
                    identity.to_object_meta(),
                    &size,
                    &storage_class,
                );
                if let Some(source) = &clone_from_claim {
                    builder = builder.cloned_from(source);
                }
                let claim_id = sink.push(
                    Resource::typed(&self.app_name, &builder.build())?
                        .depends_on([&self.namespace_id]),
                )?;
                self.resource_ids.push(claim_id);
            }
        }

        let dynamic = from_volume.is_none() && clone_from_claim.is_none();
        tracing::info!(
            "{}: volume '{}' ({}, class {}, {})",
            self.app_name,
            name,
            size,
            storage_class,
            if dynamic { "dynamic" } else { "existing" }
        );

        self.volumes.insert(
            name.clone(),
            VolumeSpec::Persistent(PersistentVolumeState {
                claim_name,
                size,
                storage_class,
                volume_handle: from_volume,
                clone_from_claim,
                dynamic,
                claim_template: args.claim_template,
            }),
        );
        Ok(name)
    }

    fn add_backup_labels(&self, identity: &mut ResourceIdentity, backup: Option<bool>) {
        if backup.unwrap_or(self.backup_by_default) {
            identity.labels.insert(
                format!("{}/{}", LABEL_BACKUP_GROUP_PREFIX, BACKUP_GROUP_DEFAULT),
                "enabled".to_string(),
            );
        }
        if let Some(group) = &self.backup_group {
            identity.labels.insert(
                format!("{}/{}", LABEL_BACKUP_GROUP_PREFIX, group),
                "enabled".to_string(),
            );
        }
    }

    pub fn add_local_volume(&mut self, args: LocalVolumeArgs) -> Result<String> {
        let name = args.name.unwrap_or_else(|| self.app_name.clone());
        self.ensure_new(&name)?;

        let settings = StorageSettings::load(&self.config, &self.app_name, self.prefix(&name))?;
        let host_path = args.host_path.or(settings.host_path).unwrap_or_else(|| {
            format!("{}/{}/{}", LOCAL_STORAGE_ROOT, self.app_name, name)
        });
        let node = settings.local_node;

        if let (Some(node), Some(existing)) = (&node, self.pinned_node()) {
            if node != existing {
                return Err(LabError::contract(format!(
                    "local volumes of '{}' are pinned to different nodes ({} and {})",
                    self.app_name, existing, node
                )));
            }
        }

        tracing::info!("{}: local volume '{}' at {}", self.app_name, name, host_path);
        self.volumes.insert(
            name.clone(),
            VolumeSpec::Local(LocalVolume {
                host_path,
                size: args.size.or(settings.size),
                node,
            }),
        );
        Ok(name)
    }

    pub fn add_config_volume(
        &mut self,
        sink: &mut dyn ResourceSink,
        metadata: &mut Metadata,
        name: &str,
        files: BTreeMap<String, String>,
    ) -> Result<String> {
        self.ensure_new(name)?;

        let identity = metadata.get(self.prefix(name), false);
        let config_map = ConfigMapBuilder::new(identity.to_object_meta())
            .with_files(&files)
            .build();
        let id = sink.push(
            Resource::typed(&self.app_name, &config_map)?.depends_on([&self.namespace_id]),
        )?;
        self.resource_ids.push(id);

        metadata.add_config_hash(name, files.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        self.volumes.insert(
            name.to_string(),
            VolumeSpec::Config(ConfigVolume {
                config_map: identity.name,
                files,
            }),
        );
        Ok(name.to_string())
    }

    /// AMD GPUs are reached through `/dev/kfd` and `/dev/dri`; added once per Storage.
    pub fn add_device_volumes(&mut self, gpu: GpuType) -> Result<()> {
        if gpu != GpuType::Amd || self.amd_devices_added {
            return Ok(());
        }
        for (name, host_path, device_type) in [
            ("dev-kfd", DEVICE_KFD, VOLUME_TYPE_CHAR_DEVICE),
            ("dev-dri", DEVICE_DRI, VOLUME_TYPE_DIRECTORY),
        ] {
            self.ensure_new(name)?;
            self.volumes.insert(
                name.to_string(),
                VolumeSpec::Device(DeviceVolume {
                    host_path: host_path.to_string(),
                    device_type: device_type.to_string(),
                }),
            );
        }
        self.amd_devices_added = true;
        Ok(())
    }

    pub fn volume(&self, name: &str) -> Option<&VolumeSpec> {
        self.volumes.get(name)
    }

    fn persistent(&self, name: &str) -> Result<&PersistentVolumeState> {
        match self.volumes.get(name) {
            Some(VolumeSpec::Persistent(state)) => Ok(state),
            Some(_) => Err(LabError::contract(format!(
                "volume '{}' of '{}' is not a persistent volume",
                name, self.app_name
            ))),
            None => Err(LabError::contract(format!(
                "volume '{}' of '{}' was queried before it was added",
                name, self.app_name
            ))),
        }
    }

    pub fn claim_name(&self, name: &str) -> Result<String> {
        let state = self.persistent(name)?;
        if state.claim_template {
            return Err(LabError::contract(format!(
                "volume '{}' of '{}' is claimed through a volume-claim template",
                name, self.app_name
            )));
        }
        Ok(state.claim_name.clone())
    }

    pub fn storage_class(&self, name: &str) -> Result<String> {
        Ok(self.persistent(name)?.storage_class.clone())
    }

    pub fn storage_size(&self, name: &str) -> Result<String> {
        Ok(self.persistent(name)?.size.clone())
    }

    pub fn is_dynamic(&self, name: &str) -> Result<bool> {
        Ok(self.persistent(name)?.dynamic)
    }

    pub fn volume_handle(&self, name: &str) -> Result<Option<String>> {
        Ok(self.persistent(name)?.volume_handle.clone())
    }

    /// StorageClass created for a restored claim-template volume.
    pub fn storage_class_resource(&self, name: &str) -> Option<&ResourceId> {
        self.class_ids.get(name)
    }

    pub fn is_local(&self, name: &str) -> bool {
        matches!(self.volumes.get(name), Some(VolumeSpec::Local(_)))
    }

    pub fn has_local_volumes(&self) -> bool {
        self.volumes.values().any(|v| matches!(v, VolumeSpec::Local(_)))
    }

    pub fn pinned_node(&self) -> Option<&str> {
        self.volumes.values().find_map(|v| match v {
            VolumeSpec::Local(local) => local.node.as_deref(),
            _ => None,
        })
    }

    pub fn device_volume_names(&self) -> Vec<&str> {
        self.volumes
            .iter()
            .filter(|(_, v)| matches!(v, VolumeSpec::Device(_)))
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// `(volume name, device path)` for every device volume.
    pub fn device_mounts(&self) -> Vec<(String, String)> {
        self.volumes
            .iter()
            .filter_map(|(name, v)| match v {
                VolumeSpec::Device(device) => Some((name.clone(), device.host_path.clone())),
                _ => None,
            })
            .collect()
    }

    /// Everything a workload must wait for before it is scheduled.
    pub fn resource_ids(&self) -> &[ResourceId] {
        &self.resource_ids
    }

    /// Pod volume for a logical volume name.
    pub fn pod_volume(&self, name: &str) -> Result<Volume> {
        let mut volume = Volume {
            name: name.to_string(),
            ..Default::default()
        };
        match self.volumes.get(name) {
            Some(VolumeSpec::Persistent(state)) => {
                if state.claim_template {
                    return Err(LabError::contract(format!(
                        "volume '{}' of '{}' belongs to a database cluster and cannot be mounted",
                        name, self.app_name
                    )));
                }
                volume.persistent_volume_claim = Some(PersistentVolumeClaimVolumeSource {
                    claim_name: state.claim_name.clone(),
                    read_only: None,
                });
            }
            Some(VolumeSpec::Local(local)) => {
                volume.host_path = Some(HostPathVolumeSource {
                    path: local.host_path.clone(),
                    type_: Some(VOLUME_TYPE_DIRECTORY_OR_CREATE.to_string()),
                });
            }
            Some(VolumeSpec::Config(config)) => {
                volume.config_map = Some(ConfigMapVolumeSource {
                    name: config.config_map.clone(),
                    ..Default::default()
                });
            }
            Some(VolumeSpec::Device(device)) => {
                volume.host_path = Some(HostPathVolumeSource {
                    path: device.host_path.clone(),
                    type_: Some(device.device_type.clone()),
                });
            }
            None => {
                return Err(LabError::contract(format!(
                    "volume '{}' of '{}' is mounted but was never added",
                    name, self.app_name
                )))
            }
        }
        Ok(volume)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::StaticConfigProvider;
    use crate::infrastructure::kubernetes::graph::ResourceGraph;
    use k8s_openapi::api::core::v1::{PersistentVolume, PersistentVolumeClaim};

    struct Fixture {
        graph: ResourceGraph,
        metadata: Metadata,
        storage: Storage,
    }

    fn fixture(app: &str, provider: StaticConfigProvider) -> Fixture {
        let provider = provider.set("tailscale", "tailnet", "tailnet.example");
        let config = Config::new(provider);
        let platform = PlatformConfig::load(&config).unwrap();
        let metadata = Metadata::new(app, app, None);
        let namespace_id = ResourceId::new("Namespace", None, app);
        let mut graph = ResourceGraph::new();
        let ns = k8s_openapi::api::core::v1::Namespace {
            metadata: k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta {
                name: Some(app.to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        graph.push(Resource::typed(app, &ns).unwrap()).unwrap();
        let storage = Storage::new(&metadata, namespace_id, config, &platform, None);
        Fixture {
            graph,
            metadata,
            storage,
        }
    }

    #[test]
    fn test_default_volume_is_dynamic() {
        let mut f = fixture("widget", StaticConfigProvider::new().set("widget", "storageSize", "5Gi"));
        let name = f
            .storage
            .add_persistent_volume(&mut f.graph, &f.metadata, PersistentVolumeArgs::default())
            .unwrap();

        assert_eq!(name, "widget");
        assert!(f.storage.is_dynamic("widget").unwrap());
        assert_eq!(f.storage.storage_class("widget").unwrap(), "longhorn");
        assert_eq!(f.storage.storage_size("widget").unwrap(), "5Gi");
        assert_eq!(f.storage.claim_name("widget").unwrap(), "widget");

        let claim: PersistentVolumeClaim = f.graph.get_typed(Some("widget"), "widget").unwrap().unwrap();
        assert_eq!(claim.spec.unwrap().storage_class_name.as_deref(), Some("longhorn"));
    }

    #[test]
    fn test_from_volume_attaches_existing_handle() {
        let mut f = fixture(
            "widget",
            StaticConfigProvider::new()
                .set("widget", "fromVolume", "restored-x")
                .set("widget", "storageSize", "5Gi"),
        );
        f.storage
            .add_persistent_volume(&mut f.graph, &f.metadata, PersistentVolumeArgs::default())
            .unwrap();

        assert!(!f.storage.is_dynamic("widget").unwrap());
        assert_eq!(
            f.storage.volume_handle("widget").unwrap().as_deref(),
            Some("restored-x")
        );

        let pv: PersistentVolume = f.graph.get_typed(None, "widget-widget").unwrap().unwrap();
        assert_eq!(pv.spec.unwrap().csi.unwrap().volume_handle, "restored-x");
        let claim: PersistentVolumeClaim = f.graph.get_typed(Some("widget"), "widget").unwrap().unwrap();
        assert_eq!(claim.spec.unwrap().volume_name.as_deref(), Some("widget-widget"));
    }

    #[test]
    fn test_from_volume_excludes_storage_class() {
        let cases = [
            (true, true, false, false),
            (true, false, false, true),
            (false, true, true, false),
            (false, false, true, true),
        ];
        for (arg_from, arg_class, cfg_from, cfg_class) in cases {
            let mut provider = StaticConfigProvider::new();
            if cfg_from {
                provider = provider.set("widget", "fromVolume", "restored-x");
            }
            if cfg_class {
                provider = provider.set("widget", "storageClass", "fast");
            }
            let mut f = fixture("widget", provider);
            let args = PersistentVolumeArgs {
                from_volume: arg_from.then(|| "restored-y".to_string()),
                storage_class: arg_class.then(|| "custom".to_string()),
                ..Default::default()
            };
            let result = f.storage.add_persistent_volume(&mut f.graph, &f.metadata, args);
            assert!(matches!(result, Err(LabError::ContractViolation(_))));
            assert!(f.storage.volume("widget").is_none());
        }
    }

    #[test]
    fn test_clone_is_not_dynamic() {
        let mut f = fixture("widget", StaticConfigProvider::new());
        f.storage
            .add_persistent_volume(
                &mut f.graph,
                &f.metadata,
                PersistentVolumeArgs {
                    name: Some("copy".to_string()),
                    clone_from_claim: Some("widget-old".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(!f.storage.is_dynamic("copy").unwrap());
        assert_eq!(f.storage.claim_name("copy").unwrap(), "widget-copy");
    }

    #[test]
    fn test_duplicate_volume_is_rejected() {
        let mut f = fixture("widget", StaticConfigProvider::new());
        f.storage
            .add_persistent_volume(&mut f.graph, &f.metadata, PersistentVolumeArgs::default())
            .unwrap();
        let err = f
            .storage
            .add_persistent_volume(&mut f.graph, &f.metadata, PersistentVolumeArgs::default())
            .unwrap_err();
        assert!(matches!(err, LabError::Duplicate { .. }));
    }

    #[test]
    fn test_queries_before_add_are_contract_violations() {
        let f = fixture("widget", StaticConfigProvider::new());
        assert!(matches!(
            f.storage.claim_name("widget"),
            Err(LabError::ContractViolation(_))
        ));
        assert!(f.storage.storage_class("widget").is_err());
        assert!(f.storage.storage_size("widget").is_err());
    }

    #[test]
    fn test_storage_type_and_backup_label() {
        let mut f = fixture(
            "ollama",
            StaticConfigProvider::new().set("ollama", "backupVolume", "true"),
        );
        f.storage
            .add_persistent_volume(
                &mut f.graph,
                &f.metadata,
                PersistentVolumeArgs {
                    storage_type: StorageType::Gpu,
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(f.storage.storage_class("ollama").unwrap(), "longhorn-gpu");

        let claim: PersistentVolumeClaim = f.graph.get_typed(Some("ollama"), "ollama").unwrap().unwrap();
        let labels = claim.metadata.labels.unwrap();
        assert_eq!(
            labels.get("recurring-job-group.longhorn.io/backup").map(String::as_str),
            Some("enabled")
        );
    }

    #[test]
    fn test_restored_claim_template_gets_dedicated_class() {
        let mut f = fixture(
            "mempool",
            StaticConfigProvider::new().set("mempool", "db/fromVolume", "mempool-db-backup"),
        );
        f.storage
            .add_persistent_volume(
                &mut f.graph,
                &f.metadata,
                PersistentVolumeArgs {
                    name: Some("db".to_string()),
                    storage_type: StorageType::Database,
                    claim_template: true,
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(f.storage.storage_class("db").unwrap(), "mempool-db");
        let class_id = f.storage.storage_class_resource("db").unwrap();
        assert!(f.graph.get(class_id).unwrap().delete_before_replace);
        assert!(f.storage.claim_name("db").is_err());
        assert!(f.storage.pod_volume("db").is_err());
    }

    fn add_db_volume(f: &mut Fixture) -> Result<String> {
        f.storage.add_persistent_volume(
            &mut f.graph,
            &f.metadata,
            PersistentVolumeArgs {
                name: Some("db".to_string()),
                storage_type: StorageType::Database,
                claim_template: true,
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_app_restore_handle_stays_on_default_volume() {
        let mut f = fixture(
            "n8n",
            StaticConfigProvider::new().set("n8n", "fromVolume", "n8n-restored"),
        );
        f.storage
            .add_persistent_volume(&mut f.graph, &f.metadata, PersistentVolumeArgs::default())
            .unwrap();
        add_db_volume(&mut f).unwrap();

        assert!(!f.storage.is_dynamic("n8n").unwrap());
        assert!(f.storage.is_dynamic("db").unwrap());
        assert_eq!(f.storage.volume_handle("db").unwrap(), None);
        assert_eq!(f.graph.of_kind("PersistentVolume").count(), 1);
    }

    #[test]
    fn test_app_storage_class_does_not_reach_database_volume() {
        let mut f = fixture(
            "n8n",
            StaticConfigProvider::new().set("n8n", "storageClass", "fast"),
        );
        f.storage
            .add_persistent_volume(&mut f.graph, &f.metadata, PersistentVolumeArgs::default())
            .unwrap();
        add_db_volume(&mut f).unwrap();
        assert_eq!(f.storage.storage_class("n8n").unwrap(), "fast");
        assert_eq!(f.storage.storage_class("db").unwrap(), "longhorn-database");

        let mut f = fixture(
            "n8n",
            StaticConfigProvider::new()
                .set("n8n", "storageClass", "fast")
                .set("n8n", "db/fromVolume", "n8n-db-backup"),
        );
        add_db_volume(&mut f).unwrap();
        assert_eq!(f.storage.storage_class("db").unwrap(), "n8n-db");

        let mut f = fixture(
            "n8n",
            StaticConfigProvider::new().set("n8n", "db/storageClass", "nvme"),
        );
        add_db_volume(&mut f).unwrap();
        assert_eq!(f.storage.storage_class("db").unwrap(), "nvme");
    }

    #[test]
    fn test_amd_device_volumes_added_once() {
        let mut f = fixture("ollama", StaticConfigProvider::new());
        f.storage.add_device_volumes(GpuType::Amd).unwrap();
        f.storage.add_device_volumes(GpuType::Amd).unwrap();
        f.storage.add_device_volumes(GpuType::Nvidia).unwrap();
        assert_eq!(f.storage.device_volume_names(), vec!["dev-dri", "dev-kfd"]);

        let kfd = f.storage.pod_volume("dev-kfd").unwrap();
        assert_eq!(kfd.host_path.unwrap().path, "/dev/kfd");
    }

    #[test]
    fn test_local_and_config_volumes() {
        let mut f = fixture(
            "electrs",
            StaticConfigProvider::new().set("electrs", "localNode", "node-a"),
        );
        f.storage.add_local_volume(LocalVolumeArgs::default()).unwrap();
        assert!(f.storage.has_local_volumes());
        assert!(f.storage.is_local("electrs"));
        assert_eq!(f.storage.pinned_node(), Some("node-a"));
        let volume = f.storage.pod_volume("electrs").unwrap();
        assert_eq!(volume.host_path.unwrap().path, "/var/lib/orangelab/electrs/electrs");

        let mut files = BTreeMap::new();
        files.insert("config.toml".to_string(), "network = \"bitcoin\"".to_string());
        f.storage
            .add_config_volume(&mut f.graph, &mut f.metadata, "config", files)
            .unwrap();
        assert!(f.metadata.config_hash().is_some());
        assert_eq!(
            f.storage.pod_volume("config").unwrap().config_map.unwrap().name,
            "electrs-config"
        );
    }
}
