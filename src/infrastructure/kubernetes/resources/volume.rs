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

use crate::infrastructure::constants::{
    DEFAULT_ACCESS_MODE, LONGHORN_CSI_DRIVER, RECLAIM_POLICY_RETAIN,
};
use k8s_openapi::api::core::v1::{
    CSIPersistentVolumeSource, PersistentVolume, PersistentVolumeClaim, PersistentVolumeClaimSpec,
    PersistentVolumeSpec, TypedLocalObjectReference, VolumeResourceRequirements,
};
use k8s_openapi::api::storage::v1::StorageClass;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::BTreeMap;

fn storage_request(size: &str) -> BTreeMap<String, Quantity> {
    let mut requests = BTreeMap::new();
    requests.insert("storage".to_string(), Quantity(size.to_string()));
    requests
}

pub struct PersistentVolumeClaimBuilder {
    metadata: ObjectMeta,
    size: String,
    storage_class: String,
    volume_name: Option<String>,
    clone_from: Option<String>,
}

impl PersistentVolumeClaimBuilder {
    pub fn new(metadata: ObjectMeta, size: &str, storage_class: &str) -> Self {
        Self {
            metadata,
            size: size.to_string(),
            storage_class: storage_class.to_string(),
            volume_name: None,
            clone_from: None,
        }
    }

    /// Binds the claim to a pre-created PersistentVolume.
    pub fn bound_to(mut self, volume_name: &str) -> Self {
        self.volume_name = Some(volume_name.to_string());
        self
    }

    /// Populates the claim from another claim in the same namespace.
    pub fn cloned_from(mut self, claim: &str) -> Self {
        self.clone_from = Some(claim.to_string());
        self
    }

    pub fn build(self) -> PersistentVolumeClaim {
        PersistentVolumeClaim {
            metadata: self.metadata,
            spec: Some(PersistentVolumeClaimSpec {
                access_modes: Some(vec![DEFAULT_ACCESS_MODE.to_string()]),
                storage_class_name: Some(self.storage_class),
                volume_name: self.volume_name,
                data_source: self.clone_from.map(|name| TypedLocalObjectReference {
                    api_group: None,
                    kind: "PersistentVolumeClaim".to_string(),
                    name,
                }),
                resources: Some(VolumeResourceRequirements {
                    requests: Some(storage_request(&self.size)),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        }
    }
}

/// PersistentVolume attached to an existing Longhorn volume, e.g. one restored from backup.
pub fn build_restored_volume(
    name: &str,
    labels: BTreeMap<String, String>,
    volume_handle: &str,
    size: &str,
    storage_class: &str,
) -> PersistentVolume {
    let mut capacity = BTreeMap::new();
    capacity.insert("storage".to_string(), Quantity(size.to_string()));

    PersistentVolume {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            labels: Some(labels),
            ..Default::default()
        },
        spec: Some(PersistentVolumeSpec {
            access_modes: Some(vec![DEFAULT_ACCESS_MODE.to_string()]),
            capacity: Some(capacity),
            storage_class_name: Some(storage_class.to_string()),
            persistent_volume_reclaim_policy: Some(RECLAIM_POLICY_RETAIN.to_string()),
            csi: Some(CSIPersistentVolumeSource {
                driver: LONGHORN_CSI_DRIVER.to_string(),
                volume_handle: volume_handle.to_string(),
                fs_type: Some("ext4".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Class with no provisioner; only pre-created volumes carrying it can satisfy claims.
pub fn build_static_storage_class(name: &str, labels: BTreeMap<String, String>) -> StorageClass {
    StorageClass {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            labels: Some(labels),
            ..Default::default()
        },
        provisioner: "kubernetes.io/no-provisioner".to_string(),
        reclaim_policy: Some(RECLAIM_POLICY_RETAIN.to_string()),
        volume_binding_mode: Some("WaitForFirstConsumer".to_string()),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta() -> ObjectMeta {
        ObjectMeta {
            name: Some("app".to_string()),
            namespace: Some("app".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_dynamic_claim() {
        let claim = PersistentVolumeClaimBuilder::new(meta(), "5Gi", "longhorn").build();
        let spec = claim.spec.unwrap();
        assert_eq!(spec.storage_class_name.as_deref(), Some("longhorn"));
        assert!(spec.volume_name.is_none());
        assert!(spec.data_source.is_none());
        assert_eq!(
            spec.resources.unwrap().requests.unwrap()["storage"],
            Quantity("5Gi".to_string())
        );
    }

    #[test]
    fn test_cloned_and_bound_claims() {
        let cloned = PersistentVolumeClaimBuilder::new(meta(), "5Gi", "longhorn")
            .cloned_from("source")
            .build();
        let source = cloned.spec.unwrap().data_source.unwrap();
        assert_eq!(source.kind, "PersistentVolumeClaim");
        assert_eq!(source.name, "source");

        let bound = PersistentVolumeClaimBuilder::new(meta(), "5Gi", "longhorn")
            .bound_to("app-app")
            .build();
        assert_eq!(bound.spec.unwrap().volume_name.as_deref(), Some("app-app"));
    }

    #[test]
    fn test_restored_volume_uses_handle() {
        let pv = build_restored_volume("app-app", BTreeMap::new(), "restored-x", "5Gi", "longhorn");
        let csi = pv.spec.unwrap().csi.unwrap();
        assert_eq!(csi.driver, LONGHORN_CSI_DRIVER);
        assert_eq!(csi.volume_handle, "restored-x");
    }
}
