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

//! Database clusters managed by the MariaDB operator and CloudNativePG.

use crate::infrastructure::constants::*;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::{ApiResource, DynamicObject, GroupVersionKind};
use serde_json::{json, Value};

/// Storage for the cluster's volume-claim template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterStorage {
    pub size: String,
    pub storage_class: String,
    /// Dynamic volumes let the operator provision; restored ones bind through a
    /// dedicated class to a pre-created PersistentVolume.
    pub dynamic: bool,
}

pub fn mariadb_api() -> ApiResource {
    ApiResource::from_gvk_with_plural(
        &GroupVersionKind::gvk("k8s.mariadb.com", "v1alpha1", "MariaDB"),
        "mariadbs",
    )
}

pub fn postgres_cluster_api() -> ApiResource {
    ApiResource::from_gvk_with_plural(
        &GroupVersionKind::gvk("postgresql.cnpg.io", "v1", "Cluster"),
        "clusters",
    )
}

fn claim_template(storage: &ClusterStorage) -> Value {
    json!({
        "storageClassName": storage.storage_class,
        "accessModes": [DEFAULT_ACCESS_MODE],
        "resources": { "requests": { "storage": storage.size } },
    })
}

fn with_metadata(mut object: DynamicObject, metadata: ObjectMeta) -> DynamicObject {
    object.metadata.labels = metadata.labels;
    object.metadata.annotations = metadata.annotations;
    object
}

pub struct MariaDbBuilder {
    metadata: ObjectMeta,
    secret: String,
    database: String,
    username: String,
    storage: ClusterStorage,
}

impl MariaDbBuilder {
    pub fn new(metadata: ObjectMeta, secret: &str, storage: ClusterStorage) -> Self {
        Self {
            metadata,
            secret: secret.to_string(),
            database: DEFAULT_DATABASE_NAME.to_string(),
            username: DEFAULT_DATABASE_NAME.to_string(),
            storage,
        }
    }

    pub fn with_database(mut self, database: &str, username: &str) -> Self {
        self.database = database.to_string();
        self.username = username.to_string();
        self
    }

    pub fn build(self) -> DynamicObject {
        let storage = if self.storage.dynamic {
            json!({ "size": self.storage.size, "storageClassName": self.storage.storage_class })
        } else {
            json!({ "volumeClaimTemplate": claim_template(&self.storage) })
        };
        let name = self.metadata.name.clone().unwrap_or_default();
        let namespace = self.metadata.namespace.clone().unwrap_or_default();

        let object = DynamicObject::new(&name, &mariadb_api())
            .within(&namespace)
            .data(json!({
                "spec": {
                    "rootPasswordSecretKeyRef": { "name": self.secret, "key": "rootPassword" },
                    "username": self.username,
                    "passwordSecretKeyRef": { "name": self.secret, "key": "password" },
                    "database": self.database,
                    "port": MARIADB_PORT,
                    "storage": storage,
                }
            }));
        with_metadata(object, self.metadata)
    }
}

pub struct PostgresClusterBuilder {
    metadata: ObjectMeta,
    secret: String,
    database: String,
    owner: String,
    storage: ClusterStorage,
}

impl PostgresClusterBuilder {
    pub fn new(metadata: ObjectMeta, secret: &str, storage: ClusterStorage) -> Self {
        Self {
            metadata,
            secret: secret.to_string(),
            database: DEFAULT_DATABASE_NAME.to_string(),
            owner: DEFAULT_DATABASE_NAME.to_string(),
            storage,
        }
    }

    pub fn with_database(mut self, database: &str, owner: &str) -> Self {
        self.database = database.to_string();
        self.owner = owner.to_string();
        self
    }

    pub fn build(self) -> DynamicObject {
        let storage = if self.storage.dynamic {
            json!({ "size": self.storage.size, "storageClass": self.storage.storage_class })
        } else {
            json!({ "size": self.storage.size, "pvcTemplate": claim_template(&self.storage) })
        };
        let name = self.metadata.name.clone().unwrap_or_default();
        let namespace = self.metadata.namespace.clone().unwrap_or_default();

        let object = DynamicObject::new(&name, &postgres_cluster_api())
            .within(&namespace)
            .data(json!({
                "spec": {
                    "instances": 1,
                    "bootstrap": {
                        "initdb": {
                            "database": self.database,
                            "owner": self.owner,
                            "secret": { "name": self.secret },
                        }
                    },
                    "storage": storage,
                }
            }));
        with_metadata(object, self.metadata)
    }
}
