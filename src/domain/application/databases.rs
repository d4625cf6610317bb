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

//! Operator-managed database clusters (MariaDB, PostgreSQL).

use super::metadata::Metadata;
use super::spec::InitContainerSpec;
use super::storage::{PersistentVolumeArgs, Storage, StorageType};
use crate::domain::config::{Config, Secret};
use crate::infrastructure::constants::*;
use crate::infrastructure::kubernetes::graph::{Resource, ResourceId, ResourceSink};
use crate::infrastructure::kubernetes::resources::configmap::SecretBuilder;
use crate::infrastructure::kubernetes::resources::database::{
    mariadb_api, postgres_cluster_api, ClusterStorage, MariaDbBuilder, PostgresClusterBuilder,
};
use crate::shared::error::{LabError, Result};
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseBackend {
    MariaDb,
    Postgres,
}

impl DatabaseBackend {
    /// App that runs the operator for this backend.
    pub fn operator(&self) -> &'static str {
        match self {
            DatabaseBackend::MariaDb => "mariadb-operator",
            DatabaseBackend::Postgres => "cloudnative-pg",
        }
    }

    pub fn port(&self) -> i32 {
        match self {
            DatabaseBackend::MariaDb => MARIADB_PORT,
            DatabaseBackend::Postgres => POSTGRES_PORT,
        }
    }

    /// In-cluster host of the primary for a cluster named `cluster`.
    pub fn hostname(&self, cluster: &str, namespace: &str) -> String {
        match self {
            DatabaseBackend::MariaDb => format!("{}.{}", cluster, namespace),
            DatabaseBackend::Postgres => format!("{}-rw.{}", cluster, namespace),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DatabaseArgs {
    /// Logical name, also the volume name; defaults to `db`.
    pub name: Option<String>,
    /// Database and user name; default to the app name.
    pub database: Option<String>,
    pub username: Option<String>,
}

impl DatabaseArgs {
    pub fn named(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub backend: DatabaseBackend,
    pub cluster_name: String,
    pub hostname: String,
    pub port: i32,
    pub database: String,
    pub username: String,
    pub password: Secret,
    /// Secret holding `username` and `password` keys.
    pub secret_name: String,
}

impl DatabaseConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.hostname, self.port)
    }
}

fn generate_password() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_PASSWORD_LENGTH)
        .map(char::from)
        .collect()
}

#[derive(Debug, Clone)]
pub struct Databases {
    app_name: String,
    namespace: String,
    config: Config,
    namespace_id: ResourceId,
    instances: BTreeMap<String, DatabaseConfig>,
    cluster_ids: Vec<ResourceId>,
}

impl Databases {
    pub fn new(metadata: &Metadata, config: Config, namespace_id: ResourceId) -> Self {
        Self {
            app_name: metadata.app_name().to_string(),
            namespace: metadata.namespace().to_string(),
            config,
            namespace_id,
            instances: BTreeMap::new(),
            cluster_ids: Vec::new(),
        }
    }

    pub fn add_mariadb(
        &mut self,
        sink: &mut dyn ResourceSink,
        metadata: &Metadata,
        storage: &mut Storage,
        args: DatabaseArgs,
    ) -> Result<DatabaseConfig> {
        self.add(DatabaseBackend::MariaDb, sink, metadata, storage, args)
    }

    pub fn add_postgres(
        &mut self,
        sink: &mut dyn ResourceSink,
        metadata: &Metadata,
        storage: &mut Storage,
        args: DatabaseArgs,
    ) -> Result<DatabaseConfig> {
        self.add(DatabaseBackend::Postgres, sink, metadata, storage, args)
    }

    fn add(
        &mut self,
        backend: DatabaseBackend,
        sink: &mut dyn ResourceSink,
        metadata: &Metadata,
        storage: &mut Storage,
        args: DatabaseArgs,
    ) -> Result<DatabaseConfig> {
        let name = args
            .name
            .unwrap_or_else(|| DEFAULT_DATABASE_NAME.to_string());
        if self.instances.contains_key(&name) || storage.volume(&name).is_some() {
            return Err(LabError::duplicate("database", name, &self.app_name));
        }
        self.config.require_enabled(&self.app_name, backend.operator())?;

        let database = args.database.unwrap_or_else(|| self.app_name.clone());
        let username = args.username.unwrap_or_else(|| self.app_name.clone());
        let password = self
            .config
            .get_secret(&self.app_name, &format!("{}/dbPassword", name))
            .unwrap_or_else(|| Secret::new(generate_password()));

        storage.add_persistent_volume(
            sink,
            metadata,
            PersistentVolumeArgs {
                name: Some(name.clone()),
                storage_type: StorageType::Database,
                claim_template: true,
                ..Default::default()
            },
        )?;
        let cluster_storage = ClusterStorage {
            size: storage.storage_size(&name)?,
            storage_class: storage.storage_class(&name)?,
            dynamic: storage.volume_handle(&name)?.is_none(),
        };

        let identity = metadata.get(Some(&name), false);
        let secret_name = format!("{}-credentials", identity.name);
        let mut secret = SecretBuilder::new(identity.renamed(secret_name.clone()).to_object_meta())
            .with_entry("username", &username)
            .with_entry("password", password.expose());
        secret = match backend {
            DatabaseBackend::MariaDb => {
                let root = self
                    .config
                    .get_secret(&self.app_name, &format!("{}/rootPassword", name))
                    .unwrap_or_else(|| Secret::new(generate_password()));
                secret.with_entry("rootPassword", root.expose())
            }
            DatabaseBackend::Postgres => secret.with_type("kubernetes.io/basic-auth"),
        };
        let secret_id = sink.push(
            Resource::typed(&self.app_name, &secret.build())?.depends_on([&self.namespace_id]),
        )?;

        let (api, object) = match backend {
            DatabaseBackend::MariaDb => (
                mariadb_api(),
                MariaDbBuilder::new(identity.to_object_meta(), &secret_name, cluster_storage)
                    .with_database(&database, &username)
                    .build(),
            ),
            DatabaseBackend::Postgres => (
                postgres_cluster_api(),
                PostgresClusterBuilder::new(identity.to_object_meta(), &secret_name, cluster_storage)
                    .with_database(&database, &username)
                    .build(),
            ),
        };
        let mut deps = vec![&self.namespace_id, &secret_id];
        if let Some(class_id) = storage.storage_class_resource(&name) {
            deps.push(class_id);
        }
        let cluster_id = sink.push(Resource::dynamic(&self.app_name, api, object)?.depends_on(deps))?;

        let db_config = DatabaseConfig {
            backend,
            cluster_name: identity.name.clone(),
            hostname: backend.hostname(&identity.name, &self.namespace),
            port: backend.port(),
            database,
            username,
            password,
            secret_name,
        };
        tracing::info!(
            "{}: {:?} database '{}' at {}",
            self.app_name,
            backend,
            name,
            db_config.address()
        );

        self.cluster_ids.push(cluster_id);
        self.instances.insert(name, db_config.clone());
        Ok(db_config)
    }

    pub fn get_config(&self, name: &str) -> Result<DatabaseConfig> {
        self.instances.get(name).cloned().ok_or_else(|| {
            LabError::contract(format!(
                "database '{}' of '{}' was queried before it was added",
                name, self.app_name
            ))
        })
    }

    /// Init container that blocks until the database accepts connections.
    pub fn get_wait_container(&self, name: &str) -> Result<InitContainerSpec> {
        let db = self.get_config(name)?;
        let script = format!(
            "until nc -z -w{timeout} {host} {port}; do echo \"Waiting for {host}:{port}\"; sleep {retry}; done",
            timeout = DB_WAIT_CONNECT_TIMEOUT_SECONDS,
            host = db.hostname,
            port = db.port,
            retry = DB_WAIT_RETRY_SECONDS,
        );
        Ok(InitContainerSpec {
            name: format!("wait-for-{}", name),
            image: INIT_CONTAINER_IMAGE.to_string(),
            command: vec!["sh".to_string(), "-c".to_string(), script],
            volume_mounts: Vec::new(),
            run_as_root: false,
        })
    }

    pub fn cluster_ids(&self) -> &[ResourceId] {
        &self.cluster_ids
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}
