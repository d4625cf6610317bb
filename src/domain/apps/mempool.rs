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

//! Mempool block explorer: backend on Electrum and MariaDB, static frontend.

use super::bitcoin_core::{self, rpc_user};
use super::{electrs, host_port, image, Exports, LabApp};
use crate::domain::application::{
    endpoint_key, Application, ApplicationOutput, ContainerSpec, DatabaseArgs, HealthCheck,
    LabContext, PortSpec,
};
use crate::shared::error::Result;

pub struct Mempool;

const NAME: &str = "mempool";
const BACKEND_PORT: i32 = 8999;
const FRONTEND_PORT: i32 = 8080;

impl LabApp for Mempool {
    fn name(&self) -> &'static str {
        NAME
    }

    fn requires(&self) -> &'static [&'static str] {
        &[bitcoin_core::NAME, electrs::NAME, "mariadb-operator"]
    }

    fn compose(&self, context: &LabContext, exports: &Exports) -> Result<ApplicationOutput> {
        let config = &context.config;
        config.require_enabled(NAME, bitcoin_core::NAME)?;
        config.require_enabled(NAME, electrs::NAME)?;

        let (core_host, core_port) = host_port(
            exports.require_cluster_endpoint(NAME, &endpoint_key(bitcoin_core::NAME, None, "rpc"))?,
        )?;
        let (electrum_host, electrum_port) = host_port(
            exports.require_cluster_endpoint(NAME, &endpoint_key(electrs::NAME, None, "rpc"))?,
        )?;
        let core_password = config.require_secret(bitcoin_core::NAME, "rpcPassword")?;
        let version = "v3.1.0";

        let mut app = Application::new(NAME, context)?;
        app.add_mariadb(DatabaseArgs::default())?;
        if app.is_storage_only() {
            return Ok(app.finish());
        }
        let db = app.database("db")?;
        let wait = app.database_wait_container("db")?;

        app.add_deployment(
            ContainerSpec::new(image(config, NAME, "mempool/backend", version))
                .named("backend")
                .port(PortSpec::http("http", BACKEND_PORT))
                .init_container(wait)
                .env("MEMPOOL_BACKEND", "electrum")
                .env("MEMPOOL_HTTP_PORT", BACKEND_PORT.to_string())
                .env("ELECTRUM_HOST", electrum_host)
                .env("ELECTRUM_PORT", electrum_port)
                .env("ELECTRUM_TLS_ENABLED", "false")
                .env("CORE_RPC_HOST", core_host)
                .env("CORE_RPC_PORT", core_port)
                .env("CORE_RPC_USERNAME", rpc_user(config))
                .secret_env("CORE_RPC_PASSWORD", core_password)
                .env("DATABASE_ENABLED", "true")
                .env("DATABASE_HOST", &db.hostname)
                .env("DATABASE_PORT", db.port.to_string())
                .env("DATABASE_DATABASE", &db.database)
                .env("DATABASE_USERNAME", &db.username)
                .secret_env("DATABASE_PASSWORD", db.password.clone())
                .liveness(HealthCheck::http("/api/v1/backend-info")),
        )?;

        let backend = app
            .cluster_endpoints()
            .get(&endpoint_key(NAME, Some("backend"), "http"))
            .cloned()
            .unwrap_or_default();
        let (backend_host, backend_port) = host_port(&backend)?;

        app.add_deployment(
            ContainerSpec::new(image(config, NAME, "mempool/frontend", version))
                .named("frontend")
                .port(PortSpec::http("http", FRONTEND_PORT))
                .env("FRONTEND_HTTP_PORT", FRONTEND_PORT.to_string())
                .env("BACKEND_MAINNET_HTTP_HOST", backend_host)
                .env("BACKEND_MAINNET_HTTP_PORT", backend_port)
                .readiness(HealthCheck::http("/")),
        )?;
        Ok(app.finish())
    }
}
