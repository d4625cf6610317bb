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

//! Workflow automation backed by PostgreSQL.

use super::{image, Exports, LabApp};
use crate::domain::application::{
    Application, ApplicationOutput, ContainerSpec, DatabaseArgs, HealthCheck, LabContext,
    PersistentVolumeArgs, PortSpec,
};
use crate::shared::error::Result;

pub struct N8n;

const NAME: &str = "n8n";

impl LabApp for N8n {
    fn name(&self) -> &'static str {
        NAME
    }

    fn requires(&self) -> &'static [&'static str] {
        &["cloudnative-pg"]
    }

    fn compose(&self, context: &LabContext, _exports: &Exports) -> Result<ApplicationOutput> {
        let config = &context.config;
        let mut app = Application::new(NAME, context)?;
        app.add_storage(PersistentVolumeArgs::default())?
            .add_postgres(DatabaseArgs::default())?;

        let db = app.database("db")?;
        let url = app
            .network()
            .get_ingress_info(&app.network().hostname(None))
            .url;

        let mut spec = ContainerSpec::new(image(config, NAME, "n8nio/n8n", "latest"))
            .port(PortSpec::http("http", 5678))
            .mount(NAME, "/home/node/.n8n")
            .env("N8N_PORT", "5678")
            .env("WEBHOOK_URL", url)
            .env("GENERIC_TIMEZONE", config.get(NAME, "timezone").unwrap_or_else(|| "UTC".to_string()))
            .env("DB_TYPE", "postgresdb")
            .env("DB_POSTGRESDB_HOST", &db.hostname)
            .env("DB_POSTGRESDB_PORT", db.port.to_string())
            .env("DB_POSTGRESDB_DATABASE", &db.database)
            .env("DB_POSTGRESDB_USER", &db.username)
            .secret_env("DB_POSTGRESDB_PASSWORD", db.password.clone())
            .init_container(app.database_wait_container("db")?)
            .readiness(HealthCheck::http("/healthz"));
        if let Some(key) = config.get_secret(NAME, "encryptionKey") {
            spec = spec.secret_env("N8N_ENCRYPTION_KEY", key);
        }

        app.add_deployment(spec)?;
        Ok(app.finish())
    }
}
