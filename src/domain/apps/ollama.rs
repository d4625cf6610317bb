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

//! Local LLM server.

use super::{image, Exports, LabApp};
use crate::domain::application::{
    Application, ApplicationOutput, ContainerSpec, HealthCheck, LabContext, PersistentVolumeArgs,
    PortSpec, StorageType,
};
use crate::domain::config::{GpuType, NodeSettings};
use crate::shared::error::Result;

pub struct Ollama;

const NAME: &str = "ollama";

impl LabApp for Ollama {
    fn name(&self) -> &'static str {
        NAME
    }

    fn compose(&self, context: &LabContext, _exports: &Exports) -> Result<ApplicationOutput> {
        let config = &context.config;
        // ROCm builds are published under their own tag
        let default_tag = match NodeSettings::load(config, NAME, None)?.gpu {
            Some(GpuType::Amd) => "rocm",
            _ => "latest",
        };

        let mut spec = ContainerSpec::new(image(config, NAME, "ollama/ollama", default_tag))
            .port(PortSpec::http("http", 11434))
            .mount(NAME, "/root/.ollama")
            .env("OLLAMA_HOST", "0.0.0.0")
            .gpu()
            .liveness(HealthCheck::http("/"));
        for key in ["OLLAMA_CONTEXT_LENGTH", "OLLAMA_KEEP_ALIVE"] {
            if let Some(value) = config.get(NAME, key) {
                spec = spec.env(key, value);
            }
        }

        let mut app = Application::new(NAME, context)?;
        app.add_storage(PersistentVolumeArgs {
            storage_type: StorageType::Gpu,
            ..Default::default()
        })?
        .add_deployment(spec)?;
        Ok(app.finish())
    }
}
