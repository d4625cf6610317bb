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

//! Chat frontend for the local LLM server.

use super::{image, Exports, LabApp};
use crate::domain::application::{
    Application, ApplicationOutput, ContainerSpec, LabContext, PersistentVolumeArgs, PortSpec,
};
use crate::shared::error::Result;

pub struct OpenWebUi;

const NAME: &str = "open-webui";

impl LabApp for OpenWebUi {
    fn name(&self) -> &'static str {
        NAME
    }

    fn compose(&self, context: &LabContext, exports: &Exports) -> Result<ApplicationOutput> {
        let config = &context.config;
        let mut spec = ContainerSpec::new(image(config, NAME, "ghcr.io/open-webui/open-webui", "main"))
            .port(PortSpec::http("http", 8080))
            .mount(NAME, "/app/backend/data")
            .env("ENABLE_SIGNUP", config.get(NAME, "enableSignup").unwrap_or_else(|| "false".to_string()))
            .secret_env("WEBUI_SECRET_KEY", config.require_secret(NAME, "secretKey")?);

        if config.is_enabled("ollama") {
            if let Some(url) = exports.cluster_endpoint("ollama") {
                spec = spec.env("OLLAMA_BASE_URL", url);
            }
        } else {
            spec = spec.env("ENABLE_OLLAMA_API", "false");
        }

        let mut app = Application::new(NAME, context)?;
        app.add_storage(PersistentVolumeArgs::default())?
            .add_deployment(spec)?;
        Ok(app.finish())
    }
}
