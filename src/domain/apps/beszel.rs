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

//! Lightweight server monitoring: a hub plus one agent per node.

use super::{image, Exports, LabApp};
use crate::domain::application::{
    Application, ApplicationOutput, ContainerSpec, LabContext, PersistentVolumeArgs, PortSpec,
};
use crate::shared::error::Result;

pub struct Beszel;

const NAME: &str = "beszel";
const AGENT_PORT: &str = "45876";

impl LabApp for Beszel {
    fn name(&self) -> &'static str {
        NAME
    }

    fn compose(&self, context: &LabContext, _exports: &Exports) -> Result<ApplicationOutput> {
        let config = &context.config;
        let mut app = Application::new(NAME, context)?;
        app.add_storage(PersistentVolumeArgs::default())?
            .add_deployment(
                ContainerSpec::new(image(config, NAME, "henrygd/beszel", "latest"))
                    .port(PortSpec::http("http", 8090))
                    .mount(NAME, "/beszel_data"),
            )?;

        // the hub generates its key on first start; agents follow once it is configured
        match config.get_secret(NAME, "hubKey") {
            Some(key) => {
                app.add_daemonset(
                    ContainerSpec::new(image(config, NAME, "henrygd/beszel-agent", "latest"))
                        .named("agent")
                        .host_network()
                        .env("LISTEN", AGENT_PORT)
                        .secret_env("KEY", key),
                )?;
            }
            None => tracing::info!("{}: hubKey not set, agents are not deployed", NAME),
        }
        Ok(app.finish())
    }
}
