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

//! Electrum server indexing the local Bitcoin node.

use super::bitcoin_core::{self, rpc_user};
use super::{image, Exports, LabApp};
use crate::domain::application::{
    endpoint_key, Application, ApplicationOutput, ContainerSpec, LabContext, LocalVolumeArgs,
    PortSpec,
};
use crate::domain::config::Secret;
use crate::shared::error::Result;

pub struct Electrs;

pub const NAME: &str = "electrs";
pub const RPC_PORT: i32 = 50001;
const DATA_DIR: &str = "/data";

impl LabApp for Electrs {
    fn name(&self) -> &'static str {
        NAME
    }

    fn requires(&self) -> &'static [&'static str] {
        &[bitcoin_core::NAME]
    }

    fn compose(&self, context: &LabContext, exports: &Exports) -> Result<ApplicationOutput> {
        let config = &context.config;
        config.require_enabled(NAME, bitcoin_core::NAME)?;

        let daemon_rpc = exports
            .require_cluster_endpoint(NAME, &endpoint_key(bitcoin_core::NAME, None, "rpc"))?;
        let daemon_p2p = exports
            .require_cluster_endpoint(NAME, &endpoint_key(bitcoin_core::NAME, None, "p2p"))?;
        let password = config.require_secret(bitcoin_core::NAME, "rpcPassword")?;
        let auth = Secret::new(format!("{}:{}", rpc_user(config), password.expose()));

        let mut app = Application::new(NAME, context)?;
        app.add_local_storage(LocalVolumeArgs::default())?
            .add_deployment(
                ContainerSpec::new(image(config, NAME, "getumbrel/electrs", "v0.10.9"))
                    .port(PortSpec::tcp("rpc", RPC_PORT))
                    .mount(NAME, DATA_DIR)
                    .run_as_user(1000)
                    .env("ELECTRS_DB_DIR", DATA_DIR)
                    .env("ELECTRS_NETWORK", "bitcoin")
                    .env("ELECTRS_DAEMON_RPC_ADDR", daemon_rpc)
                    .env("ELECTRS_DAEMON_P2P_ADDR", daemon_p2p)
                    .env("ELECTRS_ELECTRUM_RPC_ADDR", format!("0.0.0.0:{}", RPC_PORT))
                    .secret_env("ELECTRS_AUTH", auth),
            )?;
        Ok(app.finish())
    }
}
