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

//! Bitcoin full node.

use super::{image, Exports, LabApp};
use crate::domain::application::{
    Application, ApplicationOutput, ContainerSpec, HealthCheck, LabContext, PersistentVolumeArgs,
    PortSpec, StorageType,
};
use crate::domain::config::Config;
use crate::shared::error::Result;
use std::collections::BTreeMap;

pub struct BitcoinCore;

pub const NAME: &str = "bitcoin-core";
pub const RPC_PORT: i32 = 8332;
pub const P2P_PORT: i32 = 8333;
pub const DEFAULT_RPC_USER: &str = "bitcoin";
const CONFIG_PATH: &str = "/etc/bitcoin/bitcoin.conf";
const DATA_DIR: &str = "/data";

/// RPC user shared with the apps that talk to the node.
pub fn rpc_user(config: &Config) -> String {
    config
        .get(NAME, "rpcUser")
        .unwrap_or_else(|| DEFAULT_RPC_USER.to_string())
}

fn bitcoin_conf(config: &Config) -> Result<String> {
    let mut lines = vec![
        "server=1".to_string(),
        format!("rpcuser={}", rpc_user(config)),
        "rpcbind=0.0.0.0".to_string(),
        "rpcallowip=0.0.0.0/0".to_string(),
        format!("rpcport={}", RPC_PORT),
        format!("port={}", P2P_PORT),
        "printtoconsole=1".to_string(),
    ];
    // pruned nodes cannot serve a transaction index
    match config.get_number(NAME, "prune")? {
        Some(prune) if prune > 0.0 => lines.push(format!("prune={}", prune as u64)),
        _ => lines.push("txindex=1".to_string()),
    }
    if let Some(cache) = config.get_number(NAME, "dbCache")? {
        lines.push(format!("dbcache={}", cache as u64));
    }
    let mut conf = lines.join("\n");
    conf.push('\n');
    Ok(conf)
}

impl LabApp for BitcoinCore {
    fn name(&self) -> &'static str {
        NAME
    }

    fn compose(&self, context: &LabContext, _exports: &Exports) -> Result<ApplicationOutput> {
        let config = &context.config;
        let rpc_password = config.require_secret(NAME, "rpcPassword")?;

        let mut files = BTreeMap::new();
        files.insert("bitcoin.conf".to_string(), bitcoin_conf(config)?);

        let mut app = Application::new(NAME, context)?;
        app.add_storage(PersistentVolumeArgs {
            storage_type: StorageType::Large,
            ..Default::default()
        })?
        .add_config_volume("config", files)?
        .add_deployment(
            ContainerSpec::new(image(config, NAME, "bitcoin/bitcoin", "28.1"))
                .args([
                    format!("-conf={}", CONFIG_PATH),
                    format!("-datadir={}", DATA_DIR),
                    "-rpcpassword=$(RPC_PASSWORD)".to_string(),
                ])
                .port(PortSpec::tcp("rpc", RPC_PORT))
                .port(PortSpec::tcp("p2p", P2P_PORT))
                .mount(NAME, DATA_DIR)
                .mount_file("config", CONFIG_PATH, "bitcoin.conf")
                .secret_env("RPC_PASSWORD", rpc_password)
                .liveness(HealthCheck {
                    port: Some("rpc".to_string()),
                    initial_delay_seconds: Some(60),
                    ..HealthCheck::tcp()
                }),
        )?;
        Ok(app.finish())
    }
}
