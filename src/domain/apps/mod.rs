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

//! Application catalog.
//!
//! Each app reads its own config namespace and the endpoints exported by the
//! apps composed before it; nothing else crosses app boundaries.

pub mod beszel;
pub mod bitcoin_core;
pub mod electrs;
pub mod mempool;
pub mod n8n;
pub mod ollama;
pub mod open_webui;

use crate::domain::application::{ApplicationOutput, LabContext};
use crate::domain::config::Config;
use crate::shared::error::{LabError, Result};
use std::collections::BTreeMap;

/// Endpoints exported by the apps composed so far.
#[derive(Debug, Clone, Default)]
pub struct Exports {
    pub endpoints: BTreeMap<String, String>,
    pub cluster_endpoints: BTreeMap<String, String>,
}

impl Exports {
    pub fn extend(&mut self, output: &ApplicationOutput) {
        self.endpoints.extend(output.endpoints.clone());
        self.cluster_endpoints.extend(output.cluster_endpoints.clone());
    }

    pub fn cluster_endpoint(&self, key: &str) -> Option<&str> {
        self.cluster_endpoints.get(key).map(String::as_str)
    }

    /// Cluster endpoint of an app `app` depends on; composing in the wrong order
    /// is a programming error.
    pub fn require_cluster_endpoint(&self, app: &str, key: &str) -> Result<&str> {
        self.cluster_endpoint(key).ok_or_else(|| {
            LabError::contract(format!(
                "'{}' needs endpoint '{}' which has not been composed",
                app, key
            ))
        })
    }
}

pub trait LabApp: Send + Sync {
    fn name(&self) -> &'static str;

    /// Apps that must be enabled and composed first.
    fn requires(&self) -> &'static [&'static str] {
        &[]
    }

    fn compose(&self, context: &LabContext, exports: &Exports) -> Result<ApplicationOutput>;
}

/// Every app, in an order where requirements come first.
pub fn catalog() -> Vec<Box<dyn LabApp>> {
    vec![
        Box::new(ollama::Ollama),
        Box::new(open_webui::OpenWebUi),
        Box::new(n8n::N8n),
        Box::new(beszel::Beszel),
        Box::new(bitcoin_core::BitcoinCore),
        Box::new(electrs::Electrs),
        Box::new(mempool::Mempool),
    ]
}

/// `<repository>:<tag>`, the tag taken from `appVersion`/`version` when set.
pub fn image(config: &Config, app: &str, repository: &str, default_tag: &str) -> String {
    let tag = config
        .get(app, "appVersion")
        .or_else(|| config.get(app, "version"))
        .unwrap_or_else(|| default_tag.to_string());
    format!("{}:{}", repository, tag)
}

/// Splits `[scheme://]host:port`.
pub fn host_port(endpoint: &str) -> Result<(&str, &str)> {
    let address = endpoint
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(endpoint);
    address
        .rsplit_once(':')
        .ok_or_else(|| LabError::contract(format!("endpoint '{}' has no port", endpoint)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::StaticConfigProvider;

    #[test]
    fn test_host_port() {
        assert_eq!(
            host_port("http://mempool-backend.mempool:8999").unwrap(),
            ("mempool-backend.mempool", "8999")
        );
        assert_eq!(
            host_port("electrs-lb.electrs:50001").unwrap(),
            ("electrs-lb.electrs", "50001")
        );
        assert!(host_port("nowhere").is_err());
    }

    #[test]
    fn test_image_tag_from_version() {
        let config = Config::new(StaticConfigProvider::new().set("n8n", "appVersion", "1.80.0"));
        assert_eq!(image(&config, "n8n", "n8nio/n8n", "latest"), "n8nio/n8n:1.80.0");
        assert_eq!(image(&config, "beszel", "henrygd/beszel", "latest"), "henrygd/beszel:latest");
    }

    #[test]
    fn test_catalog_orders_requirements_first() {
        let apps = catalog();
        let names: Vec<&str> = apps.iter().map(|a| a.name()).collect();
        for (i, app) in apps.iter().enumerate() {
            for required in app.requires() {
                if let Some(pos) = names.iter().position(|n| n == required) {
                    assert!(pos < i, "{} must come before {}", required, app.name());
                }
            }
        }
    }
}
