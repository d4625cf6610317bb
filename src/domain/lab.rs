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

//! Composition root: every enabled app, in catalog order, into one graph.

use crate::domain::application::LabContext;
use crate::domain::apps::{catalog, Exports};
use crate::domain::config::{Config, Deprecation, PlatformConfig, MODULES};
use crate::infrastructure::kubernetes::graph::ResourceGraph;
use crate::shared::error::Result;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct LabOutput {
    pub resources: ResourceGraph,
    pub endpoints: BTreeMap<String, String>,
    pub cluster_endpoints: BTreeMap<String, String>,
    pub warnings: Vec<Deprecation>,
    /// Composed apps, in composition order.
    pub apps: Vec<String>,
}

pub struct Lab;

impl Lab {
    /// Every known app name: platform modules and the catalog.
    pub fn known_apps() -> Vec<&'static str> {
        let mut apps: Vec<&'static str> = MODULES
            .iter()
            .flat_map(|(_, members)| members.iter().copied())
            .collect();
        for app in catalog() {
            if !apps.contains(&app.name()) {
                apps.push(app.name());
            }
        }
        apps
    }

    pub fn compose(config: Config) -> Result<LabOutput> {
        let context = LabContext::new(config.clone())?;

        let warnings = PlatformConfig::deprecations(&config, Self::known_apps());
        for warning in &warnings {
            tracing::warn!("{}", warning);
        }

        let mut output = LabOutput {
            warnings,
            ..Default::default()
        };
        let mut exports = Exports::default();

        for app in catalog() {
            if !config.is_enabled(app.name()) {
                tracing::debug!("Skipping disabled app {}", app.name());
                continue;
            }
            for required in app.requires() {
                config.require_enabled(app.name(), required)?;
            }

            tracing::info!("Composing {}", app.name());
            let composed = app.compose(&context, &exports)?;
            exports.extend(&composed);
            output.resources.merge(composed.resources)?;
            output.apps.push(app.name().to_string());
        }

        output.endpoints = exports.endpoints;
        output.cluster_endpoints = exports.cluster_endpoints;
        tracing::info!(
            "Composed {} apps into {} resources",
            output.apps.len(),
            output.resources.len()
        );
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::StaticConfigProvider;
    use crate::shared::error::LabError;

    fn base() -> StaticConfigProvider {
        StaticConfigProvider::new().set("tailscale", "tailnet", "tailnet.example")
    }

    #[test]
    fn test_empty_lab() {
        let output = Lab::compose(Config::new(base())).unwrap();
        assert!(output.resources.is_empty());
        assert!(output.apps.is_empty());
    }

    #[test]
    fn test_missing_requirement_is_reported() {
        let config = Config::new(base().set("electrs", "enabled", "true"));
        let err = Lab::compose(config).unwrap_err();
        assert!(matches!(
            err,
            LabError::MissingDependency { ref app, ref dependency }
                if app == "electrs" && dependency == "bitcoin-core"
        ));
    }

    #[test]
    fn test_deprecations_are_reported_not_fatal() {
        let config = Config::new(
            StaticConfigProvider::new()
                .set("orangelab", "tailnetDomain", "old.example")
                .set("ollama", "enabled", "true")
                .set("ollama", "gpu", "true"),
        );
        let output = Lab::compose(config).unwrap();
        let keys: Vec<(&str, &str)> = output
            .warnings
            .iter()
            .map(|w| (w.namespace.as_str(), w.key.as_str()))
            .collect();
        assert!(keys.contains(&("orangelab", "tailnetDomain")));
        assert!(keys.contains(&("ollama", "gpu")));
        assert_eq!(output.endpoints["ollama"], "https://ollama.old.example");
    }
}
