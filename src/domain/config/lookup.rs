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

//! Namespaced configuration lookups
//!
//! Keys of the form `"<sub>/<key>"` resolve the prefixed form first and fall back
//! to the bare `<key>`, so a cluster-wide default can be overridden per sub-resource.

use super::provider::ConfigProvider;
use crate::shared::error::{LabError, Result};
use std::fmt;
use std::sync::Arc;

/// Optional platform capabilities, grouped by the module they belong to.
pub const MODULES: &[(&str, &[&str])] = &[
    (
        "system",
        &[
            "amd-gpu-operator",
            "cert-manager",
            "cloudnative-pg",
            "longhorn",
            "mariadb-operator",
            "nfd",
            "nvidia-gpu-operator",
            "tailscale-operator",
        ],
    ),
    ("monitoring", &["beszel"]),
    ("ai", &["ollama", "open-webui", "n8n"]),
    ("bitcoin", &["bitcoin-core", "electrs", "mempool"]),
];

/// A secret configuration value. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

#[derive(Clone)]
pub struct Config {
    provider: Arc<dyn ConfigProvider>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config").finish_non_exhaustive()
    }
}

impl Config {
    pub fn new(provider: impl ConfigProvider + 'static) -> Self {
        Self {
            provider: Arc::new(provider),
        }
    }

    pub fn get(&self, namespace: &str, key: &str) -> Option<String> {
        if let Some(value) = self.provider.get(namespace, key) {
            return Some(value);
        }
        match key.rsplit_once('/') {
            Some((_, bare)) if !bare.is_empty() => self.provider.get(namespace, bare),
            _ => None,
        }
    }

    /// Lookup without the sub-resource fallback.
    pub fn get_exact(&self, namespace: &str, key: &str) -> Option<String> {
        self.provider.get(namespace, key)
    }

    pub fn require(&self, namespace: &str, key: &str) -> Result<String> {
        self.get(namespace, key)
            .ok_or_else(|| LabError::missing(namespace, key))
    }

    pub fn get_secret(&self, namespace: &str, key: &str) -> Option<Secret> {
        self.get(namespace, key).map(Secret)
    }

    pub fn require_secret(&self, namespace: &str, key: &str) -> Result<Secret> {
        self.require(namespace, key).map(Secret)
    }

    pub fn get_number(&self, namespace: &str, key: &str) -> Result<Option<f64>> {
        self.get(namespace, key)
            .map(|raw| {
                raw.trim()
                    .parse::<f64>()
                    .map_err(|_| LabError::invalid_value(namespace, key, raw.clone(), "a number"))
            })
            .transpose()
    }

    pub fn require_number(&self, namespace: &str, key: &str) -> Result<f64> {
        self.get_number(namespace, key)?
            .ok_or_else(|| LabError::missing(namespace, key))
    }

    pub fn get_boolean(&self, namespace: &str, key: &str) -> Result<Option<bool>> {
        self.get(namespace, key)
            .map(|raw| match raw.trim() {
                "true" => Ok(true),
                "false" => Ok(false),
                _ => Err(LabError::invalid_value(
                    namespace,
                    key,
                    raw.clone(),
                    "true or false",
                )),
            })
            .transpose()
    }

    pub fn require_boolean(&self, namespace: &str, key: &str) -> Result<bool> {
        self.get_boolean(namespace, key)?
            .ok_or_else(|| LabError::missing(namespace, key))
    }

    /// Unset or unparsable `enabled` flags count as disabled.
    pub fn is_enabled(&self, name: &str) -> bool {
        match self.get_boolean(name, "enabled") {
            Ok(enabled) => enabled.unwrap_or(false),
            Err(e) => {
                tracing::warn!("Treating {} as disabled: {}", name, e);
                false
            }
        }
    }

    pub fn is_module_enabled(&self, module: &str) -> bool {
        MODULES
            .iter()
            .find(|(name, _)| *name == module)
            .map(|(_, members)| members.iter().any(|member| self.is_enabled(member)))
            .unwrap_or(false)
    }

    pub fn require_enabled(&self, app: &str, dependency: &str) -> Result<()> {
        if self.is_enabled(dependency) {
            Ok(())
        } else {
            Err(LabError::missing_dependency(app, dependency))
        }
    }
}
