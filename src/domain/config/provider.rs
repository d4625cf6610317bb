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

//! Configuration sources
//!
//! A provider answers `(namespace, key)` lookups with raw string values. Typing,
//! fallback and require semantics live in [`super::Config`].

use crate::shared::error::{LabError, Result};
use std::collections::BTreeMap;
use std::fs::read_to_string;
use std::path::Path;

pub trait ConfigProvider: Send + Sync {
    fn get(&self, namespace: &str, key: &str) -> Option<String>;
}

/// In-memory provider loaded from a TOML file, with `-D namespace:key=value` overrides.
///
/// Every top-level table of the file is a namespace:
///
/// ```toml
/// [orangelab]
/// customDomain = "example.com"
///
/// [ollama]
/// enabled = true
/// storageSize = "50Gi"
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticConfigProvider {
    values: BTreeMap<String, BTreeMap<String, String>>,
}

impl StaticConfigProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = read_to_string(path.as_ref()).map_err(|e| {
            LabError::config_error(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let table: toml::Table = toml::from_str(content)?;
        let mut provider = Self::new();

        for (namespace, entries) in table {
            let entries = match entries {
                toml::Value::Table(entries) => entries,
                other => {
                    return Err(LabError::config_error(format!(
                        "Top-level entry '{}' must be a table, found {}",
                        namespace,
                        other.type_str()
                    )))
                }
            };

            for (key, value) in entries {
                let value = scalar_to_string(&value).ok_or_else(|| {
                    LabError::config_error(format!(
                        "Value of '{}:{}' must be a string, boolean or number",
                        namespace, key
                    ))
                })?;
                provider.insert(&namespace, &key, value);
            }
        }

        Ok(provider)
    }

    /// Builder-style setter, mostly for tests and programmatic composition.
    pub fn set(mut self, namespace: &str, key: &str, value: impl Into<String>) -> Self {
        self.insert(namespace, key, value.into());
        self
    }

    pub fn insert(&mut self, namespace: &str, key: &str, value: String) {
        self.values
            .entry(namespace.to_string())
            .or_default()
            .insert(key.to_string(), value);
    }

    /// Applies `namespace:key=value` properties on top of the loaded values.
    pub fn apply_properties(&mut self, properties: &[String]) -> Result<()> {
        for property in properties {
            let (namespace, key, value) = parse_property(property)?;
            tracing::debug!("Config override {}:{}", namespace, key);
            self.insert(namespace, key, value.to_string());
        }
        Ok(())
    }

    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

impl ConfigProvider for StaticConfigProvider {
    fn get(&self, namespace: &str, key: &str) -> Option<String> {
        self.values
            .get(namespace)
            .and_then(|entries| entries.get(key))
            .cloned()
    }
}

fn scalar_to_string(value: &toml::Value) -> Option<String> {
    match value {
        toml::Value::String(s) => Some(s.clone()),
        toml::Value::Boolean(b) => Some(b.to_string()),
        toml::Value::Integer(i) => Some(i.to_string()),
        toml::Value::Float(f) => Some(f.to_string()),
        _ => None,
    }
}

/// Parses `namespace:key=value`. The key may itself contain `/` and the value may contain `=`.
pub fn parse_property(property: &str) -> Result<(&str, &str, &str)> {
    let (qualified, value) = property.split_once('=').ok_or_else(|| {
        LabError::config_error(format!(
            "Invalid property '{}', expected namespace:key=value",
            property
        ))
    })?;
    let (namespace, key) = qualified.split_once(':').ok_or_else(|| {
        LabError::config_error(format!(
            "Invalid property '{}', key must be qualified as namespace:key",
            property
        ))
    })?;
    if namespace.is_empty() || key.is_empty() {
        return Err(LabError::config_error(format!(
            "Invalid property '{}', namespace and key must not be empty",
            property
        )));
    }
    Ok((namespace, key, value))
}
