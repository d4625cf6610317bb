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

//! Resource identity: names, labels and the config checksum annotation.

use crate::infrastructure::constants::*;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceIdentity {
    pub name: String,
    pub namespace: String,
    pub labels: BTreeMap<String, String>,
    pub annotations: BTreeMap<String, String>,
}

impl ResourceIdentity {
    pub fn to_object_meta(&self) -> ObjectMeta {
        ObjectMeta {
            name: Some(self.name.clone()),
            namespace: Some(self.namespace.clone()),
            labels: Some(self.labels.clone()),
            annotations: if self.annotations.is_empty() {
                None
            } else {
                Some(self.annotations.clone())
            },
            ..Default::default()
        }
    }

    /// Same identity under a derived name, e.g. `<name>-lb`.
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone)]
pub struct Metadata {
    app_name: String,
    namespace: String,
    version: Option<String>,
    config_files: BTreeMap<String, String>,
}

impl Metadata {
    pub fn new(app_name: &str, namespace: &str, version: Option<String>) -> Self {
        Self {
            app_name: app_name.to_string(),
            namespace: namespace.to_string(),
            version,
            config_files: BTreeMap::new(),
        }
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn name(&self, component: Option<&str>) -> String {
        match component {
            Some(component) => format!("{}-{}", self.app_name, component),
            None => self.app_name.clone(),
        }
    }

    pub fn get(&self, component: Option<&str>, include_annotations: bool) -> ResourceIdentity {
        let mut labels = self.get_selector_labels(component);
        labels.insert(LABEL_MANAGED_BY.to_string(), MANAGED_BY_VALUE.to_string());
        if let Some(version) = &self.version {
            labels.insert(LABEL_VERSION.to_string(), version.clone());
        }

        let mut annotations = BTreeMap::new();
        if include_annotations {
            if let Some(hash) = self.config_hash() {
                annotations.insert(ANNOTATION_CONFIG_CHECKSUM.to_string(), hash);
            }
        }

        ResourceIdentity {
            name: self.name(component),
            namespace: self.namespace.clone(),
            labels,
            annotations,
        }
    }

    /// Labels that must never change across upgrades; used for workload selectors.
    pub fn get_selector_labels(&self, component: Option<&str>) -> BTreeMap<String, String> {
        let mut labels = BTreeMap::new();
        labels.insert(LABEL_NAME.to_string(), self.app_name.clone());
        labels.insert(
            LABEL_COMPONENT.to_string(),
            component.unwrap_or(DEFAULT_COMPONENT).to_string(),
        );
        labels
    }

    pub fn add_config_hash<'a>(
        &mut self,
        volume: &str,
        files: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) {
        for (file, content) in files {
            self.config_files
                .insert(format!("{}/{}", volume, file), content.to_string());
        }
    }

    pub fn config_hash(&self) -> Option<String> {
        if self.config_files.is_empty() {
            None
        } else {
            Some(config_hash(
                self.config_files.iter().map(|(k, v)| (k.as_str(), v.as_str())),
            ))
        }
    }
}

/// SHA-256 over file name/content pairs, sorted by file name so that insertion order is irrelevant.
pub fn config_hash<'a>(files: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    let mut sorted: Vec<(&str, &str)> = files.into_iter().collect();
    sorted.sort();

    let mut hasher = Sha256::new();
    for (name, content) in sorted {
        hasher.update(name.as_bytes());
        hasher.update([0u8]);
        hasher.update(content.as_bytes());
        hasher.update([0u8]);
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_naming_is_deterministic() {
        let metadata = Metadata::new("widget", "widget", None);
        assert_eq!(metadata.get(None, false).name, "widget");
        assert_eq!(metadata.get(Some("backend"), false).name, "widget-backend");
        assert_eq!(metadata.get(Some("backend"), true), metadata.get(Some("backend"), true));
    }

    #[test]
    fn test_identity_labels() {
        let metadata = Metadata::new("widget", "widget", Some("1.2.3".to_string()));
        let identity = metadata.get(Some("backend"), false);
        assert_eq!(identity.labels[LABEL_NAME], "widget");
        assert_eq!(identity.labels[LABEL_MANAGED_BY], "OrangeLab");
        assert_eq!(identity.labels[LABEL_COMPONENT], "backend");
        assert_eq!(identity.labels[LABEL_VERSION], "1.2.3");

        let default = Metadata::new("widget", "widget", None).get(None, false);
        assert_eq!(default.labels[LABEL_COMPONENT], "default");
        assert!(!default.labels.contains_key(LABEL_VERSION));
    }

    #[test]
    fn test_selector_labels_exclude_version() {
        let metadata = Metadata::new("widget", "widget", Some("2.0".to_string()));
        let selector = metadata.get_selector_labels(None);
        assert!(!selector.contains_key(LABEL_VERSION));
        assert!(!selector.contains_key(LABEL_MANAGED_BY));

        let full = metadata.get(None, true).labels;
        for (key, value) in &selector {
            assert_eq!(full.get(key), Some(value));
        }
    }

    #[test]
    fn test_config_hash_ignores_insertion_order() {
        let mut a = Metadata::new("widget", "widget", None);
        a.add_config_hash("config", vec![("a.conf", "x=1"), ("b.conf", "y=2")]);
        let mut b = Metadata::new("widget", "widget", None);
        b.add_config_hash("config", vec![("b.conf", "y=2"), ("a.conf", "x=1")]);

        assert!(a.config_hash().is_some());
        assert_eq!(a.config_hash(), b.config_hash());
        assert_eq!(
            a.get(None, true).annotations.get(ANNOTATION_CONFIG_CHECKSUM),
            a.config_hash().as_ref()
        );
        assert!(a.get(None, false).annotations.is_empty());
    }

    #[test]
    fn test_config_hash_changes_with_content() {
        let before = config_hash([("a.conf", "x=1")]);
        let after = config_hash([("a.conf", "x=2")]);
        assert_ne!(before, after);
        assert_eq!(before.len(), 64);
    }
}
