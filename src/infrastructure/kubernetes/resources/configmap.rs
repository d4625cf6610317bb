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

use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::BTreeMap;

pub struct ConfigMapBuilder {
    metadata: ObjectMeta,
    files: BTreeMap<String, String>,
}

impl ConfigMapBuilder {
    pub fn new(metadata: ObjectMeta) -> Self {
        Self {
            metadata,
            files: BTreeMap::new(),
        }
    }

    pub fn with_files(mut self, files: &BTreeMap<String, String>) -> Self {
        self.files.extend(files.clone());
        self
    }

    pub fn build(self) -> ConfigMap {
        ConfigMap {
            metadata: self.metadata,
            data: Some(self.files),
            ..Default::default()
        }
    }
}

pub struct SecretBuilder {
    metadata: ObjectMeta,
    type_: Option<String>,
    entries: BTreeMap<String, String>,
}

impl SecretBuilder {
    pub fn new(metadata: ObjectMeta) -> Self {
        Self {
            metadata,
            type_: None,
            entries: BTreeMap::new(),
        }
    }

    pub fn with_type(mut self, type_: &str) -> Self {
        self.type_ = Some(type_.to_string());
        self
    }

    pub fn with_entry(mut self, key: &str, value: &str) -> Self {
        self.entries.insert(key.to_string(), value.to_string());
        self
    }

    pub fn build(self) -> Secret {
        Secret {
            metadata: self.metadata,
            type_: self.type_,
            string_data: Some(self.entries),
            ..Default::default()
        }
    }
}
