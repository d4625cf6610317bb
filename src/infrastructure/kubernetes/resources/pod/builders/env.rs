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

//! Environment variables for application containers.
//!
//! Plain values are inlined; secret values live in the `<name>-env` Secret and
//! are referenced by key so they never appear in the pod spec.

use crate::domain::config::GpuType;
use crate::infrastructure::constants::{ENV_HCC_AMDGPU_TARGET, ENV_HSA_OVERRIDE_GFX_VERSION};
use k8s_openapi::api::core::v1::{EnvVar, EnvVarSource, SecretKeySelector};
use std::collections::BTreeMap;

pub struct EnvironmentBuilder {
    vars: BTreeMap<String, String>,
    secret_name: Option<String>,
    secret_keys: Vec<String>,
    gpu_vars: BTreeMap<String, String>,
}

impl EnvironmentBuilder {
    pub fn new() -> Self {
        Self {
            vars: BTreeMap::new(),
            secret_name: None,
            secret_keys: Vec::new(),
            gpu_vars: BTreeMap::new(),
        }
    }

    pub fn with_vars(mut self, vars: &BTreeMap<String, String>) -> Self {
        self.vars.extend(vars.clone());
        self
    }

    pub fn with_secret_keys<'a>(
        mut self,
        secret_name: &str,
        keys: impl IntoIterator<Item = &'a String>,
    ) -> Self {
        self.secret_name = Some(secret_name.to_string());
        self.secret_keys.extend(keys.into_iter().cloned());
        self
    }

    /// ROCm overrides; only AMD containers get them, and only when configured.
    pub fn with_gpu(
        mut self,
        gpu: Option<GpuType>,
        gfx_version: Option<&str>,
        target: Option<&str>,
    ) -> Self {
        if gpu == Some(GpuType::Amd) {
            if let Some(version) = gfx_version {
                self.gpu_vars
                    .insert(ENV_HSA_OVERRIDE_GFX_VERSION.to_string(), version.to_string());
            }
            if let Some(target) = target {
                self.gpu_vars
                    .insert(ENV_HCC_AMDGPU_TARGET.to_string(), target.to_string());
            }
        }
        self
    }

    pub fn build(self) -> Vec<EnvVar> {
        let mut env_vars = Vec::new();
        env_vars.extend(self.build_plain_env_vars());
        env_vars.extend(self.build_secret_env_vars());
        env_vars
    }

    fn build_plain_env_vars(&self) -> Vec<EnvVar> {
        self.gpu_vars
            .iter()
            .chain(self.vars.iter())
            .map(|(name, value)| EnvVar {
                name: name.clone(),
                value: Some(value.clone()),
                ..Default::default()
            })
            .collect()
    }

    fn build_secret_env_vars(&self) -> Vec<EnvVar> {
        let Some(secret_name) = &self.secret_name else {
            return Vec::new();
        };
        self.secret_keys
            .iter()
            .map(|key| EnvVar {
                name: key.clone(),
                value_from: Some(EnvVarSource {
                    secret_key_ref: Some(SecretKeySelector {
                        name: secret_name.clone(),
                        key: key.clone(),
                        optional: None,
                    }),
                    ..Default::default()
                }),
                ..Default::default()
            })
            .collect()
    }
}

impl Default for EnvironmentBuilder {
    fn default() -> Self {
        Self::new()
    }
}
