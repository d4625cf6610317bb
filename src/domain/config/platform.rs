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

//! Platform-wide settings, resolved once at startup.

use super::lookup::Config;
use crate::shared::error::{LabError, Result};
use std::fmt;

pub const PLATFORM_NAMESPACE: &str = "orangelab";

const DEFAULT_STORAGE_CLASS: &str = "longhorn";
const DEFAULT_GPU_STORAGE_CLASS: &str = "longhorn-gpu";
const DEFAULT_DATABASE_STORAGE_CLASS: &str = "longhorn-database";
const DEFAULT_LARGE_STORAGE_CLASS: &str = "longhorn-large";
const DEFAULT_CLUSTER_ISSUER: &str = "letsencrypt";
const DEFAULT_TAILSCALE_INGRESS_CLASS: &str = "tailscale";
const DEFAULT_PROXY_INGRESS_CLASS: &str = "traefik";

/// Recognised but obsolete keys: (namespace or `None` for any app, key, replacement).
const DEPRECATED_KEYS: &[(Option<&str>, &str, &str)] = &[
    (Some(PLATFORM_NAMESPACE), "tailnetDomain", "tailscale:tailnet"),
    (None, "gpu", "nvidia-gpu"),
    (None, "backup", "backupVolume"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngressMode {
    /// Private overlay network; hostnames live under the tailnet domain.
    Tailscale { domain: String },
    /// Public DNS behind a reverse proxy, certificates from cert-manager.
    CustomDomain { domain: String, cluster_issuer: String },
}

impl IngressMode {
    pub fn domain(&self) -> &str {
        match self {
            IngressMode::Tailscale { domain } => domain,
            IngressMode::CustomDomain { domain, .. } => domain,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageClasses {
    pub default: String,
    pub gpu: String,
    pub database: String,
    pub large: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deprecation {
    pub namespace: String,
    pub key: String,
    pub replacement: String,
}

impl fmt::Display for Deprecation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}:{}' is deprecated, use '{}' instead",
            self.namespace, self.key, self.replacement
        )
    }
}

/// Immutable view of the `orangelab`, `tailscale` and `longhorn` namespaces.
#[derive(Debug, Clone)]
pub struct PlatformConfig {
    pub ingress_mode: IngressMode,
    pub storage_classes: StorageClasses,
    pub tailscale_ingress_class: String,
    pub proxy_ingress_class: String,
    pub backup_by_default: bool,
    pub amd_gfx_version: Option<String>,
    pub amd_target: Option<String>,
}

impl PlatformConfig {
    pub fn load(config: &Config) -> Result<Self> {
        let ns = PLATFORM_NAMESPACE;
        let or_default = |key: &str, default: &str| {
            config.get(ns, key).unwrap_or_else(|| default.to_string())
        };

        let ingress_mode = match config.get(ns, "customDomain") {
            Some(domain) => IngressMode::CustomDomain {
                domain,
                cluster_issuer: or_default("clusterIssuer", DEFAULT_CLUSTER_ISSUER),
            },
            None => {
                // the old key still works until it is removed
                let domain = config
                    .get("tailscale", "tailnet")
                    .or_else(|| config.get(ns, "tailnetDomain"))
                    .ok_or_else(|| LabError::missing("tailscale", "tailnet"))?;
                IngressMode::Tailscale { domain }
            }
        };

        Ok(Self {
            ingress_mode,
            storage_classes: StorageClasses {
                default: or_default("storageClass", DEFAULT_STORAGE_CLASS),
                gpu: or_default("storageClass-gpu", DEFAULT_GPU_STORAGE_CLASS),
                database: or_default("storageClass-database", DEFAULT_DATABASE_STORAGE_CLASS),
                large: or_default("storageClass-large", DEFAULT_LARGE_STORAGE_CLASS),
            },
            tailscale_ingress_class: or_default(
                "tailscaleIngressClass",
                DEFAULT_TAILSCALE_INGRESS_CLASS,
            ),
            proxy_ingress_class: or_default("proxyIngressClass", DEFAULT_PROXY_INGRESS_CLASS),
            backup_by_default: config.get_boolean("longhorn", "backupEnabled")?.unwrap_or(false),
            amd_gfx_version: config.get("amd-gpu-operator", "HSA_OVERRIDE_GFX_VERSION"),
            amd_target: config.get("amd-gpu-operator", "HCC_AMDGPU_TARGET"),
        })
    }

    /// Reports deprecated keys set for the platform or for any of `apps`.
    pub fn deprecations<'a>(
        config: &Config,
        apps: impl IntoIterator<Item = &'a str>,
    ) -> Vec<Deprecation> {
        let apps: Vec<&str> = apps.into_iter().collect();
        let mut found = Vec::new();

        for (namespace, key, replacement) in DEPRECATED_KEYS {
            let namespaces: Vec<&str> = match namespace {
                Some(ns) => vec![*ns],
                None => apps.clone(),
            };
            for ns in namespaces {
                if config.get_exact(ns, key).is_some() {
                    found.push(Deprecation {
                        namespace: ns.to_string(),
                        key: key.to_string(),
                        replacement: replacement.to_string(),
                    });
                }
            }
        }

        found
    }
}
