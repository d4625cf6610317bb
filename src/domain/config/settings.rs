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

//! Typed per-component settings.
//!
//! Each struct maps a fixed set of config keys once, so components never reach
//! into the raw key-value store with ad hoc strings.

use super::lookup::Config;
use crate::shared::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpuType {
    Nvidia,
    Amd,
}

impl GpuType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GpuType::Nvidia => "nvidia",
            GpuType::Amd => "amd",
        }
    }
}

/// Builds `"<sub>/<key>"`, or the bare key when there is no sub-resource.
pub fn prefixed(prefix: Option<&str>, key: &str) -> String {
    match prefix {
        Some(prefix) => format!("{}/{}", prefix, key),
        None => key.to_string(),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppSettings {
    pub storage_only: bool,
    pub version: Option<String>,
    pub backup_schedule: Option<String>,
}

impl AppSettings {
    pub fn load(config: &Config, app: &str) -> Result<Self> {
        Ok(Self {
            storage_only: config.get_boolean(app, "storageOnly")?.unwrap_or(false),
            version: config
                .get(app, "appVersion")
                .or_else(|| config.get(app, "version")),
            backup_schedule: config.get(app, "backupSchedule"),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageSettings {
    pub size: Option<String>,
    pub storage_class: Option<String>,
    /// `storageClass` set for this volume alone, without the app-wide fallback.
    pub own_storage_class: Option<String>,
    pub from_volume: Option<String>,
    pub clone_from_claim: Option<String>,
    pub backup: Option<bool>,
    pub host_path: Option<String>,
    pub local_node: Option<String>,
}

impl StorageSettings {
    /// `prefix` is the volume name for every volume except the app's default one.
    pub fn load(config: &Config, app: &str, prefix: Option<&str>) -> Result<Self> {
        let key = |k: &str| prefixed(prefix, k);
        let backup = match config.get_boolean(app, &key("backupVolume"))? {
            Some(backup) => Some(backup),
            None => config.get_boolean(app, &key("backup"))?,
        };

        Ok(Self {
            size: config.get(app, &key("storageSize")),
            storage_class: config.get(app, &key("storageClass")),
            own_storage_class: config.get_exact(app, &key("storageClass")),
            // a volume handle or source claim identifies exactly one volume
            from_volume: config.get_exact(app, &key("fromVolume")),
            clone_from_claim: config.get_exact(app, &key("cloneFromClaim")),
            backup,
            host_path: config.get(app, &key("hostPath")),
            local_node: config.get(app, &key("localNode")),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeSettings {
    pub required_label: Option<String>,
    pub preferred_label: Option<String>,
    pub gpu: Option<GpuType>,
}

impl NodeSettings {
    pub fn load(config: &Config, app: &str, component: Option<&str>) -> Result<Self> {
        let key = |k: &str| prefixed(component, k);
        let gpu = if config.get_boolean(app, "amd-gpu")?.unwrap_or(false) {
            Some(GpuType::Amd)
        } else if config.get_boolean(app, "nvidia-gpu")?.unwrap_or(false)
            || config.get_boolean(app, "gpu")?.unwrap_or(false)
        {
            Some(GpuType::Nvidia)
        } else {
            None
        };

        Ok(Self {
            required_label: config.get(app, &key("requiredNodeLabel")),
            preferred_label: config.get(app, &key("preferredNodeLabel")),
            gpu,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkSettings {
    pub hostname: String,
}

impl NetworkSettings {
    /// App hostname is `hostname` or the app name. A component uses its own
    /// `<component>/hostname` or `<app hostname>-<component>`; it never inherits
    /// the app hostname, which would collide.
    pub fn load(config: &Config, app: &str, component: Option<&str>) -> Self {
        let app_hostname = config
            .get_exact(app, "hostname")
            .unwrap_or_else(|| app.to_string());
        let hostname = match component {
            None => app_hostname,
            Some(component) => config
                .get_exact(app, &prefixed(Some(component), "hostname"))
                .unwrap_or_else(|| format!("{}-{}", app_hostname, component)),
        };
        Self { hostname }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GpuEnvSettings {
    pub gfx_version: Option<String>,
    pub target: Option<String>,
}

impl GpuEnvSettings {
    pub fn load(config: &Config, app: &str, platform_gfx: Option<&str>, platform_target: Option<&str>) -> Self {
        Self {
            gfx_version: config
                .get(app, "HSA_OVERRIDE_GFX_VERSION")
                .or_else(|| platform_gfx.map(str::to_string)),
            target: config
                .get(app, "HCC_AMDGPU_TARGET")
                .or_else(|| platform_target.map(str::to_string)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::StaticConfigProvider;

    #[test]
    fn test_storage_settings_use_prefix_with_fallback() {
        let config = Config::new(
            StaticConfigProvider::new()
                .set("app", "storageSize", "5Gi")
                .set("app", "cache/storageClass", "local"),
        );
        let default = StorageSettings::load(&config, "app", None).unwrap();
        assert_eq!(default.size.as_deref(), Some("5Gi"));
        assert_eq!(default.storage_class, None);

        let cache = StorageSettings::load(&config, "app", Some("cache")).unwrap();
        assert_eq!(cache.size.as_deref(), Some("5Gi"));
        assert_eq!(cache.storage_class.as_deref(), Some("local"));
    }

    #[test]
    fn test_gpu_vendor_resolution() {
        let config = Config::new(
            StaticConfigProvider::new()
                .set("a", "amd-gpu", "true")
                .set("a", "nvidia-gpu", "true")
                .set("b", "gpu", "true"),
        );
        assert_eq!(NodeSettings::load(&config, "a", None).unwrap().gpu, Some(GpuType::Amd));
        assert_eq!(NodeSettings::load(&config, "b", None).unwrap().gpu, Some(GpuType::Nvidia));
        assert_eq!(NodeSettings::load(&config, "c", None).unwrap().gpu, None);
    }

    #[test]
    fn test_component_hostname_does_not_inherit() {
        let config = Config::new(StaticConfigProvider::new().set("mempool", "hostname", "mp"));
        assert_eq!(NetworkSettings::load(&config, "mempool", None).hostname, "mp");
        assert_eq!(
            NetworkSettings::load(&config, "mempool", Some("backend")).hostname,
            "mp-backend"
        );
    }
}
