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

//! Pod template for a single-container application component.

use super::builders::{EnvironmentBuilder, ProbeBuilder};
use crate::domain::application::spec::{ContainerSpec, HealthCheck, InitContainerSpec, VolumeMountSpec};
use crate::domain::config::GpuType;
use crate::infrastructure::constants::*;
use crate::shared::error::{LabError, Result};
use k8s_openapi::api::core::v1::{
    Affinity, Container, ContainerPort, PodSecurityContext, PodSpec, PodTemplateSpec, Probe,
    ResourceRequirements, SeccompProfile, SecurityContext, Volume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::BTreeMap;

fn to_volume_mount(mount: &VolumeMountSpec) -> VolumeMount {
    VolumeMount {
        name: mount.name.clone(),
        mount_path: mount.mount_path.clone(),
        sub_path: mount.sub_path.clone(),
        read_only: if mount.read_only { Some(true) } else { None },
        ..Default::default()
    }
}

fn root_security_context() -> SecurityContext {
    SecurityContext {
        run_as_user: Some(0),
        run_as_group: Some(0),
        ..Default::default()
    }
}

fn to_init_container(init: &InitContainerSpec) -> Container {
    Container {
        name: init.name.clone(),
        image: Some(init.image.clone()),
        command: Some(init.command.clone()),
        volume_mounts: if init.volume_mounts.is_empty() {
            None
        } else {
            Some(init.volume_mounts.iter().map(to_volume_mount).collect())
        },
        security_context: init.run_as_root.then(root_security_context),
        ..Default::default()
    }
}

pub struct PodTemplateBuilder<'a> {
    spec: &'a ContainerSpec,
    container_name: String,
    metadata: ObjectMeta,
    volumes: Vec<Volume>,
    local_mounts: Vec<VolumeMountSpec>,
    device_mounts: Vec<(String, String)>,
    gpu: Option<GpuType>,
    gfx_version: Option<String>,
    gpu_target: Option<String>,
    affinity: Option<Affinity>,
    env_secret: Option<String>,
}

impl<'a> PodTemplateBuilder<'a> {
    pub fn new(spec: &'a ContainerSpec, container_name: &str, metadata: ObjectMeta) -> Self {
        Self {
            spec,
            container_name: container_name.to_string(),
            metadata,
            volumes: Vec::new(),
            local_mounts: Vec::new(),
            device_mounts: Vec::new(),
            gpu: None,
            gfx_version: None,
            gpu_target: None,
            affinity: None,
            env_secret: None,
        }
    }

    pub fn with_volumes(mut self, volumes: Vec<Volume>) -> Self {
        self.volumes = volumes;
        self
    }

    /// Mounts backed by host paths; they need a privileged container and,
    /// for non-root users, an ownership fix before start.
    pub fn with_local_mounts(mut self, mounts: Vec<VolumeMountSpec>) -> Self {
        self.local_mounts = mounts;
        self
    }

    /// `(volume name, device path)` pairs mounted at their host location.
    pub fn with_device_mounts(mut self, mounts: Vec<(String, String)>) -> Self {
        self.device_mounts = mounts;
        self
    }

    pub fn with_gpu(
        mut self,
        gpu: Option<GpuType>,
        gfx_version: Option<String>,
        target: Option<String>,
    ) -> Self {
        self.gpu = gpu;
        self.gfx_version = gfx_version;
        self.gpu_target = target;
        self
    }

    pub fn with_affinity(mut self, affinity: Option<Affinity>) -> Self {
        self.affinity = affinity;
        self
    }

    pub fn with_env_secret(mut self, secret_name: Option<String>) -> Self {
        self.env_secret = secret_name;
        self
    }

    pub fn build(self) -> Result<PodTemplateSpec> {
        let container = self.build_main_container()?;

        let mut init_containers = Vec::new();
        if let Some(fix) = self.build_fix_permissions() {
            init_containers.push(fix);
        }
        init_containers.extend(self.spec.init_containers.iter().map(to_init_container));

        let security_context = self.spec.run_as_user.map(|uid| PodSecurityContext {
            run_as_user: Some(uid),
            run_as_group: Some(uid),
            fs_group: Some(uid),
            ..Default::default()
        });

        Ok(PodTemplateSpec {
            metadata: Some(self.metadata),
            spec: Some(PodSpec {
                containers: vec![container],
                init_containers: if init_containers.is_empty() {
                    None
                } else {
                    Some(init_containers)
                },
                volumes: if self.volumes.is_empty() {
                    None
                } else {
                    Some(self.volumes)
                },
                affinity: self.affinity,
                security_context,
                restart_policy: self.spec.restart_policy.clone(),
                host_network: self.spec.host_network.then_some(true),
                ..Default::default()
            }),
        })
    }

    fn build_main_container(&self) -> Result<Container> {
        let mut env = EnvironmentBuilder::new()
            .with_gpu(
                self.gpu,
                self.gfx_version.as_deref(),
                self.gpu_target.as_deref(),
            )
            .with_vars(&self.spec.env);
        if let Some(secret) = &self.env_secret {
            env = env.with_secret_keys(secret, self.spec.secret_env.keys());
        }

        let mut mounts: Vec<VolumeMount> =
            self.spec.volume_mounts.iter().map(to_volume_mount).collect();
        for (name, path) in &self.device_mounts {
            mounts.push(VolumeMount {
                name: name.clone(),
                mount_path: path.clone(),
                ..Default::default()
            });
        }

        let ports: Vec<ContainerPort> = self
            .spec
            .ports
            .iter()
            .map(|p| ContainerPort {
                name: Some(p.name.clone()),
                container_port: p.port,
                protocol: Some(PROTOCOL_TCP.to_string()),
                ..Default::default()
            })
            .collect();

        let checks = &self.spec.health_checks;
        Ok(Container {
            name: self.container_name.clone(),
            image: Some(self.spec.image.clone()),
            command: (!self.spec.command.is_empty()).then(|| self.spec.command.clone()),
            args: (!self.spec.args.is_empty()).then(|| self.spec.args.clone()),
            ports: (!ports.is_empty()).then_some(ports),
            env: Some(env.build()).filter(|e| !e.is_empty()),
            volume_mounts: (!mounts.is_empty()).then_some(mounts),
            resources: self.build_resources(),
            security_context: self.build_security_context(),
            liveness_probe: self.build_probe(checks.liveness.as_ref())?,
            readiness_probe: self.build_probe(checks.readiness.as_ref())?,
            startup_probe: self.build_probe(checks.startup.as_ref())?,
            ..Default::default()
        })
    }

    fn build_probe(&self, check: Option<&HealthCheck>) -> Result<Option<Probe>> {
        let Some(check) = check else {
            return Ok(None);
        };
        let default_port = match (&check.port, self.spec.ports.first()) {
            (Some(port), _) => port.clone(),
            (None, Some(port)) => port.name.clone(),
            (None, None) => {
                return Err(LabError::contract(format!(
                    "container '{}' has a health check but no port to probe",
                    self.container_name
                )))
            }
        };
        Ok(Some(ProbeBuilder::build(check, &default_port)))
    }

    fn build_resources(&self) -> Option<ResourceRequirements> {
        let mut requests = BTreeMap::new();
        let mut limits = BTreeMap::new();
        if let Some(resources) = &self.spec.resources {
            for (key, value) in [("cpu", &resources.cpu_request), ("memory", &resources.memory_request)] {
                if let Some(value) = value {
                    requests.insert(key.to_string(), Quantity(value.clone()));
                }
            }
            for (key, value) in [("cpu", &resources.cpu_limit), ("memory", &resources.memory_limit)] {
                if let Some(value) = value {
                    limits.insert(key.to_string(), Quantity(value.clone()));
                }
            }
        }
        // AMD devices are mounted instead; the device plugin is not used.
        if self.gpu == Some(GpuType::Nvidia) {
            limits.insert(RESOURCE_NVIDIA_GPU.to_string(), Quantity("1".to_string()));
        }

        if requests.is_empty() && limits.is_empty() {
            return None;
        }
        Some(ResourceRequirements {
            requests: (!requests.is_empty()).then_some(requests),
            limits: (!limits.is_empty()).then_some(limits),
            ..Default::default()
        })
    }

    fn build_security_context(&self) -> Option<SecurityContext> {
        let privileged = self.gpu == Some(GpuType::Nvidia) || !self.local_mounts.is_empty();
        let seccomp = (self.gpu == Some(GpuType::Amd)).then(|| SeccompProfile {
            type_: SECCOMP_UNCONFINED.to_string(),
            localhost_profile: None,
        });
        if !privileged && seccomp.is_none() {
            return None;
        }
        Some(SecurityContext {
            privileged: privileged.then_some(true),
            seccomp_profile: seccomp,
            ..Default::default()
        })
    }

    fn build_fix_permissions(&self) -> Option<Container> {
        let uid = self.spec.run_as_user.filter(|uid| *uid != 0)?;
        if self.local_mounts.is_empty() {
            return None;
        }
        let paths: Vec<&str> = self
            .local_mounts
            .iter()
            .map(|m| m.mount_path.as_str())
            .collect();
        Some(to_init_container(&InitContainerSpec {
            name: INIT_CONTAINER_FIX_PERMISSIONS.to_string(),
            image: INIT_CONTAINER_IMAGE.to_string(),
            command: vec![
                "sh".to_string(),
                "-c".to_string(),
                format!("chown -R {uid}:{uid} {}", paths.join(" ")),
            ],
            volume_mounts: self.local_mounts.clone(),
            run_as_root: true,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::application::spec::PortSpec;

    fn spec() -> ContainerSpec {
        ContainerSpec::new("ollama/ollama:latest")
            .port(PortSpec::http("http", 11434))
            .gpu()
    }

    #[test]
    fn test_nvidia_gets_gpu_limit_and_privileged() {
        let spec = spec();
        let template = PodTemplateBuilder::new(&spec, "ollama", ObjectMeta::default())
            .with_gpu(Some(GpuType::Nvidia), None, None)
            .build()
            .unwrap();
        let container = &template.spec.unwrap().containers[0];
        let limits = container.resources.as_ref().unwrap().limits.as_ref().unwrap();
        assert_eq!(limits[RESOURCE_NVIDIA_GPU], Quantity("1".to_string()));
        assert_eq!(
            container.security_context.as_ref().unwrap().privileged,
            Some(true)
        );
    }

    #[test]
    fn test_amd_gets_devices_not_limits() {
        let spec = spec();
        let template = PodTemplateBuilder::new(&spec, "ollama", ObjectMeta::default())
            .with_gpu(Some(GpuType::Amd), Some("11.0.0".to_string()), None)
            .with_device_mounts(vec![
                ("dev-kfd".to_string(), "/dev/kfd".to_string()),
                ("dev-dri".to_string(), "/dev/dri".to_string()),
            ])
            .build()
            .unwrap();
        let container = &template.spec.unwrap().containers[0];
        assert!(container.resources.is_none());

        let security = container.security_context.as_ref().unwrap();
        assert_eq!(security.privileged, None);
        assert_eq!(
            security.seccomp_profile.as_ref().unwrap().type_,
            SECCOMP_UNCONFINED
        );

        let mounts: Vec<&str> = container
            .volume_mounts
            .as_ref()
            .unwrap()
            .iter()
            .map(|m| m.mount_path.as_str())
            .collect();
        assert_eq!(mounts, vec!["/dev/kfd", "/dev/dri"]);
        assert_eq!(
            container.env.as_ref().unwrap()[0].name,
            ENV_HSA_OVERRIDE_GFX_VERSION
        );
    }

    #[test]
    fn test_local_volume_with_user_gets_fix_permissions() {
        let spec = ContainerSpec::new("electrs:latest")
            .port(PortSpec::tcp("rpc", 50001))
            .mount("electrs", "/data")
            .run_as_user(1000);
        let local = spec.volume_mounts.clone();
        let template = PodTemplateBuilder::new(&spec, "electrs", ObjectMeta::default())
            .with_local_mounts(local)
            .build()
            .unwrap();
        let pod = template.spec.unwrap();
        let init = &pod.init_containers.unwrap()[0];
        assert_eq!(init.name, INIT_CONTAINER_FIX_PERMISSIONS);
        assert_eq!(init.command.as_ref().unwrap()[2], "chown -R 1000:1000 /data");
        assert_eq!(pod.security_context.unwrap().fs_group, Some(1000));
        assert_eq!(
            pod.containers[0].security_context.as_ref().unwrap().privileged,
            Some(true)
        );
    }

    #[test]
    fn test_probe_without_port_is_rejected() {
        let spec = ContainerSpec::new("job:latest").liveness(HealthCheck::tcp());
        let result = PodTemplateBuilder::new(&spec, "job", ObjectMeta::default()).build();
        assert!(matches!(result, Err(LabError::ContractViolation(_))));
    }
}
