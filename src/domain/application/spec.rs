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

//! Declarative workload description consumed by the pod template and workload builders.

use crate::domain::config::Secret;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortSpec {
    pub name: String,
    pub port: i32,
    /// Raw TCP: exposed through a LoadBalancer instead of an Ingress.
    pub tcp: bool,
}

impl PortSpec {
    pub fn http(name: &str, port: i32) -> Self {
        Self {
            name: name.to_string(),
            port,
            tcp: false,
        }
    }

    pub fn tcp(name: &str, port: i32) -> Self {
        Self {
            name: name.to_string(),
            port,
            tcp: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeMountSpec {
    /// Logical volume name in the app's Storage.
    pub name: String,
    pub mount_path: String,
    pub sub_path: Option<String>,
    pub read_only: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceSpec {
    pub cpu_request: Option<String>,
    pub memory_request: Option<String>,
    pub cpu_limit: Option<String>,
    pub memory_limit: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HealthCheck {
    /// HTTP path; a TCP check is used when absent.
    pub path: Option<String>,
    /// Port name; defaults to the first declared port.
    pub port: Option<String>,
    pub initial_delay_seconds: Option<i32>,
    pub period_seconds: Option<i32>,
    pub failure_threshold: Option<i32>,
}

impl HealthCheck {
    pub fn http(path: &str) -> Self {
        Self {
            path: Some(path.to_string()),
            ..Default::default()
        }
    }

    pub fn tcp() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HealthChecks {
    pub liveness: Option<HealthCheck>,
    pub readiness: Option<HealthCheck>,
    pub startup: Option<HealthCheck>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitContainerSpec {
    pub name: String,
    pub image: String,
    pub command: Vec<String>,
    pub volume_mounts: Vec<VolumeMountSpec>,
    pub run_as_root: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContainerSpec {
    /// Component name; `None` is the app's default component.
    pub name: Option<String>,
    pub image: String,
    pub command: Vec<String>,
    pub args: Vec<String>,
    pub ports: Vec<PortSpec>,
    pub env: BTreeMap<String, String>,
    pub secret_env: BTreeMap<String, Secret>,
    pub volume_mounts: Vec<VolumeMountSpec>,
    pub resources: Option<ResourceSpec>,
    pub gpu: bool,
    pub health_checks: HealthChecks,
    pub init_containers: Vec<InitContainerSpec>,
    pub run_as_user: Option<i64>,
    pub restart_policy: Option<String>,
    pub host_network: bool,
}

impl ContainerSpec {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            name: None,
            image: image.into(),
            command: Vec::new(),
            args: Vec::new(),
            ports: Vec::new(),
            env: BTreeMap::new(),
            secret_env: BTreeMap::new(),
            volume_mounts: Vec::new(),
            resources: None,
            gpu: false,
            health_checks: HealthChecks::default(),
            init_containers: Vec::new(),
            run_as_user: None,
            restart_policy: None,
            host_network: false,
        }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn command<I, S>(mut self, command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.command = command.into_iter().map(Into::into).collect();
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn port(mut self, port: PortSpec) -> Self {
        self.ports.push(port);
        self
    }

    pub fn env(mut self, name: &str, value: impl Into<String>) -> Self {
        self.env.insert(name.to_string(), value.into());
        self
    }

    pub fn secret_env(mut self, name: &str, value: Secret) -> Self {
        self.secret_env.insert(name.to_string(), value);
        self
    }

    pub fn mount(mut self, volume: &str, mount_path: &str) -> Self {
        self.volume_mounts.push(VolumeMountSpec {
            name: volume.to_string(),
            mount_path: mount_path.to_string(),
            sub_path: None,
            read_only: false,
        });
        self
    }

    pub fn mount_file(mut self, volume: &str, mount_path: &str, file: &str) -> Self {
        self.volume_mounts.push(VolumeMountSpec {
            name: volume.to_string(),
            mount_path: mount_path.to_string(),
            sub_path: Some(file.to_string()),
            read_only: true,
        });
        self
    }

    pub fn resources(mut self, resources: ResourceSpec) -> Self {
        self.resources = Some(resources);
        self
    }

    pub fn gpu(mut self) -> Self {
        self.gpu = true;
        self
    }

    pub fn liveness(mut self, check: HealthCheck) -> Self {
        self.health_checks.liveness = Some(check);
        self
    }

    pub fn readiness(mut self, check: HealthCheck) -> Self {
        self.health_checks.readiness = Some(check);
        self
    }

    pub fn startup(mut self, check: HealthCheck) -> Self {
        self.health_checks.startup = Some(check);
        self
    }

    pub fn init_container(mut self, init: InitContainerSpec) -> Self {
        self.init_containers.push(init);
        self
    }

    pub fn run_as_user(mut self, uid: i64) -> Self {
        self.run_as_user = Some(uid);
        self
    }

    pub fn restart_policy(mut self, policy: &str) -> Self {
        self.restart_policy = Some(policy.to_string());
        self
    }

    pub fn host_network(mut self) -> Self {
        self.host_network = true;
        self
    }

    pub fn http_ports(&self) -> impl Iterator<Item = &PortSpec> {
        self.ports.iter().filter(|p| !p.tcp)
    }

    pub fn tcp_ports(&self) -> impl Iterator<Item = &PortSpec> {
        self.ports.iter().filter(|p| p.tcp)
    }
}
