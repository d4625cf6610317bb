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

use crate::domain::application::spec::PortSpec;
use crate::infrastructure::constants::*;
use k8s_openapi::api::core::v1::{Service, ServicePort, ServiceSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use std::collections::BTreeMap;

pub struct ServiceBuilder {
    metadata: ObjectMeta,
    selector: BTreeMap<String, String>,
    service_type: String,
    load_balancer_class: Option<String>,
    ports: Vec<ServicePort>,
}

impl ServiceBuilder {
    pub fn new(metadata: ObjectMeta, selector: BTreeMap<String, String>) -> Self {
        Self {
            metadata,
            selector,
            service_type: SERVICE_TYPE_CLUSTER_IP.to_string(),
            load_balancer_class: None,
            ports: Vec::new(),
        }
    }

    pub fn with_load_balancer(mut self, class: Option<&str>) -> Self {
        self.service_type = SERVICE_TYPE_LOAD_BALANCER.to_string();
        self.load_balancer_class = class.map(str::to_string);
        self
    }

    pub fn with_annotation(mut self, key: &str, value: &str) -> Self {
        self.metadata
            .annotations
            .get_or_insert_with(BTreeMap::new)
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_ports<'a>(mut self, ports: impl IntoIterator<Item = &'a PortSpec>) -> Self {
        for port in ports {
            self.ports.push(create_service_port(&port.name, port.port));
        }
        self
    }

    pub fn build(self) -> Service {
        Service {
            metadata: self.metadata,
            spec: Some(ServiceSpec {
                type_: Some(self.service_type),
                load_balancer_class: self.load_balancer_class,
                ports: Some(self.ports),
                selector: Some(self.selector),
                ..Default::default()
            }),
            ..Default::default()
        }
    }
}

fn create_service_port(name: &str, port: i32) -> ServicePort {
    ServicePort {
        name: Some(name.to_string()),
        port,
        target_port: Some(IntOrString::String(name.to_string())),
        protocol: Some(PROTOCOL_TCP.to_string()),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selector() -> BTreeMap<String, String> {
        let mut selector = BTreeMap::new();
        selector.insert(LABEL_NAME.to_string(), "app".to_string());
        selector
    }

    #[test]
    fn test_cluster_ip_service() {
        let meta = ObjectMeta {
            name: Some("app".to_string()),
            ..Default::default()
        };
        let service = ServiceBuilder::new(meta, selector())
            .with_ports([&PortSpec::http("http", 8080)])
            .build();
        let spec = service.spec.unwrap();
        assert_eq!(spec.type_.as_deref(), Some("ClusterIP"));
        let ports = spec.ports.unwrap();
        assert_eq!(ports[0].port, 8080);
        assert_eq!(
            ports[0].target_port,
            Some(IntOrString::String("http".to_string()))
        );
    }

    #[test]
    fn test_load_balancer_service() {
        let service = ServiceBuilder::new(ObjectMeta::default(), selector())
            .with_load_balancer(Some(LOAD_BALANCER_CLASS_TAILSCALE))
            .with_annotation(ANNOTATION_TAILSCALE_HOSTNAME, "bitcoin-core")
            .with_ports([&PortSpec::tcp("rpc", 8332)])
            .build();
        let spec = service.spec.unwrap();
        assert_eq!(spec.type_.as_deref(), Some("LoadBalancer"));
        assert_eq!(spec.load_balancer_class.as_deref(), Some("tailscale"));
        assert_eq!(
            service.metadata.annotations.unwrap()[ANNOTATION_TAILSCALE_HOSTNAME],
            "bitcoin-core"
        );
    }
}
