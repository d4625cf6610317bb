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

//! Service exposure: ClusterIP services, ingresses for HTTP ports and
//! load-balancer services for raw TCP ports.

use super::metadata::Metadata;
use super::spec::{ContainerSpec, PortSpec};
use crate::domain::config::{Config, IngressMode, NetworkSettings, PlatformConfig};
use crate::infrastructure::constants::*;
use crate::infrastructure::kubernetes::graph::{Resource, ResourceId, ResourceSink};
use crate::infrastructure::kubernetes::resources::ingress::IngressBuilder;
use crate::infrastructure::kubernetes::resources::service::ServiceBuilder;
use crate::shared::error::{LabError, Result};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngressInfo {
    pub class_name: String,
    /// Host as written into the ingress rule.
    pub hostname: String,
    pub url: String,
    pub domain: String,
    pub tls: bool,
    pub tls_secret: Option<String>,
    pub annotations: BTreeMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct Network {
    app_name: String,
    config: Config,
    platform: Arc<PlatformConfig>,
    namespace_id: ResourceId,
    endpoints: BTreeMap<String, String>,
    cluster_endpoints: BTreeMap<String, String>,
}

/// Endpoint key `app[-component][-port]`; a port named `http` adds nothing.
pub fn endpoint_key(app: &str, component: Option<&str>, port_name: &str) -> String {
    let mut key = app.to_string();
    if let Some(component) = component {
        key.push('-');
        key.push_str(component);
    }
    if port_name != PORT_NAME_HTTP {
        key.push('-');
        key.push_str(port_name);
    }
    key
}

impl Network {
    pub fn new(
        app_name: &str,
        config: Config,
        platform: Arc<PlatformConfig>,
        namespace_id: ResourceId,
    ) -> Self {
        Self {
            app_name: app_name.to_string(),
            config,
            platform,
            namespace_id,
            endpoints: BTreeMap::new(),
            cluster_endpoints: BTreeMap::new(),
        }
    }

    pub fn get_ingress_info(&self, hostname: &str) -> IngressInfo {
        match &self.platform.ingress_mode {
            IngressMode::Tailscale { domain } => IngressInfo {
                class_name: self.platform.tailscale_ingress_class.clone(),
                hostname: hostname.to_string(),
                url: format!("https://{}.{}", hostname, domain),
                domain: domain.clone(),
                tls: true,
                tls_secret: None,
                annotations: BTreeMap::new(),
            },
            IngressMode::CustomDomain {
                domain,
                cluster_issuer,
            } => {
                let fqdn = format!("{}.{}", hostname, domain);
                let mut annotations = BTreeMap::new();
                annotations.insert(
                    ANNOTATION_CLUSTER_ISSUER.to_string(),
                    cluster_issuer.clone(),
                );
                IngressInfo {
                    class_name: self.platform.proxy_ingress_class.clone(),
                    url: format!("https://{}", fqdn),
                    hostname: fqdn,
                    domain: domain.clone(),
                    tls: true,
                    tls_secret: Some(format!("{}{}", hostname, TLS_SECRET_SUFFIX)),
                    annotations,
                }
            }
        }
    }

    pub fn hostname(&self, component: Option<&str>) -> String {
        NetworkSettings::load(&self.config, &self.app_name, component).hostname
    }

    /// Exposes every port of `spec`. Keys are checked before anything is declared.
    pub fn create_endpoints(
        &mut self,
        sink: &mut dyn ResourceSink,
        metadata: &Metadata,
        spec: &ContainerSpec,
        component: Option<&str>,
    ) -> Result<Vec<ResourceId>> {
        let mut keys = Vec::new();
        for port in &spec.ports {
            let key = endpoint_key(&self.app_name, component, &port.name);
            if self.endpoints.contains_key(&key) || keys.contains(&key) {
                return Err(LabError::duplicate("endpoint", key, &self.app_name));
            }
            keys.push(key);
        }

        let hostname = self.hostname(component);
        let http: Vec<&PortSpec> = spec.http_ports().collect();
        let tcp: Vec<&PortSpec> = spec.tcp_ports().collect();
        let mut ids = Vec::new();

        if !http.is_empty() {
            ids.extend(self.create_http_endpoints(sink, metadata, component, &hostname, &http)?);
        }
        if !tcp.is_empty() {
            let advertised = if http.is_empty() {
                hostname
            } else {
                format!("{}-tcp", hostname)
            };
            ids.push(self.create_tcp_endpoints(sink, metadata, component, &advertised, &tcp)?);
        }
        Ok(ids)
    }

    fn create_http_endpoints(
        &mut self,
        sink: &mut dyn ResourceSink,
        metadata: &Metadata,
        component: Option<&str>,
        hostname: &str,
        ports: &[&PortSpec],
    ) -> Result<Vec<ResourceId>> {
        let identity = metadata.get(component, false);
        let service = ServiceBuilder::new(
            identity.to_object_meta(),
            metadata.get_selector_labels(component),
        )
        .with_ports(ports.iter().copied())
        .build();
        let service_id = sink.push(
            Resource::typed(&self.app_name, &service)?.depends_on([&self.namespace_id]),
        )?;
        let mut ids = vec![service_id.clone()];

        let primary = ports
            .iter()
            .find(|p| p.name == PORT_NAME_HTTP)
            .unwrap_or(&ports[0])
            .name
            .clone();

        for port in ports {
            let (host, ingress_name) = if port.name == primary {
                (hostname.to_string(), identity.name.clone())
            } else {
                (
                    format!("{}-{}", hostname, port.name),
                    format!("{}-{}", identity.name, port.name),
                )
            };
            let info = self.get_ingress_info(&host);
            let mut ingress_identity = identity.renamed(ingress_name);
            ingress_identity.annotations.extend(info.annotations.clone());

            let ingress = IngressBuilder::new(
                ingress_identity.to_object_meta(),
                &info.class_name,
                &info.hostname,
            )
            .with_backend(&identity.name, &port.name)
            .with_tls_secret(info.tls_secret.as_deref())
            .build();
            ids.push(sink.push(
                Resource::typed(&self.app_name, &ingress)?.depends_on([&service_id]),
            )?);

            let key = endpoint_key(&self.app_name, component, &port.name);
            tracing::info!("{}: {} -> {}", self.app_name, key, info.url);
            self.endpoints.insert(key.clone(), info.url);
            self.cluster_endpoints.insert(
                key,
                format!("http://{}.{}:{}", identity.name, identity.namespace, port.port),
            );
        }
        Ok(ids)
    }

    fn create_tcp_endpoints(
        &mut self,
        sink: &mut dyn ResourceSink,
        metadata: &Metadata,
        component: Option<&str>,
        advertised: &str,
        ports: &[&PortSpec],
    ) -> Result<ResourceId> {
        let identity = metadata.get(component, false);
        let name = format!("{}{}", identity.name, SERVICE_SUFFIX_LB);
        let builder = ServiceBuilder::new(
            identity.renamed(name.clone()).to_object_meta(),
            metadata.get_selector_labels(component),
        );

        let (builder, host) = match &self.platform.ingress_mode {
            IngressMode::Tailscale { domain } => (
                builder
                    .with_load_balancer(Some(LOAD_BALANCER_CLASS_TAILSCALE))
                    .with_annotation(ANNOTATION_TAILSCALE_HOSTNAME, advertised),
                format!("{}.{}", advertised, domain),
            ),
            IngressMode::CustomDomain { domain, .. } => {
                let fqdn = format!("{}.{}", advertised, domain);
                (
                    builder
                        .with_load_balancer(None)
                        .with_annotation(ANNOTATION_EXTERNAL_DNS_HOSTNAME, &fqdn),
                    fqdn,
                )
            }
        };

        let service = builder.with_ports(ports.iter().copied()).build();
        let id = sink.push(
            Resource::typed(&self.app_name, &service)?.depends_on([&self.namespace_id]),
        )?;

        for port in ports {
            let key = endpoint_key(&self.app_name, component, &port.name);
            let endpoint = format!("{}:{}", host, port.port);
            tracing::info!("{}: {} -> {}", self.app_name, key, endpoint);
            self.endpoints.insert(key.clone(), endpoint);
            self.cluster_endpoints
                .insert(key, format!("{}.{}:{}", name, identity.namespace, port.port));
        }
        Ok(id)
    }

    pub fn endpoints(&self) -> &BTreeMap<String, String> {
        &self.endpoints
    }

    pub fn cluster_endpoints(&self) -> &BTreeMap<String, String> {
        &self.cluster_endpoints
    }

    pub fn into_endpoints(self) -> (BTreeMap<String, String>, BTreeMap<String, String>) {
        (self.endpoints, self.cluster_endpoints)
    }
}
