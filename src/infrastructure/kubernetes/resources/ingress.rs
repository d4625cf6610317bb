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

use k8s_openapi::api::networking::v1::{
    HTTPIngressPath, HTTPIngressRuleValue, Ingress, IngressBackend, IngressRule,
    IngressServiceBackend, IngressSpec, IngressTLS, ServiceBackendPort,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

/// Single-host ingress routing `/` to one named service port.
pub struct IngressBuilder {
    metadata: ObjectMeta,
    class_name: String,
    host: String,
    service: String,
    port_name: String,
    tls_secret: Option<String>,
}

impl IngressBuilder {
    pub fn new(metadata: ObjectMeta, class_name: &str, host: &str) -> Self {
        Self {
            metadata,
            class_name: class_name.to_string(),
            host: host.to_string(),
            service: String::new(),
            port_name: String::new(),
            tls_secret: None,
        }
    }

    pub fn with_backend(mut self, service: &str, port_name: &str) -> Self {
        self.service = service.to_string();
        self.port_name = port_name.to_string();
        self
    }

    pub fn with_tls_secret(mut self, secret: Option<&str>) -> Self {
        self.tls_secret = secret.map(str::to_string);
        self
    }

    pub fn build(self) -> Ingress {
        let backend = IngressBackend {
            service: Some(IngressServiceBackend {
                name: self.service,
                port: Some(ServiceBackendPort {
                    name: Some(self.port_name),
                    number: None,
                }),
            }),
            resource: None,
        };

        Ingress {
            metadata: self.metadata,
            spec: Some(IngressSpec {
                ingress_class_name: Some(self.class_name),
                tls: Some(vec![IngressTLS {
                    hosts: Some(vec![self.host.clone()]),
                    secret_name: self.tls_secret,
                }]),
                rules: Some(vec![IngressRule {
                    host: Some(self.host),
                    http: Some(HTTPIngressRuleValue {
                        paths: vec![HTTPIngressPath {
                            path: Some("/".to_string()),
                            path_type: "Prefix".to_string(),
                            backend,
                        }],
                    }),
                }]),
                ..Default::default()
            }),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ingress_routes_named_port() {
        let ingress = IngressBuilder::new(ObjectMeta::default(), "traefik", "app.example.com")
            .with_backend("app", "http")
            .with_tls_secret(Some("app-tls-secret"))
            .build();
        let spec = ingress.spec.unwrap();
        assert_eq!(spec.ingress_class_name.as_deref(), Some("traefik"));

        let tls = &spec.tls.unwrap()[0];
        assert_eq!(tls.secret_name.as_deref(), Some("app-tls-secret"));

        let rule = &spec.rules.unwrap()[0];
        assert_eq!(rule.host.as_deref(), Some("app.example.com"));
        let path = &rule.http.as_ref().unwrap().paths[0];
        let service = path.backend.service.as_ref().unwrap();
        assert_eq!(service.name, "app");
        assert_eq!(service.port.as_ref().unwrap().name.as_deref(), Some("http"));
    }
}
