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

use crate::domain::application::spec::HealthCheck;
use k8s_openapi::api::core::v1::{HTTPGetAction, Probe, TCPSocketAction};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

pub struct ProbeBuilder;

impl ProbeBuilder {
    /// HTTP GET when the check has a path, TCP connect otherwise.
    pub fn build(check: &HealthCheck, default_port: &str) -> Probe {
        let port = IntOrString::String(
            check
                .port
                .clone()
                .unwrap_or_else(|| default_port.to_string()),
        );

        let mut probe = Probe {
            initial_delay_seconds: check.initial_delay_seconds,
            period_seconds: check.period_seconds,
            failure_threshold: check.failure_threshold,
            ..Default::default()
        };
        match &check.path {
            Some(path) => {
                probe.http_get = Some(HTTPGetAction {
                    path: Some(path.clone()),
                    port,
                    ..Default::default()
                })
            }
            None => probe.tcp_socket = Some(TCPSocketAction { port, host: None }),
        }
        probe
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_and_tcp_probes() {
        let http = ProbeBuilder::build(&HealthCheck::http("/health"), "http");
        let action = http.http_get.unwrap();
        assert_eq!(action.path.as_deref(), Some("/health"));
        assert_eq!(action.port, IntOrString::String("http".to_string()));

        let tcp = ProbeBuilder::build(&HealthCheck::tcp(), "rpc");
        assert!(tcp.http_get.is_none());
        assert_eq!(tcp.tcp_socket.unwrap().port, IntOrString::String("rpc".to_string()));
    }
}
