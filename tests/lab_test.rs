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

use k8s_openapi::api::apps::v1::{DaemonSet, Deployment};
use orangelab::domain::config::StaticConfigProvider;
use orangelab::*;
use std::collections::HashMap;
use std::io::Write;

fn sample_config() -> Config {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/lab.example.toml");
    Config::new(StaticConfigProvider::from_file(path).unwrap())
}

fn config_from_toml(content: &str) -> Config {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    Config::new(StaticConfigProvider::from_file(file.path()).unwrap())
}

fn env_of(deployment: &Deployment) -> HashMap<String, String> {
    deployment.spec.as_ref().unwrap().template.spec.as_ref().unwrap().containers[0]
        .env
        .clone()
        .unwrap_or_default()
        .into_iter()
        .filter_map(|var| var.value.map(|value| (var.name, value)))
        .collect()
}

#[test]
fn test_full_lab_composes_in_catalog_order() {
    let output = Lab::compose(sample_config()).unwrap();
    assert_eq!(
        output.apps,
        vec!["ollama", "open-webui", "n8n", "beszel", "bitcoin-core", "electrs", "mempool"]
    );
    assert!(output.warnings.is_empty());

    assert_eq!(output.endpoints["ollama"], "https://ollama.tail1234.ts.net");
    assert_eq!(output.endpoints["electrs-rpc"], "electrs.tail1234.ts.net:50001");
    assert_eq!(output.cluster_endpoints["ollama"], "http://ollama.ollama:11434");
    assert_eq!(
        output.cluster_endpoints["mempool-backend"],
        "http://mempool-backend.mempool:8999"
    );
}

#[test]
fn test_dependencies_precede_dependents() {
    let output = Lab::compose(sample_config()).unwrap();
    let position: HashMap<&ResourceId, usize> = output
        .resources
        .resources()
        .iter()
        .enumerate()
        .map(|(index, resource)| (&resource.id, index))
        .collect();

    for (index, resource) in output.resources.resources().iter().enumerate() {
        for dependency in &resource.depends_on {
            assert!(
                position[dependency] < index,
                "{} depends on later {}",
                resource.id,
                dependency
            );
        }
    }
}

#[test]
fn test_cross_app_values_flow_through_exports() {
    let output = Lab::compose(sample_config()).unwrap();

    let webui: Deployment = output
        .resources
        .get_typed(Some("open-webui"), "open-webui")
        .unwrap()
        .unwrap();
    assert_eq!(env_of(&webui)["OLLAMA_BASE_URL"], "http://ollama.ollama:11434");

    let frontend: Deployment = output
        .resources
        .get_typed(Some("mempool"), "mempool-frontend")
        .unwrap()
        .unwrap();
    let env = env_of(&frontend);
    assert_eq!(env["BACKEND_MAINNET_HTTP_HOST"], "mempool-backend.mempool");
    assert_eq!(env["BACKEND_MAINNET_HTTP_PORT"], "8999");
}

#[test]
fn test_database_workloads_wait_for_cluster() {
    let output = Lab::compose(sample_config()).unwrap();
    let cluster = ResourceId::new("MariaDB", Some("mempool"), "mempool-db");
    assert!(output.resources.contains(&cluster));

    let backend = output
        .resources
        .find("Deployment", Some("mempool"), "mempool-backend")
        .unwrap();
    assert!(backend.depends_on.contains(&cluster));

    let n8n = output.resources.find("Deployment", Some("n8n"), "n8n").unwrap();
    assert!(n8n
        .depends_on
        .contains(&ResourceId::new("Cluster", Some("n8n"), "n8n-db")));
}

#[test]
fn test_beszel_agent_runs_on_every_node() {
    let output = Lab::compose(sample_config()).unwrap();
    let agent: Option<DaemonSet> = output
        .resources
        .get_typed(Some("beszel"), "beszel-agent")
        .unwrap();
    assert!(agent.is_some());
}

#[test]
fn test_render_is_multi_document_yaml() {
    let output = Lab::compose(sample_config()).unwrap();
    let yaml = output.resources.to_yaml().unwrap();
    assert!(yaml.starts_with("---\n"));
    assert_eq!(yaml.matches("---\n").count(), output.resources.len());
    assert!(yaml.contains("kind: MariaDB"));
    assert!(yaml.contains("kind: Cluster"));
}

#[test]
fn test_missing_requirement_stops_composition() {
    let config = config_from_toml(
        r#"
[tailscale]
tailnet = "tail1234.ts.net"

[mariadb-operator]
enabled = true

[bitcoin-core]
enabled = true
rpcPassword = "secret"

[mempool]
enabled = true
"#,
    );
    let err = Lab::compose(config).unwrap_err();
    assert!(matches!(
        err,
        LabError::MissingDependency { ref app, ref dependency }
            if app == "mempool" && dependency == "electrs"
    ));
}

#[test]
fn test_storage_only_keeps_data_without_workloads() {
    let config = config_from_toml(
        r#"
[tailscale]
tailnet = "tail1234.ts.net"

[cloudnative-pg]
enabled = true

[n8n]
enabled = true
storageOnly = true
"#,
    );
    let output = Lab::compose(config).unwrap();
    assert!(output.resources.of_kind("Deployment").next().is_none());
    assert!(output
        .resources
        .find("PersistentVolumeClaim", Some("n8n"), "n8n")
        .is_some());
    assert!(output.resources.find("Cluster", Some("n8n"), "n8n-db").is_some());
    assert!(output.endpoints.is_empty());
}

#[test]
fn test_custom_domain_endpoints() {
    let config = config_from_toml(
        r#"
[orangelab]
customDomain = "lab.example.com"

[ollama]
enabled = true
"#,
    );
    let output = Lab::compose(config).unwrap();
    assert_eq!(output.endpoints["ollama"], "https://ollama.lab.example.com");
}

#[test]
fn test_deprecated_keys_warn_but_still_apply() {
    let config = config_from_toml(
        r#"
[orangelab]
tailnetDomain = "old.ts.net"

[ollama]
enabled = true
gpu = true
"#,
    );
    let output = Lab::compose(config).unwrap();
    let rendered: Vec<String> = output.warnings.iter().map(ToString::to_string).collect();
    assert!(rendered.contains(&"'orangelab:tailnetDomain' is deprecated, use 'tailscale:tailnet' instead".to_string()));
    assert!(rendered.contains(&"'ollama:gpu' is deprecated, use 'nvidia-gpu' instead".to_string()));
    assert_eq!(output.endpoints["ollama"], "https://ollama.old.ts.net");
}

#[test]
fn test_missing_tailnet_is_reported() {
    let config = config_from_toml("[ollama]\nenabled = true\n");
    let err = Lab::compose(config).unwrap_err();
    assert!(matches!(
        err,
        LabError::MissingConfiguration { ref namespace, ref key }
            if namespace == "tailscale" && key == "tailnet"
    ));
}

#[test]
fn test_app_restore_handle_is_not_shared_with_database() {
    let config = config_from_toml(
        r#"
[tailscale]
tailnet = "tail1234.ts.net"

[cloudnative-pg]
enabled = true

[n8n]
enabled = true
fromVolume = "n8n-restored"
"#,
    );
    let output = Lab::compose(config).unwrap();

    let volumes: Vec<&Resource> = output.resources.of_kind("PersistentVolume").collect();
    assert_eq!(volumes.len(), 1);
    assert_eq!(volumes[0].id.name, "n8n-n8n");
    assert_eq!(
        volumes[0].object.data["spec"]["csi"]["volumeHandle"],
        "n8n-restored"
    );

    let cluster = output.resources.find("Cluster", Some("n8n"), "n8n-db").unwrap();
    assert_eq!(
        cluster.object.data["spec"]["storage"]["storageClass"],
        "longhorn-database"
    );
    assert!(output.resources.of_kind("StorageClass").next().is_none());
}

#[test]
fn test_app_storage_class_leaves_database_class_alone() {
    let config = config_from_toml(
        r#"
[tailscale]
tailnet = "tail1234.ts.net"

[cloudnative-pg]
enabled = true

[n8n]
enabled = true
storageClass = "fast"
"#,
    );
    let output = Lab::compose(config).unwrap();

    let claim = output
        .resources
        .find("PersistentVolumeClaim", Some("n8n"), "n8n")
        .unwrap();
    assert_eq!(claim.object.data["spec"]["storageClassName"], "fast");
    let cluster = output.resources.find("Cluster", Some("n8n"), "n8n-db").unwrap();
    assert_eq!(
        cluster.object.data["spec"]["storage"]["storageClass"],
        "longhorn-database"
    );
}

#[test]
fn test_amd_gpu_app_mounts_devices_without_limits() {
    let config = config_from_toml(
        r#"
[tailscale]
tailnet = "tail1234.ts.net"

[ollama]
enabled = true
amd-gpu = true
"#,
    );
    let output = Lab::compose(config).unwrap();
    let deployment: Deployment = output
        .resources
        .get_typed(Some("ollama"), "ollama")
        .unwrap()
        .unwrap();
    let pod = deployment.spec.unwrap().template.spec.unwrap();

    let volumes: Vec<String> = pod
        .volumes
        .unwrap()
        .into_iter()
        .map(|volume| volume.name)
        .collect();
    assert!(volumes.contains(&"dev-kfd".to_string()));
    assert!(volumes.contains(&"dev-dri".to_string()));

    let container = &pod.containers[0];
    assert!(container.resources.is_none());
    let security = container.security_context.as_ref().unwrap();
    assert_eq!(
        security.seccomp_profile.as_ref().unwrap().type_,
        "Unconfined"
    );
    assert_eq!(security.privileged, None);
    assert!(container.image.as_deref().unwrap().ends_with(":rocm"));
}
