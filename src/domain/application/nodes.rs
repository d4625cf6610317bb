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

//! Node placement rules.
//!
//! Operators write label specs in one of two forms:
//! `key` (label exists with any value) or `key=v1|v2` (label value is one of).

use crate::domain::config::{Config, GpuType, NodeSettings};
use crate::infrastructure::constants::{
    NODE_LABEL_GPU_AMD, NODE_LABEL_GPU_NVIDIA, TOPOLOGY_KEY_HOSTNAME,
};
use crate::shared::error::{LabError, Result};
use k8s_openapi::api::core::v1::{
    Affinity, NodeAffinity, NodeSelector, NodeSelectorRequirement, NodeSelectorTerm,
    PreferredSchedulingTerm,
};

pub fn parse_label_spec(spec: &str) -> Option<NodeSelectorRequirement> {
    let spec = spec.trim();
    match spec.split_once('=') {
        None if spec.is_empty() => None,
        None => Some(NodeSelectorRequirement {
            key: spec.to_string(),
            operator: "Exists".to_string(),
            values: None,
        }),
        Some((key, _)) if key.trim().is_empty() => None,
        Some((key, values)) => Some(NodeSelectorRequirement {
            key: key.trim().to_string(),
            operator: "In".to_string(),
            values: Some(values.split('|').map(|v| v.trim().to_string()).collect()),
        }),
    }
}

#[derive(Debug, Clone)]
pub struct Nodes {
    app_name: String,
    config: Config,
    gpu: Option<GpuType>,
}

impl Nodes {
    pub fn new(app_name: &str, config: Config) -> Result<Self> {
        let gpu = NodeSettings::load(&config, app_name, None)?.gpu;
        Ok(Self {
            app_name: app_name.to_string(),
            config,
            gpu,
        })
    }

    /// GPU vendor configured for the app, if any.
    pub fn gpu_type(&self) -> Option<GpuType> {
        self.gpu
    }

    /// Vendor for a workload that asked for a GPU; NVIDIA unless the app says otherwise.
    pub fn resolve_gpu(&self, wants_gpu: bool) -> Option<GpuType> {
        if wants_gpu {
            Some(self.gpu.unwrap_or(GpuType::Nvidia))
        } else {
            None
        }
    }

    /// Returns `None` rather than an empty affinity when nothing constrains placement.
    pub fn get_affinity(
        &self,
        component: Option<&str>,
        gpu: Option<GpuType>,
        pinned_node: Option<&str>,
    ) -> Result<Option<Affinity>> {
        let settings = NodeSettings::load(&self.config, &self.app_name, component)?;
        let mut required = Vec::new();

        if let Some(label) = &settings.required_label {
            required.push(self.parse(component, "requiredNodeLabel", label)?);
        }
        match gpu {
            Some(GpuType::Amd) => required.push(gpu_requirement(NODE_LABEL_GPU_AMD)),
            Some(GpuType::Nvidia) => required.push(gpu_requirement(NODE_LABEL_GPU_NVIDIA)),
            None => {}
        }
        if let Some(node) = pinned_node {
            required.push(NodeSelectorRequirement {
                key: TOPOLOGY_KEY_HOSTNAME.to_string(),
                operator: "In".to_string(),
                values: Some(vec![node.to_string()]),
            });
        }

        let preferred = match &settings.preferred_label {
            Some(label) => vec![PreferredSchedulingTerm {
                weight: 1,
                preference: NodeSelectorTerm {
                    match_expressions: Some(vec![self.parse(
                        component,
                        "preferredNodeLabel",
                        label,
                    )?]),
                    ..Default::default()
                },
            }],
            None => Vec::new(),
        };

        if required.is_empty() && preferred.is_empty() {
            return Ok(None);
        }

        Ok(Some(Affinity {
            node_affinity: Some(NodeAffinity {
                required_during_scheduling_ignored_during_execution: if required.is_empty() {
                    None
                } else {
                    Some(NodeSelector {
                        node_selector_terms: vec![NodeSelectorTerm {
                            match_expressions: Some(required),
                            ..Default::default()
                        }],
                    })
                },
                preferred_during_scheduling_ignored_during_execution: if preferred.is_empty() {
                    None
                } else {
                    Some(preferred)
                },
            }),
            ..Default::default()
        }))
    }

    fn parse(
        &self,
        component: Option<&str>,
        key: &str,
        label: &str,
    ) -> Result<NodeSelectorRequirement> {
        parse_label_spec(label).ok_or_else(|| {
            let key = match component {
                Some(component) => format!("{}/{}", component, key),
                None => key.to_string(),
            };
            LabError::invalid_value(&self.app_name, key, label, "key or key=value1|value2")
        })
    }
}

fn gpu_requirement(label: &str) -> NodeSelectorRequirement {
    NodeSelectorRequirement {
        key: label.to_string(),
        operator: "In".to_string(),
        values: Some(vec!["true".to_string()]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::StaticConfigProvider;

    fn nodes(provider: StaticConfigProvider) -> Nodes {
        Nodes::new("app", Config::new(provider)).unwrap()
    }

    #[test]
    fn test_label_spec_forms() {
        let exists = parse_label_spec("orangelab/storage").unwrap();
        assert_eq!(exists.operator, "Exists");
        assert_eq!(exists.values, None);

        let one_of = parse_label_spec("topology.kubernetes.io/zone=home|office").unwrap();
        assert_eq!(one_of.key, "topology.kubernetes.io/zone");
        assert_eq!(one_of.operator, "In");
        assert_eq!(
            one_of.values,
            Some(vec!["home".to_string(), "office".to_string()])
        );

        assert!(parse_label_spec("").is_none());
        assert!(parse_label_spec("=value").is_none());
    }

    #[test]
    fn test_no_affinity_without_rules() {
        let nodes = nodes(StaticConfigProvider::new());
        assert!(nodes.get_affinity(None, None, None).unwrap().is_none());
    }

    #[test]
    fn test_required_and_preferred() {
        let nodes = nodes(
            StaticConfigProvider::new()
                .set("app", "requiredNodeLabel", "orangelab/zone=home")
                .set("app", "preferredNodeLabel", "orangelab/fast"),
        );
        let affinity = nodes.get_affinity(None, None, None).unwrap().unwrap();
        let node_affinity = affinity.node_affinity.unwrap();

        let required = node_affinity
            .required_during_scheduling_ignored_during_execution
            .unwrap();
        let expressions = required.node_selector_terms[0]
            .match_expressions
            .clone()
            .unwrap();
        assert_eq!(expressions.len(), 1);
        assert_eq!(expressions[0].key, "orangelab/zone");

        let preferred = node_affinity
            .preferred_during_scheduling_ignored_during_execution
            .unwrap();
        assert_eq!(preferred[0].weight, 1);
    }

    #[test]
    fn test_gpu_terms_are_injected() {
        let nodes = nodes(StaticConfigProvider::new().set("app", "amd-gpu", "true"));
        let gpu = nodes.resolve_gpu(true);
        assert_eq!(gpu, Some(GpuType::Amd));

        let affinity = nodes.get_affinity(None, gpu, None).unwrap().unwrap();
        let terms = affinity
            .node_affinity
            .unwrap()
            .required_during_scheduling_ignored_during_execution
            .unwrap()
            .node_selector_terms;
        let expressions = terms[0].match_expressions.clone().unwrap();
        assert_eq!(expressions[0].key, NODE_LABEL_GPU_AMD);
        assert_eq!(expressions[0].values, Some(vec!["true".to_string()]));
    }

    #[test]
    fn test_component_label_falls_back() {
        let nodes = nodes(
            StaticConfigProvider::new()
                .set("app", "requiredNodeLabel", "orangelab/any")
                .set("app", "worker/requiredNodeLabel", "orangelab/worker"),
        );
        let worker = nodes.get_affinity(Some("worker"), None, None).unwrap().unwrap();
        let api = nodes.get_affinity(Some("api"), None, None).unwrap().unwrap();

        let key = |a: Affinity| {
            a.node_affinity
                .unwrap()
                .required_during_scheduling_ignored_during_execution
                .unwrap()
                .node_selector_terms[0]
                .match_expressions
                .clone()
                .unwrap()[0]
                .key
                .clone()
        };
        assert_eq!(key(worker), "orangelab/worker");
        assert_eq!(key(api), "orangelab/any");
    }

    #[test]
    fn test_invalid_label_is_reported() {
        let nodes = nodes(StaticConfigProvider::new().set("app", "requiredNodeLabel", "=x"));
        assert!(matches!(
            nodes.get_affinity(None, None, None),
            Err(LabError::InvalidValue { .. })
        ));
    }
}
