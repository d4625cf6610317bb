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

use crate::infrastructure::constants::{RESTART_POLICY_NEVER, STRATEGY_TYPE_RECREATE};
use k8s_openapi::api::apps::v1::{
    DaemonSet, DaemonSetSpec, Deployment, DeploymentSpec, DeploymentStrategy,
};
use k8s_openapi::api::batch::v1::{Job, JobSpec};
use k8s_openapi::api::core::v1::PodTemplateSpec;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use std::collections::BTreeMap;

pub struct WorkloadBuilder {
    metadata: ObjectMeta,
    selector: BTreeMap<String, String>,
    template: PodTemplateSpec,
}

impl WorkloadBuilder {
    pub fn new(
        metadata: ObjectMeta,
        selector: BTreeMap<String, String>,
        template: PodTemplateSpec,
    ) -> Self {
        Self {
            metadata,
            selector,
            template,
        }
    }

    fn label_selector(&self) -> LabelSelector {
        LabelSelector {
            match_labels: Some(self.selector.clone()),
            ..Default::default()
        }
    }

    /// Single replica replaced in place; volumes are ReadWriteOnce.
    pub fn build_deployment(self) -> Deployment {
        Deployment {
            spec: Some(DeploymentSpec {
                replicas: Some(1),
                selector: self.label_selector(),
                strategy: Some(DeploymentStrategy {
                    type_: Some(STRATEGY_TYPE_RECREATE.to_string()),
                    rolling_update: None,
                }),
                template: self.template,
                ..Default::default()
            }),
            metadata: self.metadata,
            ..Default::default()
        }
    }

    pub fn build_daemon_set(self) -> DaemonSet {
        DaemonSet {
            spec: Some(DaemonSetSpec {
                selector: self.label_selector(),
                template: self.template,
                ..Default::default()
            }),
            metadata: self.metadata,
            ..Default::default()
        }
    }

    pub fn build_job(mut self) -> Job {
        if let Some(spec) = self.template.spec.as_mut() {
            spec.restart_policy
                .get_or_insert_with(|| RESTART_POLICY_NEVER.to_string());
        }
        Job {
            spec: Some(JobSpec {
                template: self.template,
                backoff_limit: Some(3),
                ..Default::default()
            }),
            metadata: self.metadata,
            ..Default::default()
        }
    }
}
