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

//! In-memory resource graph
//!
//! Composition never talks to a cluster. Every object it describes is pushed into a
//! [`ResourceSink`] together with the explicit dependencies the provider must honour.
//! [`ResourceGraph`] only accepts dependencies on resources it already holds, so its
//! insertion order is always a valid apply order.

use crate::shared::error::{LabError, Result};
use kube::api::{ApiResource, DynamicObject};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId {
    pub kind: String,
    pub namespace: Option<String>,
    pub name: String,
}

impl ResourceId {
    pub fn new(kind: &str, namespace: Option<&str>, name: &str) -> Self {
        Self {
            kind: kind.to_string(),
            namespace: namespace.map(str::to_string),
            name: name.to_string(),
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{}/{}/{}", self.kind, ns, self.name),
            None => write!(f, "{}/{}", self.kind, self.name),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Resource {
    pub id: ResourceId,
    pub api: ApiResource,
    pub object: DynamicObject,
    /// Application that declared the resource.
    pub owner: String,
    pub depends_on: Vec<ResourceId>,
    /// Replacement must delete the old object first (e.g. StorageClass parameters are immutable).
    pub delete_before_replace: bool,
}

impl Resource {
    pub fn typed<K>(owner: &str, object: &K) -> Result<Self>
    where
        K: kube::Resource<DynamicType = ()> + Serialize,
    {
        let api = ApiResource::erase::<K>(&());
        let object: DynamicObject = serde_json::from_value(serde_json::to_value(object)?)?;
        Self::dynamic(owner, api, object)
    }

    pub fn dynamic(owner: &str, api: ApiResource, object: DynamicObject) -> Result<Self> {
        let name = object.metadata.name.clone().ok_or_else(|| {
            LabError::contract(format!("{} declared by '{}' has no name", api.kind, owner))
        })?;
        let id = ResourceId {
            kind: api.kind.clone(),
            namespace: object.metadata.namespace.clone(),
            name,
        };

        Ok(Self {
            id,
            api,
            object,
            owner: owner.to_string(),
            depends_on: Vec::new(),
            delete_before_replace: false,
        })
    }

    pub fn depends_on<'a>(mut self, ids: impl IntoIterator<Item = &'a ResourceId>) -> Self {
        for id in ids {
            if !self.depends_on.contains(id) {
                self.depends_on.push(id.clone());
            }
        }
        self
    }

    pub fn delete_before_replace(mut self) -> Self {
        self.delete_before_replace = true;
        self
    }

    /// Converts the stored object back into its typed form.
    pub fn to_typed<K: DeserializeOwned>(&self) -> Result<K> {
        Ok(serde_json::from_value(serde_json::to_value(&self.object)?)?)
    }
}

pub trait ResourceSink {
    fn push(&mut self, resource: Resource) -> Result<ResourceId>;
}

#[derive(Debug, Clone, Default)]
pub struct ResourceGraph {
    resources: Vec<Resource>,
    ids: BTreeSet<ResourceId>,
}

impl ResourceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn contains(&self, id: &ResourceId) -> bool {
        self.ids.contains(id)
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn get(&self, id: &ResourceId) -> Option<&Resource> {
        self.resources.iter().find(|r| &r.id == id)
    }

    pub fn find(&self, kind: &str, namespace: Option<&str>, name: &str) -> Option<&Resource> {
        self.get(&ResourceId::new(kind, namespace, name))
    }

    pub fn of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Resource> + 'a {
        self.resources.iter().filter(move |r| r.id.kind == kind)
    }

    /// Typed lookup of a k8s-openapi object by namespace and name.
    pub fn get_typed<K>(&self, namespace: Option<&str>, name: &str) -> Result<Option<K>>
    where
        K: kube::Resource<DynamicType = ()> + DeserializeOwned,
    {
        let kind = K::kind(&()).to_string();
        self.find(&kind, namespace, name)
            .map(|r| r.to_typed::<K>())
            .transpose()
    }

    /// Resource count per kind, for summaries.
    pub fn counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for resource in &self.resources {
            *counts.entry(resource.id.kind.clone()).or_insert(0) += 1;
        }
        counts
    }

    pub fn merge(&mut self, other: ResourceGraph) -> Result<()> {
        for resource in other.resources {
            self.push(resource)?;
        }
        Ok(())
    }

    /// Multi-document YAML in apply order.
    pub fn to_yaml(&self) -> Result<String> {
        let mut out = String::new();
        for resource in &self.resources {
            out.push_str("---\n");
            out.push_str(&serde_yaml::to_string(&resource.object)?);
        }
        Ok(out)
    }
}

impl ResourceSink for ResourceGraph {
    fn push(&mut self, resource: Resource) -> Result<ResourceId> {
        if self.ids.contains(&resource.id) {
            return Err(LabError::duplicate(
                resource.id.kind.clone(),
                resource.id.name.clone(),
                resource.owner.clone(),
            ));
        }
        if let Some(missing) = resource.depends_on.iter().find(|d| !self.ids.contains(*d)) {
            return Err(LabError::contract(format!(
                "{} depends on {} which has not been declared",
                resource.id, missing
            )));
        }

        tracing::debug!("Declared {} (owner {})", resource.id, resource.owner);
        let id = resource.id.clone();
        self.ids.insert(id.clone());
        self.resources.push(resource);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::{ConfigMap, Namespace};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    fn namespace(name: &str) -> Namespace {
        Namespace {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn config_map(ns: &str, name: &str) -> ConfigMap {
        ConfigMap {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(ns.to_string()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_push_and_typed_roundtrip() {
        let mut graph = ResourceGraph::new();
        let ns = graph
            .push(Resource::typed("app", &namespace("app")).unwrap())
            .unwrap();
        assert_eq!(ns.to_string(), "Namespace/app");

        let cm = Resource::typed("app", &config_map("app", "app-config"))
            .unwrap()
            .depends_on([&ns]);
        graph.push(cm).unwrap();

        let found: ConfigMap = graph.get_typed(Some("app"), "app-config").unwrap().unwrap();
        assert_eq!(found.metadata.name.as_deref(), Some("app-config"));
        assert_eq!(graph.counts().get("ConfigMap"), Some(&1));
    }

    #[test]
    fn test_duplicates_are_rejected() {
        let mut graph = ResourceGraph::new();
        graph
            .push(Resource::typed("app", &namespace("app")).unwrap())
            .unwrap();
        let err = graph
            .push(Resource::typed("other", &namespace("app")).unwrap())
            .unwrap_err();
        assert!(matches!(err, LabError::Duplicate { .. }));
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn test_unknown_dependency_is_a_contract_violation() {
        let mut graph = ResourceGraph::new();
        let missing = ResourceId::new("Namespace", None, "nowhere");
        let cm = Resource::typed("app", &config_map("app", "cm"))
            .unwrap()
            .depends_on([&missing]);
        assert!(matches!(
            graph.push(cm),
            Err(LabError::ContractViolation(_))
        ));
    }

    #[test]
    fn test_yaml_keeps_apply_order() {
        let mut graph = ResourceGraph::new();
        graph
            .push(Resource::typed("app", &namespace("app")).unwrap())
            .unwrap();
        graph
            .push(Resource::typed("app", &config_map("app", "cm")).unwrap())
            .unwrap();
        let yaml = graph.to_yaml().unwrap();
        let ns_pos = yaml.find("kind: Namespace").unwrap();
        let cm_pos = yaml.find("kind: ConfigMap").unwrap();
        assert!(ns_pos < cm_pos);
    }
}
