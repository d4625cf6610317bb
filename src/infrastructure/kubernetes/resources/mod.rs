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

//! Builders for the Kubernetes objects an application is composed of.

pub mod backup;
pub mod configmap;
pub mod database;
pub mod ingress;
pub mod pod;
pub mod service;
pub mod volume;
pub mod workload;

pub use configmap::{ConfigMapBuilder, SecretBuilder};
pub use ingress::IngressBuilder;
pub use pod::PodTemplateBuilder;
pub use service::ServiceBuilder;
pub use volume::PersistentVolumeClaimBuilder;
pub use workload::WorkloadBuilder;
