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

//! Building blocks an application is composed from.

#[allow(clippy::module_inception)]
pub mod application;
pub mod databases;
pub mod metadata;
pub mod network;
pub mod nodes;
pub mod spec;
pub mod storage;
pub mod validator;

pub use application::{Application, ApplicationOutput, LabContext};
pub use databases::{DatabaseArgs, DatabaseBackend, DatabaseConfig, Databases};
pub use metadata::{Metadata, ResourceIdentity};
pub use network::{endpoint_key, IngressInfo, Network};
pub use nodes::Nodes;
pub use spec::{
    ContainerSpec, HealthCheck, HealthChecks, InitContainerSpec, PortSpec, ResourceSpec,
    VolumeMountSpec,
};
pub use storage::{LocalVolumeArgs, PersistentVolumeArgs, Storage, StorageType, VolumeSpec};
