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

use thiserror::Error;
pub type Result<T> = std::result::Result<T, LabError>;

#[derive(Error, Debug)]
pub enum LabError {
    #[error("Missing required configuration value '{namespace}:{key}'")]
    MissingConfiguration { namespace: String, key: String },

    #[error("'{app}' requires '{dependency}' to be enabled (set {dependency}:enabled=true)")]
    MissingDependency { app: String, dependency: String },

    #[error("Contract violation: {0}")]
    ContractViolation(String),

    #[error("Duplicate {resource_type} '{name}' in '{owner}'")]
    Duplicate {
        resource_type: String,
        name: String,
        owner: String,
    },

    #[error("Invalid value '{value}' for '{namespace}:{key}', expected {expected}")]
    InvalidValue {
        namespace: String,
        key: String,
        value: String,
        expected: String,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Kubernetes API error: {0}")]
    KubeError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl From<kube::Error> for LabError {
    fn from(err: kube::Error) -> Self {
        LabError::KubeError(err.to_string())
    }
}

impl LabError {
    pub fn config_error(context: impl Into<String>) -> Self {
        Self::ConfigError(context.into())
    }

    pub fn contract(context: impl Into<String>) -> Self {
        Self::ContractViolation(context.into())
    }

    pub fn missing(namespace: impl Into<String>, key: impl Into<String>) -> Self {
        Self::MissingConfiguration {
            namespace: namespace.into(),
            key: key.into(),
        }
    }

    pub fn missing_dependency(app: impl Into<String>, dependency: impl Into<String>) -> Self {
        Self::MissingDependency {
            app: app.into(),
            dependency: dependency.into(),
        }
    }

    pub fn duplicate(
        resource_type: impl Into<String>,
        name: impl Into<String>,
        owner: impl Into<String>,
    ) -> Self {
        Self::Duplicate {
            resource_type: resource_type.into(),
            name: name.into(),
            owner: owner.into(),
        }
    }

    pub fn invalid_value(
        namespace: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            namespace: namespace.into(),
            key: key.into(),
            value: value.into(),
            expected: expected.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_dependency_names_both_sides() {
        let err = LabError::missing_dependency("db-app", "mariadb-operator");
        let msg = err.to_string();
        assert!(msg.contains("db-app"));
        assert!(msg.contains("mariadb-operator"));
    }
}
