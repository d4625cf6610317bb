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

//! Name checks for everything that ends up in a Kubernetes object name.

use crate::shared::error::{LabError, Result};
use regex::Regex;

const DNS_LABEL_PATTERN: &str = r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$";
const DNS_LABEL_MAX_LEN: usize = 63;

pub struct NameValidator {
    pattern: Regex,
}

impl NameValidator {
    pub fn new() -> Result<Self> {
        let pattern = Regex::new(DNS_LABEL_PATTERN)
            .map_err(|e| LabError::config_error(format!("Invalid name pattern: {}", e)))?;
        Ok(Self { pattern })
    }

    /// App, component and volume names must be RFC 1123 labels.
    pub fn validate(&self, kind: &str, name: &str) -> Result<()> {
        if name.len() > DNS_LABEL_MAX_LEN {
            return Err(LabError::contract(format!(
                "{} name '{}' is longer than {} characters",
                kind, name, DNS_LABEL_MAX_LEN
            )));
        }
        if !self.pattern.is_match(name) {
            return Err(LabError::contract(format!(
                "{} name '{}' must consist of lower case alphanumeric characters or '-', \
                 and must start and end with an alphanumeric character",
                kind, name
            )));
        }
        Ok(())
    }
}
