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

//! Longhorn recurring backup jobs.

use kube::api::{ApiResource, DynamicObject, GroupVersionKind};
use serde_json::json;
use std::collections::BTreeMap;

pub fn recurring_job_api() -> ApiResource {
    ApiResource::from_gvk_with_plural(
        &GroupVersionKind::gvk("longhorn.io", "v1beta2", "RecurringJob"),
        "recurringjobs",
    )
}

/// Backs up every volume in `group` on `cron`, keeping `retain` backups.
pub fn build_recurring_backup(
    name: &str,
    namespace: &str,
    labels: BTreeMap<String, String>,
    group: &str,
    cron: &str,
    retain: i64,
) -> DynamicObject {
    let mut job = DynamicObject::new(name, &recurring_job_api())
        .within(namespace)
        .data(json!({
            "spec": {
                "name": name,
                "task": "backup",
                "cron": cron,
                "retain": retain,
                "concurrency": 1,
                "groups": [group],
            }
        }));
    job.metadata.labels = Some(labels);
    job
}
