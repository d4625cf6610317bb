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

/// Resource labels
pub const LABEL_NAME: &str = "app.kubernetes.io/name";
pub const LABEL_MANAGED_BY: &str = "app.kubernetes.io/managed-by";
pub const LABEL_COMPONENT: &str = "app.kubernetes.io/component";
pub const LABEL_VERSION: &str = "app.kubernetes.io/version";
pub const MANAGED_BY_VALUE: &str = "OrangeLab";
pub const DEFAULT_COMPONENT: &str = "default";

/// Annotations
pub const ANNOTATION_CONFIG_CHECKSUM: &str = "checksum/config";
pub const ANNOTATION_CLUSTER_ISSUER: &str = "cert-manager.io/cluster-issuer";
pub const ANNOTATION_TAILSCALE_HOSTNAME: &str = "tailscale.com/hostname";
pub const ANNOTATION_EXTERNAL_DNS_HOSTNAME: &str = "external-dns.alpha.kubernetes.io/hostname";

/// Node labels
pub const NODE_LABEL_GPU_NVIDIA: &str = "orangelab/gpu-nvidia";
pub const NODE_LABEL_GPU_AMD: &str = "orangelab/gpu-amd";
pub const TOPOLOGY_KEY_HOSTNAME: &str = "kubernetes.io/hostname";

/// GPU resources and devices
pub const RESOURCE_NVIDIA_GPU: &str = "nvidia.com/gpu";
pub const DEVICE_KFD: &str = "/dev/kfd";
pub const DEVICE_DRI: &str = "/dev/dri";
pub const ENV_HSA_OVERRIDE_GFX_VERSION: &str = "HSA_OVERRIDE_GFX_VERSION";
pub const ENV_HCC_AMDGPU_TARGET: &str = "HCC_AMDGPU_TARGET";

/// Storage
pub const DEFAULT_STORAGE_SIZE: &str = "10Gi";
pub const DEFAULT_ACCESS_MODE: &str = "ReadWriteOnce";
pub const LONGHORN_CSI_DRIVER: &str = "driver.longhorn.io";
pub const LABEL_BACKUP_GROUP_PREFIX: &str = "recurring-job-group.longhorn.io";
pub const BACKUP_GROUP_DEFAULT: &str = "backup";
pub const BACKUP_RETAIN: i64 = 7;
pub const LONGHORN_NAMESPACE: &str = "longhorn-system";
pub const LOCAL_STORAGE_ROOT: &str = "/var/lib/orangelab";
pub const VOLUME_TYPE_DIRECTORY_OR_CREATE: &str = "DirectoryOrCreate";
pub const VOLUME_TYPE_CHAR_DEVICE: &str = "CharDevice";
pub const VOLUME_TYPE_DIRECTORY: &str = "Directory";
pub const RECLAIM_POLICY_RETAIN: &str = "Retain";

/// Networking
pub const PORT_NAME_HTTP: &str = "http";
pub const PROTOCOL_TCP: &str = "TCP";
pub const SERVICE_TYPE_CLUSTER_IP: &str = "ClusterIP";
pub const SERVICE_TYPE_LOAD_BALANCER: &str = "LoadBalancer";
pub const LOAD_BALANCER_CLASS_TAILSCALE: &str = "tailscale";
pub const SERVICE_SUFFIX_LB: &str = "-lb";
pub const TLS_SECRET_SUFFIX: &str = "-tls-secret";

/// Databases
pub const DEFAULT_DATABASE_NAME: &str = "db";
pub const MARIADB_PORT: i32 = 3306;
pub const POSTGRES_PORT: i32 = 5432;
pub const GENERATED_PASSWORD_LENGTH: usize = 32;
pub const DB_WAIT_RETRY_SECONDS: u32 = 5;
pub const DB_WAIT_CONNECT_TIMEOUT_SECONDS: u32 = 30;

/// Init container settings
pub const INIT_CONTAINER_IMAGE: &str = "busybox:latest";
pub const INIT_CONTAINER_FIX_PERMISSIONS: &str = "fix-permissions";

/// Workloads
pub const STRATEGY_TYPE_RECREATE: &str = "Recreate";
pub const RESTART_POLICY_NEVER: &str = "Never";
pub const SECCOMP_UNCONFINED: &str = "Unconfined";
pub const SECRET_SUFFIX_ENV: &str = "-env";

/// Apply settings
pub const FIELD_MANAGER: &str = "orangelab";
