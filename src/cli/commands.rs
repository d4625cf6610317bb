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

// CLI command definitions

use super::lab::{ApplyCommand, CheckCommand, EndpointsCommand, RenderCommand};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "orangelab",
    version,
    about = "Home-lab platform composer for Kubernetes",
    long_about = "Composes the enabled OrangeLab applications into one Kubernetes resource graph and renders or applies it"
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Render the composed resources as multi-document YAML
    Render(RenderCommand),

    /// Show the public and in-cluster endpoints of every enabled app
    Endpoints(EndpointsCommand),

    /// Compose without output, report deprecated keys and a resource summary
    Check(CheckCommand),

    /// Server-side apply the composed resources to a cluster
    Apply(ApplyCommand),
}
