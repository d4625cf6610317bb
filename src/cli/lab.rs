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

use crate::cli::display::TableRenderer;
use crate::domain::config::{Config, StaticConfigProvider};
use crate::domain::{Lab, LabOutput};
use crate::infrastructure::kubernetes::{KubeClient, LabKubeClient};
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;

const DEFAULT_CONFIG_FILE: &str = "lab.toml";

/// Options shared by every command that composes the lab.
#[derive(Parser, Debug, Clone)]
pub struct ConfigArgs {
    /// Path to the lab configuration file (TOML, one table per namespace)
    /// If not specified, reads ORANGELAB_CONFIG or falls back to ./lab.toml
    #[arg(long, short = 'f', value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Override any configuration value (-D namespace:key=value)
    ///
    /// Example: -Dollama:enabled=true -Dorangelab:storageClass=longhorn
    #[arg(short = 'D', value_name = "NS:KEY=VALUE")]
    pub properties: Vec<String>,
}

impl ConfigArgs {
    fn config_path(&self) -> PathBuf {
        self.file
            .clone()
            .or_else(|| std::env::var("ORANGELAB_CONFIG").ok().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
    }

    pub fn load(&self) -> anyhow::Result<Config> {
        let path = self.config_path();
        let mut provider = if path.exists() {
            StaticConfigProvider::from_file(&path)?
        } else {
            // Missing file is only fatal when nothing else configures the lab
            if self.properties.is_empty() {
                anyhow::bail!("Configuration file {} not found", path.display());
            }
            println!(
                "ℹ️  {} not found, using -D properties only",
                path.display()
            );
            StaticConfigProvider::new()
        };
        provider
            .apply_properties(&self.properties)
            .map_err(|e| anyhow::anyhow!("Failed to parse dynamic configs: {}", e))?;
        Ok(Config::new(provider))
    }

    pub fn compose(&self) -> anyhow::Result<LabOutput> {
        let config = self.load()?;
        Lab::compose(config).map_err(|e| anyhow::anyhow!("Composition failed: {}", e))
    }
}

#[derive(Parser, Debug)]
pub struct RenderCommand {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Write the YAML to a file instead of stdout
    #[arg(long, short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct EndpointsCommand {
    #[command(flatten)]
    pub config: ConfigArgs,
}

#[derive(Parser, Debug)]
pub struct CheckCommand {
    #[command(flatten)]
    pub config: ConfigArgs,
}

#[derive(Parser, Debug)]
pub struct ApplyCommand {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Path to kubeconfig file
    /// If not specified, uses default kubeconfig resolution (KUBECONFIG env or ~/.kube/config)
    #[arg(long)]
    pub kubeconfig: Option<String>,

    /// Kubernetes context to use
    /// If not specified, uses current context from kubeconfig
    #[arg(long)]
    pub context: Option<String>,

    /// Send every request with dryRun=All
    #[arg(long)]
    pub dry_run: bool,
}

fn print_warnings(output: &LabOutput) {
    for warning in &output.warnings {
        eprintln!("{} {}", "warning:".yellow().bold(), warning);
    }
}

impl RenderCommand {
    pub async fn execute(&self) -> anyhow::Result<()> {
        let output = self.config.compose()?;
        print_warnings(&output);
        let yaml = output.resources.to_yaml()?;

        match &self.output {
            Some(path) => {
                std::fs::write(path, yaml)?;
                println!(
                    "Rendered {} resources to {}",
                    output.resources.len(),
                    path.display()
                );
            }
            None => print!("{}", yaml),
        }
        Ok(())
    }
}

impl EndpointsCommand {
    pub async fn execute(&self) -> anyhow::Result<()> {
        let output = self.config.compose()?;
        print_warnings(&output);
        println!("{}", TableRenderer::new().render_endpoints(&output));
        Ok(())
    }
}

impl CheckCommand {
    pub async fn execute(&self) -> anyhow::Result<()> {
        let output = self.config.compose()?;
        println!("{}", TableRenderer::new().render_summary(&output));
        Ok(())
    }
}

impl ApplyCommand {
    pub async fn execute(&self) -> anyhow::Result<()> {
        let output = self.config.compose()?;
        print_warnings(&output);
        if output.resources.is_empty() {
            println!("No enabled apps, nothing to apply");
            return Ok(());
        }

        let client = LabKubeClient::new_with_config(self.kubeconfig.clone(), self.context.clone())
            .await
            .map_err(|e| anyhow::anyhow!("Failed to create Kubernetes client: {}", e))?
            .with_dry_run(self.dry_run);

        let applied = client
            .apply_graph(&output.resources)
            .await
            .map_err(|e| anyhow::anyhow!("Apply failed: {}", e))?;

        let suffix = if self.dry_run { " (dry run)" } else { "" };
        println!(
            "Applied {} resources for {} apps{}",
            applied,
            output.apps.len(),
            suffix
        );
        Ok(())
    }
}
