//! Table rendering for CLI output

use super::{ColorTheme, StatusIcon};
use crate::domain::LabOutput;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, CellAlignment, ContentArrangement, Table};

/// Table renderer for formatted output
pub struct TableRenderer {
    theme: ColorTheme,
}

impl Default for TableRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TableRenderer {
    /// Create a new table renderer with default theme
    pub fn new() -> Self {
        Self {
            theme: ColorTheme::default(),
        }
    }

    /// Render public and in-cluster endpoints, one row per endpoint key
    pub fn render_endpoints(&self, output: &LabOutput) -> String {
        if output.endpoints.is_empty() && output.cluster_endpoints.is_empty() {
            return "No endpoints, no apps enabled".to_string();
        }

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                Cell::new("KEY").set_alignment(CellAlignment::Left),
                Cell::new("SCOPE").set_alignment(CellAlignment::Center),
                Cell::new("PROTOCOL").set_alignment(CellAlignment::Center),
                Cell::new("ENDPOINT").set_alignment(CellAlignment::Left),
            ]);

        let rows = output
            .endpoints
            .iter()
            .map(|(key, value)| (key, value, true))
            .chain(
                output
                    .cluster_endpoints
                    .iter()
                    .map(|(key, value)| (key, value, false)),
            );
        for (key, value, public) in rows {
            let (icon, scope) = if public {
                (StatusIcon::PUBLIC, "public")
            } else {
                (StatusIcon::INTERNAL, "cluster")
            };
            let color = self.theme.get_endpoint_color(public);
            table.add_row(vec![
                Cell::new(key),
                Cell::new(format!("{} {}", icon, scope)).fg(color),
                Cell::new(StatusIcon::get_protocol_text(value)),
                Cell::new(value).fg(color),
            ]);
        }

        let mut text = String::new();
        text.push_str(&format!(
            "╭─ OrangeLab Endpoints {} ─╮\n",
            format!("[{} apps]", output.apps.len()).bright_black()
        ));
        text.push_str(&table.to_string());
        text.push('\n');
        text
    }

    /// Render the composed apps, resource counts per kind and deprecation warnings
    pub fn render_summary(&self, output: &LabOutput) -> String {
        let warnings = output.warnings.len();
        let status = format!(
            "{} {} apps, {} resources, {} warnings",
            StatusIcon::get_check_icon(warnings),
            output.apps.len(),
            output.resources.len(),
            warnings
        );

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);

        table.add_row(vec![Cell::new("📊 OrangeLab Check").set_alignment(CellAlignment::Center)]);
        table.add_row(vec![Cell::new(status).fg(self.theme.get_check_color(warnings))]);

        let apps = if output.apps.is_empty() {
            "Apps\n  none enabled".to_string()
        } else {
            format!("Apps\n  {}", output.apps.join("\n  "))
        };
        let counts = output
            .resources
            .counts()
            .iter()
            .map(|(kind, count)| format!("  {}: {}", kind, count))
            .collect::<Vec<_>>()
            .join("\n");
        table.add_row(vec![
            Cell::new(apps).fg(self.theme.info),
            Cell::new(format!("Resources\n{}", counts)),
        ]);

        for warning in &output.warnings {
            table.add_row(vec![
                Cell::new(format!("{} {}", StatusIcon::WARNING, warning)).fg(self.theme.warning)
            ]);
        }

        table.to_string()
    }
}
