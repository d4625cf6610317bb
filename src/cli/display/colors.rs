//! Color theme for CLI output

use comfy_table::Color as TableColor;

/// Color theme for terminal output
#[derive(Debug, Clone)]
pub struct ColorTheme {
    pub success: TableColor,
    pub warning: TableColor,
    pub error: TableColor,
    pub info: TableColor,
    pub muted: TableColor,
}

impl Default for ColorTheme {
    fn default() -> Self {
        Self {
            success: TableColor::Green,
            warning: TableColor::Yellow,
            error: TableColor::Red,
            info: TableColor::Cyan,
            muted: TableColor::DarkGrey,
        }
    }
}

impl ColorTheme {
    /// Public endpoints stand out, in-cluster ones are muted
    pub fn get_endpoint_color(&self, public: bool) -> TableColor {
        if public {
            self.info
        } else {
            self.muted
        }
    }

    /// Color for a check result given its warning count
    pub fn get_check_color(&self, warnings: usize) -> TableColor {
        if warnings == 0 {
            self.success
        } else {
            self.warning
        }
    }
}
