//! Status icons for CLI output

/// Status icons for different states
pub struct StatusIcon;

impl StatusIcon {
    /// Success icon (composed cleanly)
    pub const SUCCESS: &'static str = "✓";

    /// Warning icon (deprecated keys in use)
    pub const WARNING: &'static str = "⚠";

    /// Endpoint reachable from outside the cluster
    pub const PUBLIC: &'static str = "🌐";

    /// Endpoint only reachable inside the cluster
    pub const INTERNAL: &'static str = "🔒";

    pub fn get_check_icon(warnings: usize) -> &'static str {
        if warnings == 0 {
            Self::SUCCESS
        } else {
            Self::WARNING
        }
    }

    /// Protocol shown for an endpoint value
    pub fn get_protocol_text(endpoint: &str) -> &'static str {
        if endpoint.starts_with("https://") {
            "HTTPS"
        } else if endpoint.starts_with("http://") {
            "HTTP"
        } else {
            "TCP"
        }
    }
}
