//! Shell configuration
//!
//! Defaults live in constants; the binary overrides them from the command
//! line or environment (see `main.rs`).

/// Default log filter when neither `--log` nor `PANELGATE_LOG` is set
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Panels allowed open at once; 0 means unlimited
pub const DEFAULT_MAX_PANELS: usize = 0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    pub log_filter: String,
    pub max_panels: usize,
    /// Log the base64 public key once the identity exists
    pub announce_public_key: bool,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            log_filter: DEFAULT_LOG_FILTER.to_owned(),
            max_panels: DEFAULT_MAX_PANELS,
            announce_public_key: true,
        }
    }
}

impl ShellConfig {
    pub fn panel_limit(&self) -> Option<usize> {
        (self.max_panels > 0).then_some(self.max_panels)
    }
}
