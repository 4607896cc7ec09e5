//! Userland requester
//!
//! Turns what the user typed into a signed `open-panel` request. This is the
//! only place a locator is normalized; the gateway grants exactly the string
//! that was signed.

use log::{info, warn};
use serde_json::{json, Value};

use crate::auth::OpenOutcome;
use crate::consumer::ConsumerHost;
use crate::error::{GateError, Result};
use crate::shell::Shell;

/// Trim input and default to `https://` when no http(s) scheme is given
pub fn normalize_locator(input: &str) -> Result<String> {
    let url = input.trim();
    if url.is_empty() {
        return Err(GateError::InvalidInput("Please enter a URL".into()));
    }
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(url.to_owned())
    } else {
        Ok(format!("https://{url}"))
    }
}

/// The trusted requester surface, talking to the shell
pub struct Userland<'a, H: ConsumerHost> {
    shell: &'a Shell<H>,
}

impl<'a, H: ConsumerHost> Userland<'a, H> {
    pub fn new(shell: &'a Shell<H>) -> Self {
        Self { shell }
    }

    /// Build the signed request for `input` without submitting it
    pub fn prepare(&self, input: &str) -> Result<Value> {
        let url = normalize_locator(input)?;
        let public_key = self.shell.get_public_key();
        let signature = self.shell.sign_message(&Value::String(url.clone()))?;
        Ok(json!({
            "url": url,
            "signature": signature,
            "publicKey": public_key,
        }))
    }

    pub fn open(&self, input: &str) -> Result<OpenOutcome> {
        let request = self.prepare(input)?;
        let outcome = self.shell.open_panel(&request)?;
        match &outcome {
            OpenOutcome::Opened { panel, resource_locator } => {
                info!("opened {} for {}", panel, resource_locator)
            }
            OpenOutcome::Denied(reason) => warn!("Failed to open panel: {}", reason),
        }
        Ok(outcome)
    }
}
