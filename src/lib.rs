//! panelgate - signed-capability gateway for a desktop shell
//!
//! A trusted userland surface asks the shell to open an isolated panel:
//! 1. Userland has the shell sign the resource locator with the process key
//! 2. It submits `{locator, signature, public key}` to the gateway
//! 3. The gateway verifies, derives a wallet, and opens one fresh panel
//! 4. The panel receives `{url, wallet}` once it reports ready
//!
//! The process keypair is generated at startup, never persisted, and
//! zeroized at exit.

pub mod auth;
pub mod config;
pub mod consumer;
pub mod entropy;
pub mod error;
pub mod identity;
pub mod shell;
pub mod signature;
pub mod userland;

pub use auth::{AuthorizationGateway, CapabilityRequest, Decision, DenialReason, Grant, OpenOutcome};
pub use config::ShellConfig;
pub use consumer::{ConsumerContext, ConsumerHost, LocalPanelHost, PanelId};
pub use error::{GateError, Result};
pub use identity::IdentityStore;
pub use shell::{IpcReply, Shell};
pub use userland::Userland;
