//! IPC surface exposed to the UI layer
//!
//! The UI talks to the shell over three named channels:
//!
//! | channel          | payload                              | reply            |
//! |------------------|--------------------------------------|------------------|
//! | `get-public-key` | none                                 | `public-key`     |
//! | `sign-message`   | string                               | `signature`      |
//! | `open-panel`     | `{url, signature, publicKey}` object | `panel-opened` or `panel-open-error` |
//!
//! Payloads arrive as untyped JSON so type mismatches can be reported as
//! `InvalidInput` instead of being coerced.

use std::str::FromStr;
use std::sync::Arc;

use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::auth::{AuthorizationGateway, DenialReason, OpenOutcome};
use crate::config::ShellConfig;
use crate::consumer::{ConsumerHost, LocalPanelHost, PanelId};
use crate::error::{GateError, Result};
use crate::identity::IdentityStore;
use crate::signature;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    GetPublicKey,
    SignMessage,
    OpenPanel,
}

impl Channel {
    pub fn as_str(self) -> &'static str {
        match self {
            Channel::GetPublicKey => "get-public-key",
            Channel::SignMessage => "sign-message",
            Channel::OpenPanel => "open-panel",
        }
    }
}

impl FromStr for Channel {
    type Err = GateError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "get-public-key" => Ok(Channel::GetPublicKey),
            "sign-message" => Ok(Channel::SignMessage),
            "open-panel" => Ok(Channel::OpenPanel),
            other => Err(GateError::InvalidInput(format!("unknown channel {other:?}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum IpcReply {
    PublicKey {
        #[serde(rename = "publicKey")]
        public_key: String,
    },
    Signature {
        signature: String,
    },
    PanelOpened {
        panel: PanelId,
        url: String,
    },
    PanelOpenError {
        reason: DenialReason,
    },
}

/// The privileged side of the desktop shell
pub struct Shell<H = LocalPanelHost> {
    identity: Arc<IdentityStore>,
    gateway: AuthorizationGateway,
    host: H,
}

impl Shell<LocalPanelHost> {
    /// Build a shell with an in-process panel host configured from `config`
    pub fn with_config(identity: Arc<IdentityStore>, config: &ShellConfig) -> Self {
        let host = match config.panel_limit() {
            Some(max) => LocalPanelHost::with_max_panels(max),
            None => LocalPanelHost::new(),
        };
        if config.announce_public_key {
            info!("Public Key: {}", identity.public_key_base64());
        }
        Self::new(identity, host)
    }
}

impl<H: ConsumerHost> Shell<H> {
    pub fn new(identity: Arc<IdentityStore>, host: H) -> Self {
        Self {
            identity,
            gateway: AuthorizationGateway::new(),
            host,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn get_public_key(&self) -> String {
        self.identity.public_key_base64()
    }

    /// Sign a message received over IPC; non-string payloads are rejected
    pub fn sign_message(&self, message: &Value) -> Result<String> {
        let message = message
            .as_str()
            .ok_or_else(|| GateError::InvalidInput("message must be a string".into()))?;
        Ok(signature::sign_base64(&self.identity, message))
    }

    pub fn open_panel(&self, data: &Value) -> Result<OpenOutcome> {
        self.gateway.open_panel(&self.host, data)
    }

    /// Dispatch one IPC message
    pub fn handle(&self, channel: &str, payload: &Value) -> Result<IpcReply> {
        let channel = channel.parse::<Channel>()?;
        debug!("ipc {}", channel.as_str());

        match channel {
            Channel::GetPublicKey => Ok(IpcReply::PublicKey {
                public_key: self.get_public_key(),
            }),
            Channel::SignMessage => Ok(IpcReply::Signature {
                signature: self.sign_message(payload)?,
            }),
            Channel::OpenPanel => Ok(match self.open_panel(payload)? {
                OpenOutcome::Opened {
                    panel,
                    resource_locator,
                } => IpcReply::PanelOpened {
                    panel,
                    url: resource_locator,
                },
                OpenOutcome::Denied(reason) => IpcReply::PanelOpenError { reason },
            }),
        }
    }

    /// Dispatch a JSON-encoded IPC message and encode the reply
    pub fn handle_json(&self, channel: &str, payload: &str) -> Result<String> {
        let payload: Value = if payload.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(payload)?
        };
        let reply = self.handle(channel, &payload)?;
        Ok(serde_json::to_string(&reply)?)
    }
}
