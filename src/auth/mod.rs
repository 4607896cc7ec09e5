//! Capability gateway
//!
//! # Philosophy
//!
//! Authorization here is **capability-based**, not **identity-based**. A
//! panel never inherits trust from the shell; it gets exactly what a
//! verified request grants it: one resource locator and one wallet.
//!
//! # Request lifecycle
//!
//! Every request is terminal in one step:
//!
//! ```text
//! Received --(field types wrong)--> Denied(InvalidInput)
//! Received --(verify false)-------> Denied(BadSignature)
//! Received --(verify true)--------> Verified --derive--> Granted
//! ```
//!
//! A [`Grant`] can only be built here, after [`signature::verify_base64`]
//! accepted a signature over the exact locator the grant carries. The wallet
//! is derived after verification, and the raw signature and public key are
//! never forwarded to the consumer.
//!
//! The gateway is stateless: requests are independent and may be served
//! concurrently.

pub mod wallet;

use std::fmt;

use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::consumer::{self, ConsumerHost, InitializePayload, PanelId};
use crate::error::Result;
use crate::signature;

pub use wallet::{derive, DerivedSecret, WALLET_LEN};

/// Fields of an `open-panel` request as sent by userland
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CapabilityRequest {
    #[serde(rename = "url", alias = "resourceLocator")]
    pub resource_locator: String,
    /// Base64 signature over `resource_locator`
    pub signature: String,
    /// Base64 public key the requester claims to sign with
    #[serde(rename = "publicKey")]
    pub public_key: String,
}

impl CapabilityRequest {
    pub fn new(
        resource_locator: impl Into<String>,
        signature: impl Into<String>,
        public_key: impl Into<String>,
    ) -> Self {
        Self {
            resource_locator: resource_locator.into(),
            signature: signature.into(),
            public_key: public_key.into(),
        }
    }

    /// Type-check an untyped IPC payload
    pub fn from_value(value: &Value) -> std::result::Result<Self, DenialReason> {
        Self::deserialize(value).map_err(|e| {
            warn!("malformed capability request: {}", e);
            DenialReason::InvalidInput
        })
    }
}

/// Authorization to load one resource in one fresh panel
///
/// Not `Clone`: a grant is moved into exactly one consumer.
#[derive(Debug, PartialEq, Eq)]
pub struct Grant {
    resource_locator: String,
    derived_secret: DerivedSecret,
}

impl Grant {
    pub fn resource_locator(&self) -> &str {
        &self.resource_locator
    }

    pub fn derived_secret(&self) -> &DerivedSecret {
        &self.derived_secret
    }

    pub fn into_payload(self) -> InitializePayload {
        InitializePayload {
            wallet: self.derived_secret.as_str().to_owned(),
            url: self.resource_locator,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DenialReason {
    InvalidInput,
    BadSignature,
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenialReason::InvalidInput => write!(f, "InvalidInput"),
            DenialReason::BadSignature => write!(f, "BadSignature"),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum Decision {
    Granted(Grant),
    Denied(DenialReason),
}

/// Result of opening a panel through the gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenOutcome {
    Opened { panel: PanelId, resource_locator: String },
    Denied(DenialReason),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AuthorizationGateway;

impl AuthorizationGateway {
    pub fn new() -> Self {
        Self
    }

    /// Verify a typed request and, on success, derive its grant
    pub fn authorize(&self, request: CapabilityRequest) -> Decision {
        let CapabilityRequest {
            resource_locator,
            signature,
            public_key,
        } = request;

        if !signature::verify_base64(&resource_locator, &signature, &public_key) {
            return Decision::Denied(DenialReason::BadSignature);
        }

        let derived_secret = wallet::derive(&public_key, &resource_locator);
        Decision::Granted(Grant {
            resource_locator,
            derived_secret,
        })
    }

    /// Entry point for untyped IPC payloads
    pub fn request_capability(&self, fields: &Value) -> Decision {
        match CapabilityRequest::from_value(fields) {
            Ok(request) => self.authorize(request),
            Err(reason) => Decision::Denied(reason),
        }
    }

    /// Authorize, then open exactly one panel and deliver the grant to it
    ///
    /// Denials come back as [`OpenOutcome::Denied`]; `Err` means the host
    /// failed after the grant was issued.
    pub fn open_panel<H: ConsumerHost>(&self, host: &H, fields: &Value) -> Result<OpenOutcome> {
        let grant = match self.request_capability(fields) {
            Decision::Granted(grant) => grant,
            Decision::Denied(reason) => {
                warn!("panel denied: {}", reason);
                return Ok(OpenOutcome::Denied(reason));
            }
        };

        let resource_locator = grant.resource_locator().to_owned();
        let panel = consumer::deliver(host, grant)?;
        info!("{} granted {}", panel, resource_locator);

        Ok(OpenOutcome::Opened {
            panel,
            resource_locator,
        })
    }
}
