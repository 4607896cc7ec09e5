//! Isolated consumer contexts (panels)
//!
//! A panel receives no ambient trust. The shell asks a [`ConsumerHost`] for a
//! fresh context only after a grant exists, waits for the context to report
//! ready, then sends it one postcard-encoded [`InitializePayload`]. The
//! panel side decodes it with [`PanelSession::accept`].
//!
//! [`LocalPanelHost`] is the in-process host used by the binary and tests;
//! a windowing toolkit would provide its own [`ConsumerHost`].

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use log::{debug, info, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::auth::Grant;
use crate::error::{GateError, Result};

/// Identifier of a consumer context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PanelId(u64);

impl PanelId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PanelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "panel-{}", self.0)
    }
}

/// What a panel receives on `initialize`
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitializePayload {
    pub url: String,
    pub wallet: String,
}

impl InitializePayload {
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(postcard::to_allocvec(self)?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Ok(postcard::from_bytes(bytes)?)
    }
}

impl fmt::Debug for InitializePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InitializePayload")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

/// Something that can open isolated contexts
pub trait ConsumerHost {
    type Context: ConsumerContext;

    fn create_context(&self) -> Result<Self::Context>;
}

/// One isolated context, driven through ready -> initialize exactly once
pub trait ConsumerContext {
    fn id(&self) -> PanelId;

    /// Block until the context has finished loading
    fn wait_ready(&mut self) -> Result<()>;

    /// Hand the encoded payload to the context
    fn initialize(&mut self, payload: &[u8]) -> Result<()>;
}

/// Create a fresh context and deliver `grant` to it once it is ready
///
/// The grant is consumed, so it can reach at most one context. If the context
/// fails before initialization it is dropped, and hosts tear it down.
pub fn deliver<H: ConsumerHost>(host: &H, grant: Grant) -> Result<PanelId> {
    let payload = grant.into_payload().encode()?;

    let mut context = host.create_context()?;
    let id = context.id();
    debug!("{} created, waiting for ready", id);

    context.wait_ready()?;
    context.initialize(&payload)?;

    info!("{} initialized", id);
    Ok(id)
}

/// Panel-side view of a delivered payload (the `walletAPI` of a panel)
#[derive(Debug)]
pub struct PanelSession {
    payload: InitializePayload,
}

impl PanelSession {
    pub fn accept(bytes: &[u8]) -> Result<Self> {
        Ok(Self {
            payload: InitializePayload::decode(bytes)?,
        })
    }

    pub fn url(&self) -> &str {
        &self.payload.url
    }

    pub fn wallet(&self) -> &str {
        &self.payload.wallet
    }
}

/// Registry entry for an open panel
#[derive(Debug)]
pub struct PanelRecord {
    pub id: PanelId,
    pub ready: bool,
    pub session: Option<PanelSession>,
}

#[derive(Default)]
struct Registry {
    panels: Mutex<Vec<PanelRecord>>,
    next_id: AtomicU64,
}

/// In-process panel host with a registry of open panels
#[derive(Clone, Default)]
pub struct LocalPanelHost {
    registry: Arc<Registry>,
    max_panels: Option<usize>,
}

impl LocalPanelHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit the number of simultaneously open panels
    pub fn with_max_panels(max_panels: usize) -> Self {
        Self {
            max_panels: Some(max_panels),
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.registry.panels.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ids(&self) -> Vec<PanelId> {
        self.registry.panels.lock().iter().map(|p| p.id).collect()
    }

    /// Run `f` against the record for `id`, if the panel is open
    pub fn inspect<T>(&self, id: PanelId, f: impl FnOnce(&PanelRecord) -> T) -> Option<T> {
        self.registry.panels.lock().iter().find(|p| p.id == id).map(f)
    }

    pub fn close(&self, id: PanelId) -> bool {
        let mut panels = self.registry.panels.lock();
        let before = panels.len();
        panels.retain(|p| p.id != id);
        let closed = panels.len() != before;
        if closed {
            info!("{} closed", id);
        }
        closed
    }

    /// Close every panel (all windows closed)
    pub fn close_all(&self) -> usize {
        let mut panels = self.registry.panels.lock();
        let count = panels.len();
        panels.clear();
        count
    }

    fn update(&self, id: PanelId, f: impl FnOnce(&mut PanelRecord) -> Result<()>) -> Result<()> {
        let mut panels = self.registry.panels.lock();
        let record = panels
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| GateError::Host(format!("{id} is no longer open")))?;
        f(record)
    }
}

impl ConsumerHost for LocalPanelHost {
    type Context = LocalPanel;

    fn create_context(&self) -> Result<LocalPanel> {
        let mut panels = self.registry.panels.lock();
        if let Some(max) = self.max_panels {
            if panels.len() >= max {
                return Err(GateError::Host(format!("panel limit of {max} reached")));
            }
        }

        let id = PanelId(self.registry.next_id.fetch_add(1, Ordering::SeqCst));
        panels.push(PanelRecord {
            id,
            ready: false,
            session: None,
        });

        Ok(LocalPanel {
            id,
            host: self.clone(),
            initialized: false,
        })
    }
}

/// Context handle returned by [`LocalPanelHost`]
pub struct LocalPanel {
    id: PanelId,
    host: LocalPanelHost,
    initialized: bool,
}

impl ConsumerContext for LocalPanel {
    fn id(&self) -> PanelId {
        self.id
    }

    fn wait_ready(&mut self) -> Result<()> {
        // An in-process panel has nothing to load
        self.host.update(self.id, |record| {
            record.ready = true;
            Ok(())
        })
    }

    fn initialize(&mut self, payload: &[u8]) -> Result<()> {
        if self.initialized {
            return Err(GateError::Host(format!("{} already initialized", self.id)));
        }
        let session = PanelSession::accept(payload)?;
        self.host.update(self.id, |record| {
            if !record.ready {
                return Err(GateError::Host(format!("{} is not ready", record.id)));
            }
            record.session = Some(session);
            Ok(())
        })?;
        self.initialized = true;
        Ok(())
    }
}

impl Drop for LocalPanel {
    fn drop(&mut self) {
        if !self.initialized && self.host.close(self.id) {
            warn!("{} torn down before initialization", self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> InitializePayload {
        InitializePayload {
            url: "https://example.com".into(),
            wallet: "w".repeat(32),
        }
    }

    #[test]
    fn payload_survives_postcard() {
        let bytes = payload().encode().unwrap();
        let session = PanelSession::accept(&bytes).unwrap();
        assert_eq!(session.url(), "https://example.com");
        assert_eq!(session.wallet(), "w".repeat(32));
    }

    #[test]
    fn garbage_payload_is_rejected() {
        assert!(matches!(
            PanelSession::accept(&[0xff, 0xff, 0xff]),
            Err(GateError::Encoding(_))
        ));
    }

    #[test]
    fn initialize_requires_ready() {
        let host = LocalPanelHost::new();
        let mut panel = host.create_context().unwrap();
        let bytes = payload().encode().unwrap();
        assert!(panel.initialize(&bytes).is_err());
        panel.wait_ready().unwrap();
        panel.initialize(&bytes).unwrap();
    }

    #[test]
    fn initialize_happens_once() {
        let host = LocalPanelHost::new();
        let mut panel = host.create_context().unwrap();
        let bytes = payload().encode().unwrap();
        panel.wait_ready().unwrap();
        panel.initialize(&bytes).unwrap();
        assert!(matches!(panel.initialize(&bytes), Err(GateError::Host(_))));
    }

    #[test]
    fn uninitialized_panel_is_torn_down_on_drop() {
        let host = LocalPanelHost::new();
        {
            let mut panel = host.create_context().unwrap();
            panel.wait_ready().unwrap();
            assert_eq!(host.len(), 1);
        }
        assert!(host.is_empty());
    }

    #[test]
    fn initialized_panel_stays_open() {
        let host = LocalPanelHost::new();
        let id = {
            let mut panel = host.create_context().unwrap();
            panel.wait_ready().unwrap();
            panel.initialize(&payload().encode().unwrap()).unwrap();
            panel.id()
        };
        let wallet = host.inspect(id, |r| r.session.as_ref().map(|s| s.wallet().to_owned()));
        assert_eq!(wallet.flatten(), Some("w".repeat(32)));
    }

    #[test]
    fn panel_limit_is_enforced() {
        let host = LocalPanelHost::with_max_panels(1);
        let mut first = host.create_context().unwrap();
        first.wait_ready().unwrap();
        first.initialize(&payload().encode().unwrap()).unwrap();
        assert!(matches!(host.create_context(), Err(GateError::Host(_))));
        host.close(first.id());
        assert!(host.create_context().is_ok());
    }

    #[test]
    fn ids_are_unique_and_close_all_empties() {
        let host = LocalPanelHost::new();
        let mut ids = Vec::new();
        for _ in 0..3 {
            let mut panel = host.create_context().unwrap();
            panel.wait_ready().unwrap();
            panel.initialize(&payload().encode().unwrap()).unwrap();
            ids.push(panel.id());
        }
        assert_eq!(host.ids(), ids);
        assert_eq!(host.close_all(), 3);
        assert!(host.is_empty());
    }
}
