//! Lifecycle signal bus
//!
//! Named, typed events with synchronous delivery. Handlers run in
//! subscription order and complete before `send` returns. The bus also keeps
//! a log of everything sent since the last drain, so an owning loop can
//! forward lifecycle events to components it holds by value.
//!
//! Execution is strictly single-threaded; handlers are plain `FnMut` closures
//! with no `Send`/`Sync` requirement.

use chrono::NaiveDate;
use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::types::{CropEndType, CropStartType, FinishType};

/// Discriminant for subscribing to one signal by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SignalKind {
    CropStart,
    CropFinish,
    SiteStart,
    SiteFinish,
    Terminate,
}

/// A lifecycle event with its payload
#[derive(Debug, Clone, PartialEq)]
pub enum SignalEvent {
    /// A new crop cycle begins; downstream models allocate their state here
    CropStart {
        day: NaiveDate,
        crop_name: String,
        variety_name: String,
        site_name: Option<String>,
        variation_name: Option<String>,
        crop_start_type: CropStartType,
        crop_end_type: CropEndType,
    },
    /// The active crop cycle ended
    CropFinish {
        day: NaiveDate,
        finish_type: FinishType,
        crop_delete: bool,
    },
    /// The site/soil season begins
    SiteStart {
        day: NaiveDate,
        site_name: String,
        variation_name: String,
    },
    /// The site/soil season ended
    SiteFinish {
        day: Option<NaiveDate>,
        site_delete: bool,
    },
    /// Stop the driving loop; one-shot
    Terminate,
}

impl SignalEvent {
    /// The signal this event belongs to
    pub fn kind(&self) -> SignalKind {
        match self {
            SignalEvent::CropStart { .. } => SignalKind::CropStart,
            SignalEvent::CropFinish { .. } => SignalKind::CropFinish,
            SignalEvent::SiteStart { .. } => SignalKind::SiteStart,
            SignalEvent::SiteFinish { .. } => SignalKind::SiteFinish,
            SignalEvent::Terminate => SignalKind::Terminate,
        }
    }
}

/// Handler invoked synchronously on delivery
pub type SignalHandler = Box<dyn FnMut(&SignalEvent)>;

/// In-process publish/subscribe bus for lifecycle signals
#[derive(Default)]
pub struct SignalBus {
    /// Handlers per signal, in subscription order
    handlers: IndexMap<SignalKind, Vec<SignalHandler>>,
    /// Events sent since the last drain
    log: Vec<SignalEvent>,
}

impl SignalBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a handler to one signal
    pub fn subscribe(&mut self, kind: SignalKind, handler: SignalHandler) {
        trace!(signal = ?kind, "handler subscribed");
        self.handlers.entry(kind).or_default().push(handler);
    }

    /// Send an event. Delivery is synchronous: every subscribed handler has
    /// run by the time this returns.
    pub fn send(&mut self, event: SignalEvent) {
        debug!(signal = ?event.kind(), "signal sent");
        if let Some(handlers) = self.handlers.get_mut(&event.kind()) {
            for handler in handlers.iter_mut() {
                handler(&event);
            }
        }
        self.log.push(event);
    }

    /// Drain the event log (for the driving loop to forward to owned models)
    pub fn drain_log(&mut self) -> Vec<SignalEvent> {
        std::mem::take(&mut self.log)
    }

    /// Events sent since the last drain
    pub fn pending(&self) -> &[SignalEvent] {
        &self.log
    }
}
