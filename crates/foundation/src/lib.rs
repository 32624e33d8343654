//! Agrosim foundation
//!
//! Shared building blocks for the temporal orchestration core: identifier
//! newtypes, the lifecycle signal bus and the shared variable kiosk.

pub mod error;
pub mod kiosk;
pub mod signal;
pub mod types;

pub use error::{Error, Result};
pub use kiosk::VariableKiosk;
pub use signal::{SignalBus, SignalEvent, SignalKind};
pub use types::*;
