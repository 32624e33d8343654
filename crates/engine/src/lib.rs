//! Agrosim engine
//!
//! The daily driving loop and the two-phase process model contract:
//! lifecycle signals are delivered first, then all rates are computed from
//! yesterday's state, then all state updates are committed.

pub mod engine;
pub mod models;

pub use engine::Engine;
pub use models::{CanopyGrowth, ProcessModel, SiteWaterBucket};
