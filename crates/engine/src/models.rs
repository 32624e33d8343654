//! Process models
//!
//! The `ProcessModel` trait is the contract between the orchestration core
//! and the physiological models: react to lifecycle signals, compute rates
//! from yesterday's state, then integrate. Two small built-in models
//! exercise the contract; real crop/soil models live elsewhere and plug in
//! the same way.

use agrosim_foundation::{ModelId, Result, SignalEvent, Value, VarId, VariableKiosk};
use chrono::NaiveDate;
use tracing::debug;

/// A daily-timestep process model driven by the engine
pub trait ProcessModel {
    fn id(&self) -> ModelId;

    /// React to a lifecycle signal. Called for every signal raised on the
    /// current day, before any rate calculation for that day.
    fn on_signal(&mut self, event: &SignalEvent, kiosk: &mut VariableKiosk) -> Result<()> {
        let _ = (event, kiosk);
        Ok(())
    }

    /// Handle a deletion-flagged finish signal. Called at the end of the day,
    /// after `integrate`, so consumers still see the entity's final published
    /// state on its finish day; kiosk claims are released here.
    fn on_delete(&mut self, event: &SignalEvent, kiosk: &mut VariableKiosk) -> Result<()> {
        let _ = (event, kiosk);
        Ok(())
    }

    /// Compute today's rates from yesterday's state. Must not commit state.
    fn calc_rates(&mut self, day: NaiveDate, kiosk: &mut VariableKiosk) -> Result<()>;

    /// Commit today's state from the rates computed in `calc_rates`.
    fn integrate(&mut self, day: NaiveDate, kiosk: &mut VariableKiosk) -> Result<()>;
}

/// Logistic above-ground growth tracker
///
/// Allocates its state when a crop cycle starts, grows toward a fixed
/// capacity, and releases its kiosk claims when the cycle finishes with
/// `crop_delete` set.
pub struct CanopyGrowth {
    id: ModelId,
    /// Relative growth rate per day
    rgr: f64,
    /// Biomass ceiling
    capacity: f64,
    biomass: f64,
    rate: f64,
    active: bool,
}

impl CanopyGrowth {
    pub const BIOMASS: &'static str = "canopy.biomass";
    pub const GROWTH_RATE: &'static str = "canopy.growth_rate";

    pub fn new() -> Self {
        Self {
            id: "canopy".into(),
            rgr: 0.08,
            capacity: 20_000.0,
            biomass: 0.0,
            rate: 0.0,
            active: false,
        }
    }

    pub fn biomass(&self) -> f64 {
        self.biomass
    }
}

impl Default for CanopyGrowth {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessModel for CanopyGrowth {
    fn id(&self) -> ModelId {
        self.id.clone()
    }

    fn on_signal(&mut self, event: &SignalEvent, kiosk: &mut VariableKiosk) -> Result<()> {
        match event {
            SignalEvent::CropStart { day, crop_name, .. } => {
                debug!(model = %self.id, crop = %crop_name, %day, "allocating canopy state");
                self.biomass = 50.0; // seed biomass
                self.rate = 0.0;
                self.active = true;
                kiosk.register(&self.id, VarId::from(Self::BIOMASS))?;
                kiosk.register(&self.id, VarId::from(Self::GROWTH_RATE))?;
                kiosk.publish(&self.id, &VarId::from(Self::BIOMASS), Value::Scalar(self.biomass))?;
            }
            SignalEvent::CropFinish { .. } => {
                self.active = false;
            }
            _ => {}
        }
        Ok(())
    }

    fn on_delete(&mut self, event: &SignalEvent, kiosk: &mut VariableKiosk) -> Result<()> {
        if matches!(event, SignalEvent::CropFinish { crop_delete: true, .. }) {
            kiosk.release_owner(&self.id);
        }
        Ok(())
    }

    fn calc_rates(&mut self, _day: NaiveDate, kiosk: &mut VariableKiosk) -> Result<()> {
        if !self.active {
            return Ok(());
        }
        self.rate = self.rgr * self.biomass * (1.0 - self.biomass / self.capacity);
        kiosk.publish(&self.id, &VarId::from(Self::GROWTH_RATE), Value::Scalar(self.rate))
    }

    fn integrate(&mut self, _day: NaiveDate, kiosk: &mut VariableKiosk) -> Result<()> {
        if !self.active {
            return Ok(());
        }
        self.biomass += self.rate;
        kiosk.publish(&self.id, &VarId::from(Self::BIOMASS), Value::Scalar(self.biomass))
    }
}

/// Single-bucket soil water balance for the site season
///
/// Active between `site_start` and `site_finish`. A fixed daily recharge and
/// a storage-proportional loss keep the bucket deterministic; real weather
/// coupling is a loader concern, not an orchestration one.
pub struct SiteWaterBucket {
    id: ModelId,
    recharge: f64,
    loss_coefficient: f64,
    moisture: f64,
    rate: f64,
    active: bool,
}

impl SiteWaterBucket {
    pub const MOISTURE: &'static str = "soil.moisture";

    pub fn new() -> Self {
        Self {
            id: "soil-water".into(),
            recharge: 2.0,
            loss_coefficient: 0.04,
            moisture: 0.0,
            rate: 0.0,
            active: false,
        }
    }

    pub fn moisture(&self) -> f64 {
        self.moisture
    }
}

impl Default for SiteWaterBucket {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessModel for SiteWaterBucket {
    fn id(&self) -> ModelId {
        self.id.clone()
    }

    fn on_signal(&mut self, event: &SignalEvent, kiosk: &mut VariableKiosk) -> Result<()> {
        match event {
            SignalEvent::SiteStart { day, site_name, .. } => {
                debug!(model = %self.id, site = %site_name, %day, "allocating water bucket");
                self.moisture = 30.0;
                self.rate = 0.0;
                self.active = true;
                kiosk.register(&self.id, VarId::from(Self::MOISTURE))?;
                kiosk.publish(&self.id, &VarId::from(Self::MOISTURE), Value::Scalar(self.moisture))?;
            }
            SignalEvent::SiteFinish { .. } => {
                self.active = false;
            }
            _ => {}
        }
        Ok(())
    }

    fn on_delete(&mut self, event: &SignalEvent, kiosk: &mut VariableKiosk) -> Result<()> {
        if matches!(event, SignalEvent::SiteFinish { site_delete: true, .. }) {
            kiosk.release_owner(&self.id);
        }
        Ok(())
    }

    fn calc_rates(&mut self, _day: NaiveDate, _kiosk: &mut VariableKiosk) -> Result<()> {
        if !self.active {
            return Ok(());
        }
        self.rate = self.recharge - self.loss_coefficient * self.moisture;
        Ok(())
    }

    fn integrate(&mut self, _day: NaiveDate, kiosk: &mut VariableKiosk) -> Result<()> {
        if !self.active {
            return Ok(());
        }
        self.moisture = (self.moisture + self.rate).max(0.0);
        kiosk.publish(&self.id, &VarId::from(Self::MOISTURE), Value::Scalar(self.moisture))
    }
}
