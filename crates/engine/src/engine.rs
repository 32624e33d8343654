//! Daily driving loop
//!
//! Per simulated day: the sequencer steps first (emitting lifecycle signals
//! with synchronous delivery), the day's events are forwarded to every
//! process model, then all models compute rates from yesterday's state, then
//! all models integrate. The `terminate` signal is a one-shot flag checked
//! at the end of each day; there is no mid-day cancellation.

use std::cell::Cell;
use std::rc::Rc;

use agrosim_foundation::{Result, SignalBus, SignalEvent, SignalKind, VariableKiosk};
use agrosim_manager::Sequencer;
use chrono::NaiveDate;
use tracing::{info, instrument, trace};

use crate::models::ProcessModel;

/// Single-threaded daily-timestep engine
pub struct Engine {
    bus: SignalBus,
    kiosk: VariableKiosk,
    sequencer: Box<dyn Sequencer>,
    models: Vec<Box<dyn ProcessModel>>,
    day: NaiveDate,
    end_date: NaiveDate,
    flag_terminate: Rc<Cell<bool>>,
    days_run: u32,
}

impl Engine {
    /// Wire the engine to a sequencer, resolving the run's calendar bounds
    /// up front. Fails if the definition has no resolvable end date.
    pub fn new(mut sequencer: Box<dyn Sequencer>, mut bus: SignalBus) -> Result<Self> {
        let flag_terminate = Rc::new(Cell::new(false));
        let flag = Rc::clone(&flag_terminate);
        bus.subscribe(SignalKind::Terminate, Box::new(move |_| flag.set(true)));

        let day = sequencer.start_date();
        let end_date = sequencer.end_date()?;

        Ok(Self {
            bus,
            kiosk: VariableKiosk::new(),
            sequencer,
            models: Vec::new(),
            day,
            end_date,
            flag_terminate,
            days_run: 0,
        })
    }

    /// Add a process model. Models run in registration order within each
    /// phase.
    pub fn add_model(&mut self, model: Box<dyn ProcessModel>) {
        self.models.push(model);
    }

    pub fn kiosk(&self) -> &VariableKiosk {
        &self.kiosk
    }

    pub fn current_day(&self) -> NaiveDate {
        self.day
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    pub fn terminated(&self) -> bool {
        self.flag_terminate.get()
    }

    pub fn ndays_in_crop_cycle(&self) -> u32 {
        self.sequencer.ndays_in_crop_cycle()
    }

    /// Execute one simulated day
    #[instrument(skip(self), fields(day = %self.day))]
    pub fn step_day(&mut self) -> Result<()> {
        trace!("day start");

        // Lifecycle first: the sequencer's signal deliveries complete here.
        self.sequencer.step(self.day, &mut self.bus);

        // Forward the day's lifecycle events to the models the engine owns,
        // before any rate calculation for this day.
        let events = self.bus.drain_log();
        for event in &events {
            for model in self.models.iter_mut() {
                model.on_signal(event, &mut self.kiosk)?;
            }
        }

        // Two-phase: every rate is computed from yesterday's state before
        // any state update is committed anywhere.
        for model in self.models.iter_mut() {
            model.calc_rates(self.day, &mut self.kiosk)?;
        }
        for model in self.models.iter_mut() {
            model.integrate(self.day, &mut self.kiosk)?;
        }

        // Deletion is deferred to the end of the day: consumers of a finished
        // entity's variables still see its final state on the finish day.
        for event in &events {
            let deletes = matches!(
                event,
                SignalEvent::CropFinish { crop_delete: true, .. }
                    | SignalEvent::SiteFinish { site_delete: true, .. }
            );
            if deletes {
                for model in self.models.iter_mut() {
                    model.on_delete(event, &mut self.kiosk)?;
                }
            }
        }

        self.days_run += 1;
        trace!("day complete");
        Ok(())
    }

    /// Run from the sequencer's start date to its end date, or until the
    /// `terminate` signal is raised. Returns the number of days executed.
    pub fn run(&mut self) -> Result<u32> {
        info!(start = %self.day, end = %self.end_date, "run starting");
        loop {
            self.step_day()?;

            if self.flag_terminate.get() {
                info!(day = %self.day, "terminate received");
                break;
            }
            if self.day >= self.end_date {
                info!(day = %self.day, "end date reached");
                break;
            }
            match self.day.succ_opt() {
                Some(next) => self.day = next,
                None => break, // calendar overflow
            }
        }
        info!(days = self.days_run, "run complete");
        Ok(self.days_run)
    }
}
