//! Multi-campaign sequencer
//!
//! Owns the ordered campaign list, advances the active campaign as simulated
//! time passes, resolves the run's overall start and end dates and raises
//! `terminate` when the last cycle finishes with no further campaigns.
//!
//! The current campaign is an index cursor over an immutable sequence; the
//! outgoing campaign's calendar slot is discarded explicitly at the switch.

use std::cell::Cell;
use std::rc::Rc;

use agrosim_foundation::{Error, Result, SignalBus, SignalEvent, SignalKind};
use chrono::NaiveDate;
use tracing::{info, instrument};

use crate::config::AgroManagementSpec;
use crate::crop_calendar::CropCalendar;

/// Common driving-loop interface over both sequencer variants
pub trait Sequencer {
    /// First simulated day of the run
    fn start_date(&self) -> NaiveDate;
    /// Last simulated day of the run; lazily resolved and memoized
    fn end_date(&mut self) -> Result<NaiveDate>;
    /// Advance one simulated day, before any process model runs
    fn step(&mut self, day: NaiveDate, bus: &mut SignalBus);
    /// Days elapsed in the currently active crop cycle, 0 if none
    fn ndays_in_crop_cycle(&self) -> u32;
}

/// Sequencer over an ordered list of campaigns
#[derive(Debug)]
pub struct AgroManager {
    /// Campaign start dates, strictly increasing
    campaign_starts: Vec<NaiveDate>,
    /// Per-campaign calendar; `None` for fallow campaigns and discarded slots
    calendars: Vec<Option<CropCalendar>>,
    /// Index of the currently active campaign
    icampaign: usize,
    /// Memoized run end date
    end: Option<NaiveDate>,
    /// Set by the crop_finish subscription, consumed by `step`. Shared so a
    /// finish raised by another collaborator also reaches the sequencer.
    cycle_finished: Rc<Cell<bool>>,
}

impl AgroManager {
    /// Build and validate the sequencer from a declarative definition.
    ///
    /// Fails fast on non-chronological campaigns or an invalid crop calendar;
    /// there is no partial-success mode.
    pub fn new(spec: &AgroManagementSpec, bus: &mut SignalBus) -> Result<Self> {
        let first = spec
            .campaigns
            .first()
            .map(|c| c.start_date)
            .ok_or(Error::EmptyAgroManagement)?;

        for pair in spec.campaigns.windows(2) {
            if pair[1].start_date <= pair[0].start_date {
                return Err(Error::CampaignsNotSequential {
                    previous: pair[0].start_date,
                    next: pair[1].start_date,
                });
            }
        }

        let mut calendars = Vec::with_capacity(spec.campaigns.len());
        for (i, campaign) in spec.campaigns.iter().enumerate() {
            let next_start = spec.campaigns.get(i + 1).map(|c| c.start_date);

            if campaign.is_empty() {
                calendars.push(None);
                continue;
            }

            match &campaign.crop_calendar {
                Some(cc_spec) => {
                    let calendar = CropCalendar::new(cc_spec.clone());
                    calendar.validate(campaign.start_date, next_start)?;
                    calendar.connect(bus);
                    calendars.push(Some(calendar));
                }
                // Events without a crop: non-fallow campaign, no calendar.
                None => calendars.push(None),
            }
        }

        let cycle_finished = Rc::new(Cell::new(false));
        let flag = Rc::clone(&cycle_finished);
        bus.subscribe(SignalKind::CropFinish, Box::new(move |_| flag.set(true)));

        info!(campaigns = calendars.len(), start = %first, "agromanager initialized");
        Ok(Self {
            campaign_starts: spec.campaigns.iter().map(|c| c.start_date).collect(),
            calendars,
            icampaign: 0,
            end: None,
            cycle_finished,
        })
    }

    /// Start date of the campaign after the active one, if any
    fn next_campaign_start(&self) -> Option<NaiveDate> {
        self.campaign_starts.get(self.icampaign + 1).copied()
    }

    fn resolve_end_date(&self) -> Result<NaiveDate> {
        // A run with zero active cycles has no defined end.
        if self.calendars.iter().all(Option::is_none) {
            return Err(Error::EmptyAgroManagement);
        }

        // A trailing empty campaign pins the end date explicitly.
        if matches!(self.calendars.last(), Some(None)) {
            return self
                .campaign_starts
                .last()
                .copied()
                .ok_or(Error::EmptyAgroManagement);
        }

        // Otherwise the latest calendar end date across all campaigns.
        let mut end: Option<NaiveDate> = None;
        for calendar in self.calendars.iter().flatten() {
            let cc_end = calendar.resolved_end_date()?;
            end = Some(end.map_or(cc_end, |e| e.max(cc_end)));
        }
        end.ok_or(Error::EmptyAgroManagement)
    }
}

impl Sequencer for AgroManager {
    fn start_date(&self) -> NaiveDate {
        // Construction guarantees at least one campaign.
        self.campaign_starts[0]
    }

    fn end_date(&mut self) -> Result<NaiveDate> {
        if let Some(end) = self.end {
            return Ok(end);
        }
        let end = self.resolve_end_date()?;
        self.end = Some(end);
        Ok(end)
    }

    #[instrument(skip(self, bus), fields(campaign = self.icampaign))]
    fn step(&mut self, day: NaiveDate, bus: &mut SignalBus) {
        // Campaign switch: discard the outgoing calendar and activate the new
        // campaign in the same call, with no day gap or overlap.
        if Some(day) == self.next_campaign_start() {
            self.calendars[self.icampaign] = None;
            self.icampaign += 1;
            info!(%day, campaign = self.icampaign, "campaign switched");
        }

        if let Some(calendar) = self.calendars[self.icampaign].as_mut() {
            calendar.step(day, bus);
        }

        // The end of the cycle shuts the run down when no further campaigns
        // are declared. The flag is set by the crop_finish subscription, so a
        // finish raised by another collaborator counts the same as the
        // calendar's own.
        if self.cycle_finished.take() && self.next_campaign_start().is_none() {
            info!(%day, "no further campaigns, terminating");
            bus.send(SignalEvent::Terminate);
        }
    }

    fn ndays_in_crop_cycle(&self) -> u32 {
        self.calendars[self.icampaign]
            .as_ref()
            .map_or(0, CropCalendar::duration)
    }
}
