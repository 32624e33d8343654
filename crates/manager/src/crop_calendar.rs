//! Crop calendar
//!
//! Per-cycle state machine over the crop's start and stop dates. Dormant
//! until `crop_start_date`, active until a date-based or duration-based stop
//! condition fires, then dormant again; the owning sequencer discards the
//! instance when its campaign ends.

use std::cell::Cell;
use std::rc::Rc;

use agrosim_foundation::{
    in_date_range, Error, FinishType, Result, SignalBus, SignalEvent, SignalKind,
};
use chrono::{Days, NaiveDate};
use tracing::info;

use crate::config::CropCalendarSpec;

/// State machine for one crop cycle
#[derive(Debug)]
pub struct CropCalendar {
    spec: CropCalendarSpec,
    /// Elapsed days since the cycle started
    duration: u32,
    /// Shared so the crop_finish subscription can clear it independently
    in_crop_cycle: Rc<Cell<bool>>,
}

impl CropCalendar {
    pub fn new(spec: CropCalendarSpec) -> Self {
        Self {
            spec,
            duration: 0,
            in_crop_cycle: Rc::new(Cell::new(false)),
        }
    }

    /// Subscribe the calendar's own crop_finish handler. Other collaborators
    /// react to the same signal, so clearing the cycle flag here must be
    /// idempotent with the clearing done at emission.
    pub fn connect(&self, bus: &mut SignalBus) {
        let flag = Rc::clone(&self.in_crop_cycle);
        bus.subscribe(SignalKind::CropFinish, Box::new(move |_| flag.set(false)));
    }

    /// Validate the cycle internally and against its campaign window
    pub fn validate(
        &self,
        campaign_start: NaiveDate,
        next_campaign_start: Option<NaiveDate>,
    ) -> Result<()> {
        let end = self.resolved_end_date()?;
        if self.spec.crop_start_date >= end {
            return Err(Error::CropWindowInvalid {
                crop_name: self.spec.crop_name.clone(),
                start: self.spec.crop_start_date,
                end,
            });
        }

        if !in_date_range(self.spec.crop_start_date, campaign_start, next_campaign_start) {
            return Err(Error::CropOutsideCampaign {
                crop_name: self.spec.crop_name.clone(),
                start: self.spec.crop_start_date,
                campaign_start,
                next_campaign_start,
            });
        }
        Ok(())
    }

    /// The cycle's end date: the declared date for date-based end types, else
    /// `crop_start_date + max_duration`. Used to resolve an implicit run end.
    pub fn resolved_end_date(&self) -> Result<NaiveDate> {
        if self.spec.crop_end_type.is_date_based() {
            self.spec
                .crop_end_date
                .ok_or_else(|| Error::MissingCropEndDate {
                    crop_name: self.spec.crop_name.clone(),
                    end_type: self.spec.crop_end_type.to_string(),
                })
        } else {
            Ok(self
                .spec
                .crop_start_date
                .checked_add_days(Days::new(u64::from(self.spec.max_duration)))
                .unwrap_or(NaiveDate::MAX))
        }
    }

    pub fn start_date(&self) -> NaiveDate {
        self.spec.crop_start_date
    }

    /// Elapsed days since the cycle started
    pub fn duration(&self) -> u32 {
        self.duration
    }

    pub fn in_crop_cycle(&self) -> bool {
        self.in_crop_cycle.get()
    }

    /// Advance the calendar by one day, emitting lifecycle signals as the
    /// cycle starts or stops. Returns the finish reason when the cycle ended
    /// on this day.
    pub fn step(&mut self, day: NaiveDate, bus: &mut SignalBus) -> Option<FinishType> {
        // Increment before evaluating stop conditions, so a cycle counts its
        // max_duration inclusively.
        if self.in_crop_cycle.get() {
            self.duration += 1;
        }

        if day == self.spec.crop_start_date {
            self.duration = 0;
            self.in_crop_cycle.set(true);
            info!(
                crop = %self.spec.crop_name,
                variety = %self.spec.variety_name,
                %day,
                "crop cycle started"
            );
            bus.send(SignalEvent::CropStart {
                day,
                crop_name: self.spec.crop_name.clone(),
                variety_name: self.spec.variety_name.clone(),
                site_name: self.spec.site_name.clone(),
                variation_name: self.spec.variation_name.clone(),
                crop_start_type: self.spec.crop_start_type,
                crop_end_type: self.spec.crop_end_type,
            });
        }

        let mut finish_type = None;
        if self.in_crop_cycle.get() {
            if self.spec.crop_end_type.is_date_based() && Some(day) == self.spec.crop_end_date {
                finish_type = Some(FinishType::Harvest);
            }
            // A same-day max_duration stop overrides the harvest reason.
            if self.duration == self.spec.max_duration {
                finish_type = Some(FinishType::MaxDuration);
            }
        }

        if let Some(finish) = finish_type {
            self.in_crop_cycle.set(false);
            info!(
                crop = %self.spec.crop_name,
                %day,
                finish = %finish,
                "crop cycle finished"
            );
            bus.send(SignalEvent::CropFinish {
                day,
                finish_type: finish,
                crop_delete: true,
            });
        }

        finish_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agrosim_foundation::{CropEndType, CropStartType};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn wheat_spec() -> CropCalendarSpec {
        CropCalendarSpec {
            crop_name: "wheat".into(),
            variety_name: "winter-wheat".into(),
            site_name: None,
            variation_name: None,
            crop_start_date: d(1999, 9, 15),
            crop_start_type: CropStartType::Sowing,
            crop_end_date: None,
            crop_end_type: CropEndType::Maturity,
            max_duration: 300,
        }
    }

    /// Run the calendar over consecutive days, returning emitted events.
    fn run_days(cal: &mut CropCalendar, from: NaiveDate, n: u64) -> Vec<SignalEvent> {
        let mut bus = SignalBus::new();
        cal.connect(&mut bus);
        for offset in 0..n {
            let day = from.checked_add_days(Days::new(offset)).unwrap();
            cal.step(day, &mut bus);
        }
        bus.drain_log()
    }

    #[test]
    fn test_crop_start_emitted_exactly_once() {
        let mut cal = CropCalendar::new(wheat_spec());
        let events = run_days(&mut cal, d(1999, 9, 1), 60);

        let starts: Vec<_> = events
            .iter()
            .filter(|e| e.kind() == SignalKind::CropStart)
            .collect();
        assert_eq!(starts.len(), 1);
        match starts[0] {
            SignalEvent::CropStart { day, crop_name, .. } => {
                assert_eq!(*day, d(1999, 9, 15));
                assert_eq!(crop_name, "wheat");
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_duration_counts_days_since_start() {
        let mut cal = CropCalendar::new(wheat_spec());
        let mut bus = SignalBus::new();

        cal.step(d(1999, 9, 15), &mut bus);
        assert_eq!(cal.duration(), 0);
        assert!(cal.in_crop_cycle());

        for offset in 1..=10u64 {
            cal.step(d(1999, 9, 15) + Days::new(offset), &mut bus);
        }
        assert_eq!(cal.duration(), 10);
    }

    #[test]
    fn test_forced_stop_at_max_duration() {
        let mut spec = wheat_spec();
        spec.max_duration = 5;
        let mut cal = CropCalendar::new(spec);
        let mut bus = SignalBus::new();

        cal.step(d(1999, 9, 15), &mut bus);
        for offset in 1..=4u64 {
            assert!(cal.step(d(1999, 9, 15) + Days::new(offset), &mut bus).is_none());
        }
        let finish = cal.step(d(1999, 9, 20), &mut bus);
        assert_eq!(finish, Some(FinishType::MaxDuration));
        assert!(!cal.in_crop_cycle());
    }

    #[test]
    fn test_harvest_stop_on_declared_end_date() {
        let mut spec = wheat_spec();
        spec.crop_end_type = CropEndType::Harvest;
        spec.crop_end_date = Some(d(1999, 9, 25));
        let mut cal = CropCalendar::new(spec);
        let mut bus = SignalBus::new();

        cal.step(d(1999, 9, 15), &mut bus);
        let mut finish = None;
        for offset in 1..=15u64 {
            if let Some(f) = cal.step(d(1999, 9, 15) + Days::new(offset), &mut bus) {
                finish = Some((f, d(1999, 9, 15) + Days::new(offset)));
                break;
            }
        }
        assert_eq!(finish, Some((FinishType::Harvest, d(1999, 9, 25))));
    }

    #[test]
    fn test_max_duration_overrides_same_day_harvest() {
        let mut spec = wheat_spec();
        spec.crop_end_type = CropEndType::Harvest;
        spec.crop_end_date = Some(d(1999, 9, 20));
        spec.max_duration = 5;
        let mut cal = CropCalendar::new(spec);
        let mut bus = SignalBus::new();

        cal.step(d(1999, 9, 15), &mut bus);
        for offset in 1..=4u64 {
            cal.step(d(1999, 9, 15) + Days::new(offset), &mut bus);
        }
        // Day 5: both the harvest date and max_duration are hit.
        let finish = cal.step(d(1999, 9, 20), &mut bus);
        assert_eq!(finish, Some(FinishType::MaxDuration));
    }

    #[test]
    fn test_end_date_maturity_uses_max_duration() {
        let cal = CropCalendar::new(wheat_spec());
        assert_eq!(cal.resolved_end_date().unwrap(), d(2000, 7, 11));
    }

    #[test]
    fn test_end_date_harvest_ignores_max_duration() {
        let mut spec = wheat_spec();
        spec.crop_end_type = CropEndType::Harvest;
        spec.crop_end_date = Some(d(2000, 8, 5));
        spec.max_duration = 10;
        let cal = CropCalendar::new(spec);
        assert_eq!(cal.resolved_end_date().unwrap(), d(2000, 8, 5));
    }

    #[test]
    fn test_validate_rejects_end_before_start() {
        let mut spec = wheat_spec();
        spec.crop_end_type = CropEndType::Harvest;
        spec.crop_end_date = Some(d(1999, 9, 15));
        let cal = CropCalendar::new(spec);

        let err = cal.validate(d(1999, 8, 1), None).unwrap_err();
        assert!(matches!(err, Error::CropWindowInvalid { .. }));
    }

    #[test]
    fn test_validate_rejects_start_outside_campaign() {
        let cal = CropCalendar::new(wheat_spec());
        let err = cal
            .validate(d(1999, 10, 1), Some(d(2000, 9, 1)))
            .unwrap_err();
        assert!(matches!(err, Error::CropOutsideCampaign { .. }));
    }

    #[test]
    fn test_validate_requires_end_date_for_harvest() {
        let mut spec = wheat_spec();
        spec.crop_end_type = CropEndType::Harvest;
        spec.crop_end_date = None;
        let cal = CropCalendar::new(spec);

        let err = cal.validate(d(1999, 8, 1), None).unwrap_err();
        assert!(matches!(err, Error::MissingCropEndDate { .. }));
    }

    #[test]
    fn test_external_crop_finish_clears_cycle_flag() {
        let mut cal = CropCalendar::new(wheat_spec());
        let mut bus = SignalBus::new();
        cal.connect(&mut bus);

        cal.step(d(1999, 9, 15), &mut bus);
        assert!(cal.in_crop_cycle());

        // Another collaborator ends the cycle, e.g. an early-harvest action.
        bus.send(SignalEvent::CropFinish {
            day: d(1999, 10, 1),
            finish_type: FinishType::Harvest,
            crop_delete: true,
        });
        assert!(!cal.in_crop_cycle());
    }
}
