//! Single-year sequencer
//!
//! Restricted variant for exactly one site season and at most one crop cycle,
//! drawn from a flat declarative block. There is no campaign switching: both
//! calendars step unconditionally every day, site first.
//!
//! Replacing the active site mid-run is not supported; the crop cycle must
//! fit inside the site season and construction fails otherwise.

use agrosim_foundation::{Error, Result, SignalBus, SignalEvent};
use chrono::NaiveDate;
use tracing::{info, instrument};

use crate::agromanager::Sequencer;
use crate::config::SingleYearSpec;
use crate::crop_calendar::CropCalendar;
use crate::site_calendar::SiteCalendar;

/// Sequencer for one site season with at most one crop cycle
#[derive(Debug)]
pub struct AgroManagerSingleYear {
    site: SiteCalendar,
    crop: Option<CropCalendar>,
}

impl AgroManagerSingleYear {
    pub fn new(spec: &SingleYearSpec, bus: &mut SignalBus) -> Result<Self> {
        let site = SiteCalendar::new(spec.site_calendar.clone());
        site.validate()?;

        let crop = match &spec.crop_calendar {
            Some(cc_spec) => {
                let calendar = CropCalendar::new(cc_spec.clone());
                calendar.validate(site.start_date(), None)?;

                let crop_end = calendar.resolved_end_date()?;
                if crop_end > site.end_date() {
                    return Err(Error::CropOutsideSiteSeason {
                        crop_name: cc_spec.crop_name.clone(),
                        crop_start: calendar.start_date(),
                        crop_end,
                        site_start: site.start_date(),
                        site_end: site.end_date(),
                    });
                }

                calendar.connect(bus);
                Some(calendar)
            }
            None => None,
        };

        info!(
            site = %site.site_name(),
            start = %site.start_date(),
            end = %site.end_date(),
            "single-year agromanager initialized"
        );
        Ok(Self { site, crop })
    }

    pub fn site(&self) -> &SiteCalendar {
        &self.site
    }
}

impl Sequencer for AgroManagerSingleYear {
    fn start_date(&self) -> NaiveDate {
        self.site.start_date()
    }

    fn end_date(&mut self) -> Result<NaiveDate> {
        Ok(self.site.end_date())
    }

    #[instrument(skip(self, bus))]
    fn step(&mut self, day: NaiveDate, bus: &mut SignalBus) {
        let site_finished = self.site.step(day, bus);

        if let Some(calendar) = self.crop.as_mut() {
            calendar.step(day, bus);
        }

        // Exactly one season: its end is the run's end.
        if site_finished {
            info!(%day, "site season over, terminating");
            bus.send(SignalEvent::Terminate);
        }
    }

    fn ndays_in_crop_cycle(&self) -> u32 {
        self.crop.as_ref().map_or(0, CropCalendar::duration)
    }
}
