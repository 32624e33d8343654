//! Site calendar
//!
//! Two-state machine over the site/soil season. The end date is always
//! explicit, so there is no duration-based forced stop.

use agrosim_foundation::{Error, Result, SignalBus, SignalEvent};
use chrono::NaiveDate;
use tracing::info;

use crate::config::SiteCalendarSpec;

/// State machine for one site/soil season
#[derive(Debug)]
pub struct SiteCalendar {
    spec: SiteCalendarSpec,
    /// Elapsed days since the season started
    duration: u32,
    in_site_cycle: bool,
}

impl SiteCalendar {
    pub fn new(spec: SiteCalendarSpec) -> Self {
        Self {
            spec,
            duration: 0,
            in_site_cycle: false,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.spec.site_start_date >= self.spec.site_end_date {
            return Err(Error::SiteWindowInvalid {
                site_name: self.spec.site_name.clone(),
                start: self.spec.site_start_date,
                end: self.spec.site_end_date,
            });
        }
        Ok(())
    }

    pub fn start_date(&self) -> NaiveDate {
        self.spec.site_start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.spec.site_end_date
    }

    pub fn site_name(&self) -> &str {
        &self.spec.site_name
    }

    /// Elapsed days since the season started
    pub fn duration(&self) -> u32 {
        self.duration
    }

    pub fn in_site_cycle(&self) -> bool {
        self.in_site_cycle
    }

    /// Advance the calendar by one day. Returns true when the season ended on
    /// this day.
    pub fn step(&mut self, day: NaiveDate, bus: &mut SignalBus) -> bool {
        if self.in_site_cycle {
            self.duration += 1;
        }

        if day == self.spec.site_start_date {
            self.duration = 0;
            self.in_site_cycle = true;
            info!(
                site = %self.spec.site_name,
                variation = %self.spec.variation_name,
                %day,
                "site season started"
            );
            bus.send(SignalEvent::SiteStart {
                day,
                site_name: self.spec.site_name.clone(),
                variation_name: self.spec.variation_name.clone(),
            });
        }

        if self.in_site_cycle && day == self.spec.site_end_date {
            self.in_site_cycle = false;
            info!(site = %self.spec.site_name, %day, "site season finished");
            bus.send(SignalEvent::SiteFinish {
                day: Some(day),
                site_delete: true,
            });
            return true;
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agrosim_foundation::SignalKind;
    use chrono::Days;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn site_spec() -> SiteCalendarSpec {
        SiteCalendarSpec {
            site_name: "wageningen".into(),
            variation_name: "clay".into(),
            latitude: 51.97,
            longitude: 5.67,
            year: 2001,
            site_start_date: d(2001, 1, 1),
            site_end_date: d(2001, 12, 1),
        }
    }

    #[test]
    fn test_season_start_and_finish() {
        let mut cal = SiteCalendar::new(site_spec());
        let mut bus = SignalBus::new();

        let mut day = d(2001, 1, 1);
        let mut finished_on = None;
        while finished_on.is_none() && day <= d(2002, 1, 1) {
            if cal.step(day, &mut bus) {
                finished_on = Some(day);
            }
            day = day + Days::new(1);
        }

        assert_eq!(finished_on, Some(d(2001, 12, 1)));
        let events = bus.drain_log();
        assert_eq!(events[0].kind(), SignalKind::SiteStart);
        assert_eq!(events[1].kind(), SignalKind::SiteFinish);
        assert_eq!(events.len(), 2);
        assert_eq!(cal.duration(), 334);
    }

    #[test]
    fn test_validate_rejects_end_before_start() {
        let mut spec = site_spec();
        spec.site_end_date = d(2001, 1, 1);
        let cal = SiteCalendar::new(spec);
        let err = cal.validate().unwrap_err();
        assert!(matches!(err, Error::SiteWindowInvalid { .. }));
    }
}
