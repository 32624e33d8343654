//! Agrosim manager
//!
//! Campaign sequencing and entity calendars: the per-day state machines that
//! decide which crop or site season is active and which lifecycle signals are
//! raised to the rest of the simulation.

pub mod agromanager;
pub mod config;
pub mod crop_calendar;
pub mod single_year;
pub mod site_calendar;

pub use agromanager::{AgroManager, Sequencer};
pub use config::{
    AgroManagementSpec, CampaignSpec, CropCalendarSpec, SingleYearSpec, SiteCalendarSpec,
};
pub use crop_calendar::CropCalendar;
pub use single_year::AgroManagerSingleYear;
pub use site_calendar::SiteCalendar;
