//! Declarative agromanagement definitions
//!
//! Plain immutable value structs, deserialized once from an external loader's
//! output and validated at sequencer construction. Timed and state event
//! blocks are pass-through payloads for downstream dispatchers; only their
//! presence matters here (it makes a campaign non-fallow).

use agrosim_foundation::{CropEndType, CropStartType, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One crop cycle within a campaign
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropCalendarSpec {
    pub crop_name: String,
    pub variety_name: String,
    #[serde(default)]
    pub site_name: Option<String>,
    #[serde(default)]
    pub variation_name: Option<String>,
    pub crop_start_date: NaiveDate,
    pub crop_start_type: CropStartType,
    #[serde(default)]
    pub crop_end_date: Option<NaiveDate>,
    pub crop_end_type: CropEndType,
    /// Maximum cycle length in days; forces termination when reached
    pub max_duration: u32,
}

/// One site/soil season (single-year variant)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteCalendarSpec {
    pub site_name: String,
    pub variation_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub year: i32,
    pub site_start_date: NaiveDate,
    pub site_end_date: NaiveDate,
}

/// One calendar-anchored agromanagement period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignSpec {
    pub start_date: NaiveDate,
    #[serde(default)]
    pub crop_calendar: Option<CropCalendarSpec>,
    /// Pass-through payloads for the timed event dispatcher
    #[serde(default)]
    pub timed_events: Vec<serde_json::Value>,
    /// Pass-through payloads for the state event dispatcher
    #[serde(default)]
    pub state_events: Vec<serde_json::Value>,
}

impl CampaignSpec {
    /// A fallow campaign: no crop calendar and no events, bare soil only
    pub fn is_empty(&self) -> bool {
        self.crop_calendar.is_none() && self.timed_events.is_empty() && self.state_events.is_empty()
    }
}

/// The full multi-campaign definition, in declaration order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgroManagementSpec {
    pub campaigns: Vec<CampaignSpec>,
}

impl AgroManagementSpec {
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Flat site + crop block for the single-year variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleYearSpec {
    pub site_calendar: SiteCalendarSpec,
    #[serde(default)]
    pub crop_calendar: Option<CropCalendarSpec>,
}

impl SingleYearSpec {
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}
