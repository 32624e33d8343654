//! Error taxonomy
//!
//! Configuration errors surface at construction/validation time and are never
//! retried; kiosk lookup errors are fatal wiring bugs and propagate as-is.

use chrono::NaiveDate;
use thiserror::Error;

use crate::types::{ModelId, VarId};

/// Workspace result type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the orchestration core
#[derive(Debug, Error)]
pub enum Error {
    #[error("campaigns not sequential: {next} does not follow {previous}")]
    CampaignsNotSequential { previous: NaiveDate, next: NaiveDate },

    #[error("crop '{crop_name}': end date {end} is not after start date {start}")]
    CropWindowInvalid {
        crop_name: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error(
        "crop '{crop_name}': start date {start} outside campaign window \
         [{campaign_start}, {next_campaign_start:?})"
    )]
    CropOutsideCampaign {
        crop_name: String,
        start: NaiveDate,
        campaign_start: NaiveDate,
        next_campaign_start: Option<NaiveDate>,
    },

    #[error("crop '{crop_name}': end type '{end_type}' requires an explicit crop_end_date")]
    MissingCropEndDate { crop_name: String, end_type: String },

    #[error("site '{site_name}': end date {end} is not after start date {start}")]
    SiteWindowInvalid {
        site_name: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error(
        "crop '{crop_name}': cycle [{crop_start}, {crop_end}] extends outside the \
         site season [{site_start}, {site_end}]"
    )]
    CropOutsideSiteSeason {
        crop_name: String,
        crop_start: NaiveDate,
        crop_end: NaiveDate,
        site_start: NaiveDate,
        site_end: NaiveDate,
    },

    #[error("empty agromanagement definition: no campaigns with crop calendars")]
    EmptyAgroManagement,

    #[error("variable not published: {0}")]
    VariableNotFound(VarId),

    #[error("variable '{name}' already registered by '{owner}'")]
    VariableAlreadyRegistered { name: VarId, owner: ModelId },

    #[error("'{owner}' is not the registered publisher of variable '{name}'")]
    NotVariableOwner { name: VarId, owner: ModelId },

    #[error("invalid agromanagement definition: {0}")]
    InvalidDefinition(#[from] serde_json::Error),
}
