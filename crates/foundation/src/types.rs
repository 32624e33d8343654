//! Core shared types
//!
//! Identifier newtypes and the lifecycle vocabulary used in signal payloads
//! and campaign definitions.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Unique identifier for a kiosk variable
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(pub String);

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for VarId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Unique identifier for a process model (the publisher of kiosk variables)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelId(pub String);

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ModelId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// How a crop cycle begins
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CropStartType {
    Sowing,
    Emergence,
}

impl fmt::Display for CropStartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CropStartType::Sowing => write!(f, "sowing"),
            CropStartType::Emergence => write!(f, "emergence"),
        }
    }
}

/// How a crop cycle is scheduled to end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CropEndType {
    /// Run until physiological maturity, bounded by `max_duration`
    Maturity,
    /// End on the declared harvest date
    Harvest,
    /// End on the declared date or earlier
    Earliest,
}

impl CropEndType {
    /// Whether this end type carries an explicit calendar end date
    pub fn is_date_based(&self) -> bool {
        matches!(self, CropEndType::Harvest | CropEndType::Earliest)
    }
}

impl fmt::Display for CropEndType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CropEndType::Maturity => write!(f, "maturity"),
            CropEndType::Harvest => write!(f, "harvest"),
            CropEndType::Earliest => write!(f, "earliest"),
        }
    }
}

/// Why a crop cycle actually finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishType {
    /// The declared end date was reached
    Harvest,
    /// The cycle hit its maximum duration
    MaxDuration,
}

impl fmt::Display for FinishType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FinishType::Harvest => write!(f, "harvest"),
            FinishType::MaxDuration => write!(f, "max_duration"),
        }
    }
}

/// Runtime value stored in the variable kiosk
///
/// Process models mostly exchange scalar rates and states; dates and counters
/// show up for bookkeeping variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Scalar(f64),
    Count(u32),
    Date(NaiveDate),
}

impl Value {
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Value::Scalar(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_count(&self) -> Option<u32> {
        match self {
            Value::Count(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(v) => Some(*v),
            _ => None,
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Scalar(0.0)
    }
}

/// Returns true if `start <= day`, additionally requiring `day < end` when an
/// end is given.
pub fn in_date_range(day: NaiveDate, start: NaiveDate, end: Option<NaiveDate>) -> bool {
    match end {
        Some(end) => start <= day && day < end,
        None => start <= day,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_date_range_half_open() {
        let start = d(2000, 1, 1);
        let end = d(2000, 2, 1);

        assert!(in_date_range(start, start, Some(end)));
        assert!(in_date_range(d(2000, 1, 31), start, Some(end)));
        assert!(!in_date_range(end, start, Some(end)));
        assert!(!in_date_range(d(1999, 12, 31), start, Some(end)));
    }

    #[test]
    fn test_date_range_open_ended() {
        let start = d(2000, 1, 1);
        assert!(in_date_range(d(2050, 1, 1), start, None));
        assert!(!in_date_range(d(1999, 12, 31), start, None));
    }

    #[test]
    fn test_end_type_date_based() {
        assert!(CropEndType::Harvest.is_date_based());
        assert!(CropEndType::Earliest.is_date_based());
        assert!(!CropEndType::Maturity.is_date_based());
    }
}
