use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::case::CaseId;
use crate::domain::gear::GearId;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeedbackId(pub String);

impl fmt::Display for FeedbackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A user rating of how well a case served a piece of gear.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub id: FeedbackId,
    pub gear_id: GearId,
    pub case_id: CaseId,
    pub user_id: Option<String>,
    pub rating: u8,
    pub fit_accuracy: Option<u8>,
    pub protection_quality: Option<u8>,
    pub value_rating: Option<u8>,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Unvalidated submission as received from the request layer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackSubmission {
    pub gear_id: String,
    pub case_id: String,
    pub user_id: Option<String>,
    pub rating: Option<i64>,
    pub fit_accuracy: Option<i64>,
    pub protection_quality: Option<i64>,
    pub value_rating: Option<i64>,
    pub comment: Option<String>,
}

/// Edit applied to an existing record; `None` leaves a field untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackUpdate {
    pub rating: Option<i64>,
    pub fit_accuracy: Option<i64>,
    pub protection_quality: Option<i64>,
    pub value_rating: Option<i64>,
    pub comment: Option<String>,
}

/// Mean community rating. `NoData` is distinct from any numeric average.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AverageRating {
    NoData,
    Rated { average: f64, count: u32 },
}

impl AverageRating {
    pub fn from_ratings<I>(ratings: I) -> Self
    where
        I: IntoIterator<Item = u8>,
    {
        let (sum, count) =
            ratings.into_iter().fold((0u64, 0u32), |(sum, count), r| (sum + r as u64, count + 1));
        if count == 0 {
            Self::NoData
        } else {
            Self::Rated { average: sum as f64 / count as f64, count }
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Self::NoData => None,
            Self::Rated { average, .. } => Some(*average),
        }
    }

    pub fn count(&self) -> u32 {
        match self {
            Self::NoData => 0,
            Self::Rated { count, .. } => *count,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TopRatedMatch {
    pub case_id: CaseId,
    pub average_rating: f64,
    pub review_count: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeedbackSummary {
    pub gear_id: GearId,
    pub case_id: CaseId,
    pub overall: AverageRating,
    pub fit_accuracy: AverageRating,
    pub protection_quality: AverageRating,
    pub value_rating: AverageRating,
    /// Count of ratings 1 through 5, indexed from zero.
    pub distribution: [u32; 5],
}
