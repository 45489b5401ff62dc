use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::case::CaseId;
use crate::domain::gear::GearId;

/// Persisted outcome of scoring one (gear, case) pair. Unique per pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompatibilityMatch {
    pub gear_id: GearId,
    pub case_id: CaseId,
    pub score: u8,
    pub explanation: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CompatibilityMatch {
    pub fn new(
        gear_id: GearId,
        case_id: CaseId,
        score: u8,
        explanation: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            gear_id,
            case_id,
            score: score.min(100),
            explanation: explanation.into(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn key(&self) -> (GearId, CaseId) {
        (self.gear_id.clone(), self.case_id.clone())
    }
}
