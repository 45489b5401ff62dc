//! Data-store collaborators consumed by the recommendation engine.

use async_trait::async_trait;

use crate::domain::case::{CaseFilter, CaseId, CaseItem};
use crate::domain::compatibility::CompatibilityMatch;
use crate::domain::gear::{GearId, GearItem};
use crate::errors::ApplicationError;

#[async_trait]
pub trait GearCatalog: Send + Sync {
    async fn find_gear(&self, id: &GearId) -> Result<Option<GearItem>, ApplicationError>;
}

#[async_trait]
pub trait CaseCatalog: Send + Sync {
    async fn find_case(&self, id: &CaseId) -> Result<Option<CaseItem>, ApplicationError>;

    /// Every case satisfying the filter, in a stable order.
    async fn query_cases(&self, filter: &CaseFilter) -> Result<Vec<CaseItem>, ApplicationError>;
}

#[async_trait]
pub trait CompatibilityMatchStore: Send + Sync {
    async fn find_match(
        &self,
        gear_id: &GearId,
        case_id: &CaseId,
    ) -> Result<Option<CompatibilityMatch>, ApplicationError>;

    /// Inserts or updates the record keyed by (gear_id, case_id). `created_at` of an existing
    /// record is preserved.
    async fn upsert_match(
        &self,
        record: CompatibilityMatch,
    ) -> Result<CompatibilityMatch, ApplicationError>;

    async fn list_matches_for_gear(
        &self,
        gear_id: &GearId,
        limit: usize,
    ) -> Result<Vec<CompatibilityMatch>, ApplicationError>;
}
