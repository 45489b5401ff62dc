//! Community feedback on (gear, case) pairs.
//!
//! Ratings are an independent signal: nothing here feeds back into the computed
//! compatibility score.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::domain::case::CaseId;
use crate::domain::feedback::{
    AverageRating, FeedbackId, FeedbackRecord, FeedbackSubmission, FeedbackSummary, FeedbackUpdate,
    TopRatedMatch,
};
use crate::domain::gear::GearId;
use crate::errors::{ApplicationError, DomainError};
use crate::matching::CaseMatch;

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;

#[async_trait]
pub trait FeedbackStore: Send + Sync {
    async fn insert(&self, record: FeedbackRecord) -> Result<FeedbackRecord, ApplicationError>;

    async fn find_by_id(&self, id: &FeedbackId) -> Result<Option<FeedbackRecord>, ApplicationError>;

    async fn list_for_match(
        &self,
        gear_id: &GearId,
        case_id: &CaseId,
    ) -> Result<Vec<FeedbackRecord>, ApplicationError>;

    async fn list_for_gear(&self, gear_id: &GearId) -> Result<Vec<FeedbackRecord>, ApplicationError>;

    /// Replaces the stored record with the same id. `false` when no such record exists.
    async fn update(&self, record: FeedbackRecord) -> Result<bool, ApplicationError>;

    async fn delete(&self, id: &FeedbackId) -> Result<bool, ApplicationError>;
}

/// A scored case annotated with its community rating.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedMatch {
    #[serde(flatten)]
    pub scored: CaseMatch,
    pub community_rating: AverageRating,
}

pub struct FeedbackManager {
    store: Arc<dyn FeedbackStore>,
    clock: Arc<dyn Clock>,
}

impl FeedbackManager {
    pub fn new(store: Arc<dyn FeedbackStore>) -> Self {
        Self { store, clock: Arc::new(SystemClock) }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub async fn submit_feedback(
        &self,
        submission: FeedbackSubmission,
    ) -> Result<FeedbackRecord, ApplicationError> {
        let gear_id = required_id("gear_id", &submission.gear_id)?;
        let case_id = required_id("case_id", &submission.case_id)?;
        let rating = match submission.rating {
            Some(value) => checked_rating("rating", value)?,
            None => return Err(DomainError::validation("rating is required").into()),
        };

        let record = FeedbackRecord {
            id: FeedbackId(Uuid::new_v4().to_string()),
            gear_id: GearId(gear_id),
            case_id: CaseId(case_id),
            user_id: clean_text(submission.user_id),
            rating,
            fit_accuracy: optional_rating("fit_accuracy", submission.fit_accuracy)?,
            protection_quality: optional_rating("protection_quality", submission.protection_quality)?,
            value_rating: optional_rating("value_rating", submission.value_rating)?,
            comment: clean_text(submission.comment),
            created_at: self.clock.now(),
            updated_at: None,
        };

        let stored = self.store.insert(record).await?;
        info!(
            event_name = "feedback.submitted",
            feedback_id = %stored.id,
            gear_id = %stored.gear_id,
            case_id = %stored.case_id,
            rating = stored.rating,
            "feedback recorded"
        );
        Ok(stored)
    }

    /// All feedback for the pair, newest first.
    pub async fn get_feedback_for_match(
        &self,
        gear_id: &GearId,
        case_id: &CaseId,
    ) -> Result<Vec<FeedbackRecord>, ApplicationError> {
        let mut records = self.store.list_for_match(gear_id, case_id).await?;
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.0.cmp(&a.id.0)));
        Ok(records)
    }

    pub async fn get_average_rating_for_match(
        &self,
        gear_id: &GearId,
        case_id: &CaseId,
    ) -> Result<AverageRating, ApplicationError> {
        let records = self.store.list_for_match(gear_id, case_id).await?;
        Ok(AverageRating::from_ratings(records.iter().map(|record| record.rating)))
    }

    /// Cases with the highest mean rating for the gear; ties go to the case with more reviews.
    pub async fn get_top_rated_matches_for_gear(
        &self,
        gear_id: &GearId,
        limit: usize,
    ) -> Result<Vec<TopRatedMatch>, ApplicationError> {
        let records = self.store.list_for_gear(gear_id).await?;

        let mut top: Vec<TopRatedMatch> = group_by_case(&records)
            .into_iter()
            .filter_map(|(case_id, ratings)| match AverageRating::from_ratings(ratings) {
                AverageRating::Rated { average, count } => {
                    Some(TopRatedMatch { case_id, average_rating: average, review_count: count })
                }
                AverageRating::NoData => None,
            })
            .collect();

        top.sort_by(|a, b| {
            b.average_rating
                .total_cmp(&a.average_rating)
                .then_with(|| b.review_count.cmp(&a.review_count))
                .then_with(|| a.case_id.0.cmp(&b.case_id.0))
        });
        top.truncate(limit);
        Ok(top)
    }

    pub async fn update_feedback(
        &self,
        id: &FeedbackId,
        update: FeedbackUpdate,
    ) -> Result<FeedbackRecord, ApplicationError> {
        let mut record = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("feedback", id.0.clone()))?;

        if let Some(rating) = update.rating {
            record.rating = checked_rating("rating", rating)?;
        }
        if update.fit_accuracy.is_some() {
            record.fit_accuracy = optional_rating("fit_accuracy", update.fit_accuracy)?;
        }
        if update.protection_quality.is_some() {
            record.protection_quality =
                optional_rating("protection_quality", update.protection_quality)?;
        }
        if update.value_rating.is_some() {
            record.value_rating = optional_rating("value_rating", update.value_rating)?;
        }
        if update.comment.is_some() {
            record.comment = clean_text(update.comment);
        }
        record.updated_at = Some(self.clock.now());

        if !self.store.update(record.clone()).await? {
            return Err(DomainError::not_found("feedback", id.0.clone()).into());
        }

        info!(event_name = "feedback.updated", feedback_id = %id, "feedback updated");
        Ok(record)
    }

    pub async fn delete_feedback(&self, id: &FeedbackId) -> Result<(), ApplicationError> {
        if !self.store.delete(id).await? {
            return Err(DomainError::not_found("feedback", id.0.clone()).into());
        }
        info!(event_name = "feedback.deleted", feedback_id = %id, "feedback deleted");
        Ok(())
    }

    pub async fn feedback_summary(
        &self,
        gear_id: &GearId,
        case_id: &CaseId,
    ) -> Result<FeedbackSummary, ApplicationError> {
        let records = self.store.list_for_match(gear_id, case_id).await?;

        let mut distribution = [0u32; 5];
        for record in &records {
            if let Some(slot) = distribution.get_mut(usize::from(record.rating).saturating_sub(1)) {
                *slot += 1;
            }
        }

        Ok(FeedbackSummary {
            gear_id: gear_id.clone(),
            case_id: case_id.clone(),
            overall: AverageRating::from_ratings(records.iter().map(|record| record.rating)),
            fit_accuracy: AverageRating::from_ratings(records.iter().filter_map(|r| r.fit_accuracy)),
            protection_quality: AverageRating::from_ratings(
                records.iter().filter_map(|r| r.protection_quality),
            ),
            value_rating: AverageRating::from_ratings(records.iter().filter_map(|r| r.value_rating)),
            distribution,
        })
    }

    /// Attaches each case's community rating. Order and scores are left untouched.
    pub async fn annotate_matches(
        &self,
        gear_id: &GearId,
        matches: Vec<CaseMatch>,
    ) -> Result<Vec<AnnotatedMatch>, ApplicationError> {
        let records = self.store.list_for_gear(gear_id).await?;
        let mut by_case = group_by_case(&records);

        Ok(matches
            .into_iter()
            .map(|scored| {
                let ratings = by_case.remove(&scored.case.id).unwrap_or_default();
                AnnotatedMatch { community_rating: AverageRating::from_ratings(ratings), scored }
            })
            .collect())
    }
}

fn group_by_case(records: &[FeedbackRecord]) -> BTreeMap<CaseId, Vec<u8>> {
    let mut grouped: BTreeMap<CaseId, Vec<u8>> = BTreeMap::new();
    for record in records {
        grouped.entry(record.case_id.clone()).or_default().push(record.rating);
    }
    grouped
}

fn required_id(field: &str, value: &str) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

fn checked_rating(field: &str, value: i64) -> Result<u8, DomainError> {
    if !(MIN_RATING..=MAX_RATING).contains(&value) {
        return Err(DomainError::validation(format!(
            "{field} must be between {MIN_RATING} and {MAX_RATING}, got {value}"
        )));
    }
    u8::try_from(value).map_err(|_| DomainError::validation(format!("{field} is out of range")))
}

fn optional_rating(field: &str, value: Option<i64>) -> Result<Option<u8>, DomainError> {
    value.map(|value| checked_rating(field, value)).transpose()
}

fn clean_text(value: Option<String>) -> Option<String> {
    value.map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}
