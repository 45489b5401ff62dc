use sqlx::Row;

use gearfit_core::domain::case::CaseId;
use gearfit_core::domain::feedback::{FeedbackId, FeedbackRecord};
use gearfit_core::domain::gear::GearId;
use gearfit_core::errors::ApplicationError;
use gearfit_core::feedback::FeedbackStore;

use super::{decode_error, format_timestamp, parse_timestamp, RepositoryError};
use crate::DbPool;

const FEEDBACK_COLUMNS: &str = "id, gear_id, case_id, user_id, rating, fit_accuracy,
                                protection_quality, value_rating, comment, created_at, updated_at";

pub struct SqlFeedbackRepository {
    pool: DbPool,
}

impl SqlFeedbackRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, record: &FeedbackRecord) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO feedback (id, gear_id, case_id, user_id, rating, fit_accuracy,
                                   protection_quality, value_rating, comment, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.id.0)
        .bind(&record.gear_id.0)
        .bind(&record.case_id.0)
        .bind(&record.user_id)
        .bind(i64::from(record.rating))
        .bind(record.fit_accuracy.map(i64::from))
        .bind(record.protection_quality.map(i64::from))
        .bind(record.value_rating.map(i64::from))
        .bind(&record.comment)
        .bind(format_timestamp(record.created_at))
        .bind(record.updated_at.map(format_timestamp))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn find_by_id(&self, id: &FeedbackId) -> Result<Option<FeedbackRecord>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {FEEDBACK_COLUMNS} FROM feedback WHERE id = ?"))
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_feedback(r)?)),
            None => Ok(None),
        }
    }

    pub async fn list_for_match(
        &self,
        gear_id: &GearId,
        case_id: &CaseId,
    ) -> Result<Vec<FeedbackRecord>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {FEEDBACK_COLUMNS} FROM feedback
             WHERE gear_id = ? AND case_id = ?
             ORDER BY created_at DESC, id ASC"
        ))
        .bind(&gear_id.0)
        .bind(&case_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_feedback).collect()
    }

    pub async fn list_for_gear(&self, gear_id: &GearId) -> Result<Vec<FeedbackRecord>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {FEEDBACK_COLUMNS} FROM feedback
             WHERE gear_id = ?
             ORDER BY case_id ASC, created_at DESC"
        ))
        .bind(&gear_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_feedback).collect()
    }

    pub async fn update(&self, record: &FeedbackRecord) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE feedback
             SET rating = ?, fit_accuracy = ?, protection_quality = ?, value_rating = ?,
                 comment = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(i64::from(record.rating))
        .bind(record.fit_accuracy.map(i64::from))
        .bind(record.protection_quality.map(i64::from))
        .bind(record.value_rating.map(i64::from))
        .bind(&record.comment)
        .bind(record.updated_at.map(format_timestamp))
        .bind(&record.id.0)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(&self, id: &FeedbackId) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("DELETE FROM feedback WHERE id = ?").bind(&id.0).execute(&self.pool).await?;

        Ok(result.rows_affected() > 0)
    }
}

fn rating_column(column: &str, value: Option<i64>) -> Result<Option<u8>, RepositoryError> {
    value
        .map(|value| {
            u8::try_from(value)
                .ok()
                .filter(|rating| (1..=5).contains(rating))
                .ok_or_else(|| RepositoryError::Decode(format!("{column} out of range: {value}")))
        })
        .transpose()
}

fn row_to_feedback(row: &sqlx::sqlite::SqliteRow) -> Result<FeedbackRecord, RepositoryError> {
    let rating: i64 = row.try_get("rating").map_err(decode_error)?;
    let created_at: String = row.try_get("created_at").map_err(decode_error)?;
    let updated_at: Option<String> = row.try_get("updated_at").map_err(decode_error)?;

    Ok(FeedbackRecord {
        id: FeedbackId(row.try_get("id").map_err(decode_error)?),
        gear_id: GearId(row.try_get("gear_id").map_err(decode_error)?),
        case_id: CaseId(row.try_get("case_id").map_err(decode_error)?),
        user_id: row.try_get("user_id").map_err(decode_error)?,
        rating: rating_column("rating", Some(rating))?
            .ok_or_else(|| RepositoryError::Decode("rating missing".to_string()))?,
        fit_accuracy: rating_column("fit_accuracy", row.try_get("fit_accuracy").map_err(decode_error)?)?,
        protection_quality: rating_column(
            "protection_quality",
            row.try_get("protection_quality").map_err(decode_error)?,
        )?,
        value_rating: rating_column("value_rating", row.try_get("value_rating").map_err(decode_error)?)?,
        comment: row.try_get("comment").map_err(decode_error)?,
        created_at: parse_timestamp("created_at", &created_at)?,
        updated_at: updated_at.as_deref().map(|value| parse_timestamp("updated_at", value)).transpose()?,
    })
}

#[async_trait::async_trait]
impl FeedbackStore for SqlFeedbackRepository {
    async fn insert(&self, record: FeedbackRecord) -> Result<FeedbackRecord, ApplicationError> {
        SqlFeedbackRepository::insert(self, &record).await?;
        Ok(record)
    }

    async fn find_by_id(&self, id: &FeedbackId) -> Result<Option<FeedbackRecord>, ApplicationError> {
        Ok(SqlFeedbackRepository::find_by_id(self, id).await?)
    }

    async fn list_for_match(
        &self,
        gear_id: &GearId,
        case_id: &CaseId,
    ) -> Result<Vec<FeedbackRecord>, ApplicationError> {
        Ok(SqlFeedbackRepository::list_for_match(self, gear_id, case_id).await?)
    }

    async fn list_for_gear(&self, gear_id: &GearId) -> Result<Vec<FeedbackRecord>, ApplicationError> {
        Ok(SqlFeedbackRepository::list_for_gear(self, gear_id).await?)
    }

    async fn update(&self, record: FeedbackRecord) -> Result<bool, ApplicationError> {
        Ok(SqlFeedbackRepository::update(self, &record).await?)
    }

    async fn delete(&self, id: &FeedbackId) -> Result<bool, ApplicationError> {
        Ok(SqlFeedbackRepository::delete(self, id).await?)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use gearfit_core::domain::case::CaseId;
    use gearfit_core::domain::feedback::{FeedbackId, FeedbackRecord};
    use gearfit_core::domain::gear::GearId;
    use gearfit_core::feedback::FeedbackStore;

    use super::SqlFeedbackRepository;
    use crate::repositories::test_support::setup;

    fn record(id: &str, case_id: &str, rating: u8, minutes: i64) -> FeedbackRecord {
        FeedbackRecord {
            id: FeedbackId(id.to_string()),
            gear_id: GearId("gear-1".to_string()),
            case_id: CaseId(case_id.to_string()),
            user_id: Some("user-7".to_string()),
            rating,
            fit_accuracy: Some(4),
            protection_quality: None,
            value_rating: Some(3),
            comment: Some("Snug fit".to_string()),
            created_at: Utc.with_ymd_and_hms(2026, 4, 1, 9, 0, 0).single().expect("timestamp")
                + Duration::minutes(minutes),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn insert_and_find_round_trips_every_field() {
        let repo = SqlFeedbackRepository::new(setup().await);
        let stored = FeedbackStore::insert(&repo, record("fb-1", "case-a", 5, 0)).await.expect("insert");

        let found = FeedbackStore::find_by_id(&repo, &stored.id).await.expect("find");

        assert_eq!(found, Some(stored));
    }

    #[tokio::test]
    async fn list_for_match_is_newest_first() {
        let repo = SqlFeedbackRepository::new(setup().await);
        for (id, minutes) in [("fb-old", 0), ("fb-new", 10), ("fb-mid", 5)] {
            FeedbackStore::insert(&repo, record(id, "case-a", 4, minutes)).await.expect("insert");
        }
        FeedbackStore::insert(&repo, record("fb-other", "case-b", 2, 20)).await.expect("insert");

        let listed = FeedbackStore::list_for_match(
            &repo,
            &GearId("gear-1".to_string()),
            &CaseId("case-a".to_string()),
        )
        .await
        .expect("list");

        assert_eq!(
            listed.iter().map(|r| r.id.0.as_str()).collect::<Vec<_>>(),
            vec!["fb-new", "fb-mid", "fb-old"]
        );
        assert_eq!(
            FeedbackStore::list_for_gear(&repo, &GearId("gear-1".to_string())).await.expect("gear").len(),
            4
        );
    }

    #[tokio::test]
    async fn update_and_delete_report_missing_rows() {
        let repo = SqlFeedbackRepository::new(setup().await);
        let mut stored = FeedbackStore::insert(&repo, record("fb-1", "case-a", 3, 0)).await.expect("insert");

        stored.rating = 5;
        stored.comment = None;
        stored.updated_at = Some(stored.created_at + Duration::hours(1));
        assert!(FeedbackStore::update(&repo, stored.clone()).await.expect("update"));
        assert_eq!(FeedbackStore::find_by_id(&repo, &stored.id).await.expect("find"), Some(stored.clone()));

        assert!(!FeedbackStore::update(&repo, record("fb-missing", "case-a", 1, 0)).await.expect("update"));
        assert!(FeedbackStore::delete(&repo, &stored.id).await.expect("delete"));
        assert!(!FeedbackStore::delete(&repo, &stored.id).await.expect("delete again"));
    }

    #[tokio::test]
    async fn schema_rejects_out_of_range_ratings() {
        let repo = SqlFeedbackRepository::new(setup().await);

        let result = FeedbackStore::insert(&repo, record("fb-bad", "case-a", 9, 0)).await;

        assert!(result.is_err());
    }
}
