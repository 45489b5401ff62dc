use sqlx::Row;

use gearfit_core::domain::case::CaseId;
use gearfit_core::domain::compatibility::CompatibilityMatch;
use gearfit_core::domain::gear::GearId;
use gearfit_core::errors::ApplicationError;
use gearfit_core::matching::CompatibilityMatchStore;

use super::{decode_error, format_timestamp, parse_timestamp, RepositoryError};
use crate::DbPool;

const MATCH_COLUMNS: &str = "gear_id, case_id, score, explanation, created_at, updated_at";

pub struct SqlCompatibilityMatchRepository {
    pool: DbPool,
}

impl SqlCompatibilityMatchRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn find(
        &self,
        gear_id: &GearId,
        case_id: &CaseId,
    ) -> Result<Option<CompatibilityMatch>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {MATCH_COLUMNS} FROM compatibility_match WHERE gear_id = ? AND case_id = ?"
        ))
        .bind(&gear_id.0)
        .bind(&case_id.0)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_match(r)?)),
            None => Ok(None),
        }
    }

    /// Writes the record and returns what is stored, so callers see the preserved `created_at`.
    /// A write older than the stored `updated_at` leaves the stored record untouched.
    pub async fn upsert(
        &self,
        record: &CompatibilityMatch,
    ) -> Result<CompatibilityMatch, RepositoryError> {
        sqlx::query(
            "INSERT INTO compatibility_match (gear_id, case_id, score, explanation, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(gear_id, case_id) DO UPDATE SET
                 score = excluded.score,
                 explanation = excluded.explanation,
                 updated_at = excluded.updated_at
             WHERE excluded.updated_at >= compatibility_match.updated_at",
        )
        .bind(&record.gear_id.0)
        .bind(&record.case_id.0)
        .bind(i64::from(record.score))
        .bind(&record.explanation)
        .bind(format_timestamp(record.created_at))
        .bind(format_timestamp(record.updated_at))
        .execute(&self.pool)
        .await?;

        self.find(&record.gear_id, &record.case_id).await?.ok_or_else(|| {
            RepositoryError::Decode(format!(
                "compatibility match {}/{} missing after upsert",
                record.gear_id, record.case_id
            ))
        })
    }

    pub async fn list_for_gear(
        &self,
        gear_id: &GearId,
        limit: u32,
    ) -> Result<Vec<CompatibilityMatch>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {MATCH_COLUMNS} FROM compatibility_match
             WHERE gear_id = ?
             ORDER BY score DESC, case_id ASC
             LIMIT ?"
        ))
        .bind(&gear_id.0)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_match).collect()
    }
}

fn row_to_match(row: &sqlx::sqlite::SqliteRow) -> Result<CompatibilityMatch, RepositoryError> {
    let score: i64 = row.try_get("score").map_err(decode_error)?;
    let score = u8::try_from(score)
        .ok()
        .filter(|score| *score <= 100)
        .ok_or_else(|| RepositoryError::Decode(format!("score out of range: {score}")))?;
    let created_at: String = row.try_get("created_at").map_err(decode_error)?;
    let updated_at: String = row.try_get("updated_at").map_err(decode_error)?;

    Ok(CompatibilityMatch {
        gear_id: GearId(row.try_get("gear_id").map_err(decode_error)?),
        case_id: CaseId(row.try_get("case_id").map_err(decode_error)?),
        score,
        explanation: row.try_get("explanation").map_err(decode_error)?,
        created_at: parse_timestamp("created_at", &created_at)?,
        updated_at: parse_timestamp("updated_at", &updated_at)?,
    })
}

#[async_trait::async_trait]
impl CompatibilityMatchStore for SqlCompatibilityMatchRepository {
    async fn find_match(
        &self,
        gear_id: &GearId,
        case_id: &CaseId,
    ) -> Result<Option<CompatibilityMatch>, ApplicationError> {
        Ok(self.find(gear_id, case_id).await?)
    }

    async fn upsert_match(
        &self,
        record: CompatibilityMatch,
    ) -> Result<CompatibilityMatch, ApplicationError> {
        Ok(self.upsert(&record).await?)
    }

    async fn list_matches_for_gear(
        &self,
        gear_id: &GearId,
        limit: usize,
    ) -> Result<Vec<CompatibilityMatch>, ApplicationError> {
        let limit = u32::try_from(limit).unwrap_or(u32::MAX);
        Ok(self.list_for_gear(gear_id, limit).await?)
    }
}
