use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error;

use gearfit_core::domain::dimensions::{Dimensions, LengthUnit};
use gearfit_core::errors::ApplicationError;

pub mod cache;
pub mod case;
pub mod compatibility;
pub mod feedback;
pub mod gear;
pub mod memory;

pub use cache::SqlCacheRepository;
pub use case::SqlCaseRepository;
pub use compatibility::SqlCompatibilityMatchRepository;
pub use feedback::SqlFeedbackRepository;
pub use gear::SqlGearRepository;
pub use memory::{
    InMemoryCacheRepository, InMemoryCaseRepository, InMemoryCompatibilityMatchRepository,
    InMemoryFeedbackRepository, InMemoryGearRepository,
};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<RepositoryError> for ApplicationError {
    fn from(error: RepositoryError) -> Self {
        ApplicationError::Persistence(error.to_string())
    }
}

/// Fixed-width UTC form so stored timestamps compare correctly as text.
pub(crate) fn format_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(column: &str, value: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|error| RepositoryError::Decode(format!("{column}: {error}")))
}

pub(crate) fn decode_error(error: sqlx::Error) -> RepositoryError {
    RepositoryError::Decode(error.to_string())
}

/// Rebuilds a dimension triple from nullable columns. Any missing part yields `None`.
pub(crate) fn dimensions_from_columns(
    length: Option<f64>,
    width: Option<f64>,
    height: Option<f64>,
    unit: Option<String>,
) -> Result<Option<Dimensions>, RepositoryError> {
    let (Some(length), Some(width), Some(height), Some(unit)) = (length, width, height, unit) else {
        return Ok(None);
    };
    let unit = LengthUnit::parse(&unit)
        .ok_or_else(|| RepositoryError::Decode(format!("unknown length unit `{unit}`")))?;
    Ok(Some(Dimensions::new(length, width, height, unit)))
}

/// Column values for an optional dimension triple, in length/width/height/unit order.
pub(crate) fn dimension_columns(
    dimensions: Option<&Dimensions>,
) -> (Option<f64>, Option<f64>, Option<f64>, Option<&'static str>) {
    match dimensions {
        Some(dims) => (Some(dims.length), Some(dims.width), Some(dims.height), Some(dims.unit.as_str())),
        None => (None, None, None, None),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::{connect_with_settings, migrations, DbPool};

    pub async fn setup() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn timestamps_round_trip_at_fixed_width() {
        let at = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).single().expect("timestamp");
        let text = format_timestamp(at);

        assert_eq!(text, "2026-01-02T03:04:05.000000Z");
        assert_eq!(parse_timestamp("created_at", &text).expect("parse"), at);
    }

    #[test]
    fn partial_dimension_columns_decode_as_missing() {
        let partial = dimensions_from_columns(Some(1.0), None, Some(2.0), Some("cm".to_string()));
        let bad_unit = dimensions_from_columns(Some(1.0), Some(1.0), Some(1.0), Some("ft".to_string()));

        assert!(matches!(partial, Ok(None)));
        assert!(matches!(bad_unit, Err(RepositoryError::Decode(_))));
    }

    #[test]
    fn repository_errors_become_retryable_persistence_failures() {
        let error: ApplicationError = RepositoryError::Decode("bad row".to_string()).into();

        assert_eq!(error, ApplicationError::Persistence("decode error: bad row".to_string()));
        assert!(error.is_retryable());
    }
}
