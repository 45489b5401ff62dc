use std::str::FromStr;

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{QueryBuilder, Row, Sqlite};

use gearfit_core::domain::case::{CaseFeatures, CaseFilter, CaseId, CaseItem, ProtectionLevel};
use gearfit_core::errors::ApplicationError;
use gearfit_core::matching::CaseCatalog;

use super::{decode_error, dimension_columns, dimensions_from_columns, format_timestamp, RepositoryError};
use crate::DbPool;

const CASE_COLUMNS: &str = "id, name, case_type, brand,
                            interior_length, interior_width, interior_height, interior_unit,
                            exterior_length, exterior_width, exterior_height, exterior_unit,
                            protection_level, waterproof, shockproof, padded, has_compartments,
                            lockable, has_handle, has_wheels, price, currency, rating";

pub struct SqlCaseRepository {
    pool: DbPool,
}

impl SqlCaseRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: &CaseId) -> Result<Option<CaseItem>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {CASE_COLUMNS} FROM case_item WHERE id = ?"))
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_case(r)?)),
            None => Ok(None),
        }
    }

    /// Only the waterproof flag runs in SQL. Type and brand need Unicode case folding and price
    /// is stored as exact decimal text, so the rest of the filter is checked on decoded rows.
    pub async fn query(&self, filter: &CaseFilter) -> Result<Vec<CaseItem>, RepositoryError> {
        let mut builder: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new(format!("SELECT {CASE_COLUMNS} FROM case_item WHERE 1 = 1"));

        if filter.waterproof_only {
            builder.push(" AND waterproof = 1");
        }
        builder.push(" ORDER BY id");

        let rows = builder.build().fetch_all(&self.pool).await?;
        let cases = rows.iter().map(row_to_case).collect::<Result<Vec<_>, _>>()?;
        Ok(cases.into_iter().filter(|case| filter.matches(case)).collect())
    }

    pub async fn save(&self, case: &CaseItem) -> Result<(), RepositoryError> {
        let now = format_timestamp(Utc::now());
        let (interior_length, interior_width, interior_height, interior_unit) =
            dimension_columns(case.interior.as_ref());
        let (exterior_length, exterior_width, exterior_height, exterior_unit) =
            dimension_columns(case.exterior.as_ref());
        let features = &case.features;

        sqlx::query(
            "INSERT INTO case_item (id, name, case_type, brand,
                                    interior_length, interior_width, interior_height, interior_unit,
                                    exterior_length, exterior_width, exterior_height, exterior_unit,
                                    protection_level, waterproof, shockproof, padded,
                                    has_compartments, lockable, has_handle, has_wheels,
                                    price, currency, rating, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 case_type = excluded.case_type,
                 brand = excluded.brand,
                 interior_length = excluded.interior_length,
                 interior_width = excluded.interior_width,
                 interior_height = excluded.interior_height,
                 interior_unit = excluded.interior_unit,
                 exterior_length = excluded.exterior_length,
                 exterior_width = excluded.exterior_width,
                 exterior_height = excluded.exterior_height,
                 exterior_unit = excluded.exterior_unit,
                 protection_level = excluded.protection_level,
                 waterproof = excluded.waterproof,
                 shockproof = excluded.shockproof,
                 padded = excluded.padded,
                 has_compartments = excluded.has_compartments,
                 lockable = excluded.lockable,
                 has_handle = excluded.has_handle,
                 has_wheels = excluded.has_wheels,
                 price = excluded.price,
                 currency = excluded.currency,
                 rating = excluded.rating,
                 updated_at = excluded.updated_at",
        )
        .bind(&case.id.0)
        .bind(&case.name)
        .bind(&case.case_type)
        .bind(&case.brand)
        .bind(interior_length)
        .bind(interior_width)
        .bind(interior_height)
        .bind(interior_unit)
        .bind(exterior_length)
        .bind(exterior_width)
        .bind(exterior_height)
        .bind(exterior_unit)
        .bind(features.protection_level.map(|level| level.as_str()))
        .bind(features.waterproof)
        .bind(features.shockproof)
        .bind(features.padded)
        .bind(features.has_compartments)
        .bind(features.lockable)
        .bind(features.has_handle)
        .bind(features.has_wheels)
        .bind(case.price.map(|price| price.to_string()))
        .bind(&case.currency)
        .bind(case.rating)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn row_to_case(row: &sqlx::sqlite::SqliteRow) -> Result<CaseItem, RepositoryError> {
    let interior = dimensions_from_columns(
        row.try_get("interior_length").map_err(decode_error)?,
        row.try_get("interior_width").map_err(decode_error)?,
        row.try_get("interior_height").map_err(decode_error)?,
        row.try_get("interior_unit").map_err(decode_error)?,
    )?;
    let exterior = dimensions_from_columns(
        row.try_get("exterior_length").map_err(decode_error)?,
        row.try_get("exterior_width").map_err(decode_error)?,
        row.try_get("exterior_height").map_err(decode_error)?,
        row.try_get("exterior_unit").map_err(decode_error)?,
    )?;

    let protection_level = row
        .try_get::<Option<String>, _>("protection_level")
        .map_err(decode_error)?
        .map(|value| {
            ProtectionLevel::parse(&value)
                .ok_or_else(|| RepositoryError::Decode(format!("unknown protection level `{value}`")))
        })
        .transpose()?;

    let price = row
        .try_get::<Option<String>, _>("price")
        .map_err(decode_error)?
        .map(|value| {
            Decimal::from_str(&value)
                .map_err(|error| RepositoryError::Decode(format!("price `{value}`: {error}")))
        })
        .transpose()?;

    Ok(CaseItem {
        id: CaseId(row.try_get("id").map_err(decode_error)?),
        name: row.try_get("name").map_err(decode_error)?,
        case_type: row.try_get("case_type").map_err(decode_error)?,
        brand: row.try_get("brand").map_err(decode_error)?,
        interior,
        exterior,
        features: CaseFeatures {
            protection_level,
            waterproof: row.try_get("waterproof").map_err(decode_error)?,
            shockproof: row.try_get("shockproof").map_err(decode_error)?,
            padded: row.try_get("padded").map_err(decode_error)?,
            has_compartments: row.try_get("has_compartments").map_err(decode_error)?,
            lockable: row.try_get("lockable").map_err(decode_error)?,
            has_handle: row.try_get("has_handle").map_err(decode_error)?,
            has_wheels: row.try_get("has_wheels").map_err(decode_error)?,
        },
        price,
        currency: row.try_get("currency").map_err(decode_error)?,
        rating: row.try_get("rating").map_err(decode_error)?,
    })
}

#[async_trait::async_trait]
impl CaseCatalog for SqlCaseRepository {
    async fn find_case(&self, id: &CaseId) -> Result<Option<CaseItem>, ApplicationError> {
        Ok(self.find_by_id(id).await?)
    }

    async fn query_cases(&self, filter: &CaseFilter) -> Result<Vec<CaseItem>, ApplicationError> {
        Ok(self.query(filter).await?)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use gearfit_core::domain::case::{CaseFeatures, CaseFilter, CaseId, CaseItem, ProtectionLevel};
    use gearfit_core::domain::dimensions::{Dimensions, LengthUnit};
    use gearfit_core::matching::CaseCatalog;

    use super::SqlCaseRepository;
    use crate::repositories::test_support::setup;

    fn sample_case(id: &str, brand: &str, case_type: &str, price_cents: i64) -> CaseItem {
        CaseItem {
            id: CaseId(id.to_string()),
            name: format!("{brand} {case_type}"),
            case_type: Some(case_type.to_string()),
            brand: Some(brand.to_string()),
            interior: Some(Dimensions::new(100.0, 35.0, 15.0, LengthUnit::Centimeters)),
            exterior: Some(Dimensions::new(106.0, 40.0, 20.0, LengthUnit::Centimeters)),
            features: CaseFeatures {
                protection_level: Some(ProtectionLevel::Medium),
                padded: true,
                has_handle: true,
                ..CaseFeatures::default()
            },
            price: Some(Decimal::new(price_cents, 2)),
            currency: "USD".to_string(),
            rating: Some(4.3),
        }
    }

    async fn seeded_repo() -> SqlCaseRepository {
        let repo = SqlCaseRepository::new(setup().await);
        let mut waterproof = sample_case("case-skb", "SKB", "Hard Case", 32_999);
        waterproof.features.waterproof = true;
        waterproof.features.protection_level = Some(ProtectionLevel::High);

        for case in [
            sample_case("case-gator", "Gator", "keyboard case", 12_999),
            sample_case("case-roland", "Roland", "Keyboard Bag", 8_950),
            waterproof,
        ] {
            repo.save(&case).await.expect("save case");
        }
        repo
    }

    #[tokio::test]
    async fn save_and_find_round_trips_every_field() {
        let repo = SqlCaseRepository::new(setup().await);
        let case = sample_case("case-gator", "Gator", "keyboard case", 12_999);

        repo.save(&case).await.expect("save");

        assert_eq!(repo.find_case(&case.id).await.expect("find"), Some(case));
    }

    #[tokio::test]
    async fn empty_filter_returns_all_cases_in_id_order() {
        let repo = seeded_repo().await;

        let cases = repo.query_cases(&CaseFilter::default()).await.expect("query");

        assert_eq!(
            cases.iter().map(|case| case.id.0.as_str()).collect::<Vec<_>>(),
            vec!["case-gator", "case-roland", "case-skb"]
        );
    }

    #[tokio::test]
    async fn type_and_brand_filters_ignore_case() {
        let repo = seeded_repo().await;

        let by_type = repo
            .query_cases(&CaseFilter { case_type: Some("KEYBOARD BAG".to_string()), ..CaseFilter::default() })
            .await
            .expect("query");
        let by_brand = repo
            .query_cases(&CaseFilter { brand: Some("gator".to_string()), ..CaseFilter::default() })
            .await
            .expect("query");

        assert_eq!(by_type.len(), 1);
        assert_eq!(by_type[0].id.0, "case-roland");
        assert_eq!(by_brand.len(), 1);
        assert_eq!(by_brand[0].id.0, "case-gator");
    }

    #[tokio::test]
    async fn brand_filter_matches_padded_and_non_ascii_values() {
        let repo = seeded_repo().await;
        repo.save(&sample_case("case-muller", "\tMüller\n", "Keyboard Bag", 15_000))
            .await
            .expect("save case");

        let by_brand = repo
            .query_cases(&CaseFilter { brand: Some("MÜLLER".to_string()), ..CaseFilter::default() })
            .await
            .expect("query");
        let by_type = repo
            .query_cases(&CaseFilter { case_type: Some("keyboard bag".to_string()), ..CaseFilter::default() })
            .await
            .expect("query");

        assert_eq!(by_brand.iter().map(|case| case.id.0.as_str()).collect::<Vec<_>>(), vec!["case-muller"]);
        assert_eq!(
            by_type.iter().map(|case| case.id.0.as_str()).collect::<Vec<_>>(),
            vec!["case-muller", "case-roland"]
        );
    }

    #[tokio::test]
    async fn price_protection_and_waterproof_filters_apply() {
        let repo = seeded_repo().await;

        let affordable = repo
            .query_cases(&CaseFilter {
                min_price: Some(Decimal::new(9_000, 2)),
                max_price: Some(Decimal::new(20_000, 2)),
                ..CaseFilter::default()
            })
            .await
            .expect("query");
        let rugged = repo
            .query_cases(&CaseFilter {
                min_protection: Some(ProtectionLevel::High),
                waterproof_only: true,
                ..CaseFilter::default()
            })
            .await
            .expect("query");

        assert_eq!(affordable.iter().map(|c| c.id.0.as_str()).collect::<Vec<_>>(), vec!["case-gator"]);
        assert_eq!(rugged.iter().map(|c| c.id.0.as_str()).collect::<Vec<_>>(), vec!["case-skb"]);
    }
}
