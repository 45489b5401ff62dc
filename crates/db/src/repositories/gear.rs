use chrono::Utc;
use sqlx::Row;

use gearfit_core::domain::gear::{GearId, GearItem};
use gearfit_core::errors::ApplicationError;
use gearfit_core::matching::GearCatalog;

use super::{decode_error, dimension_columns, dimensions_from_columns, format_timestamp, RepositoryError};
use crate::DbPool;

const GEAR_COLUMNS: &str = "id, name, category, gear_type, brand, length, width, height,
                            dimension_unit, weight_kg";

pub struct SqlGearRepository {
    pool: DbPool,
}

impl SqlGearRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: &GearId) -> Result<Option<GearItem>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {GEAR_COLUMNS} FROM gear_item WHERE id = ?"))
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_gear(r)?)),
            None => Ok(None),
        }
    }

    pub async fn list(&self, limit: u32) -> Result<Vec<GearItem>, RepositoryError> {
        let rows = sqlx::query(&format!("SELECT {GEAR_COLUMNS} FROM gear_item ORDER BY id LIMIT ?"))
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_gear).collect()
    }

    pub async fn save(&self, gear: &GearItem) -> Result<(), RepositoryError> {
        let now = format_timestamp(Utc::now());
        let (length, width, height, unit) = dimension_columns(gear.dimensions.as_ref());

        sqlx::query(
            "INSERT INTO gear_item (id, name, category, gear_type, brand, length, width, height,
                                    dimension_unit, weight_kg, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 category = excluded.category,
                 gear_type = excluded.gear_type,
                 brand = excluded.brand,
                 length = excluded.length,
                 width = excluded.width,
                 height = excluded.height,
                 dimension_unit = excluded.dimension_unit,
                 weight_kg = excluded.weight_kg,
                 updated_at = excluded.updated_at",
        )
        .bind(&gear.id.0)
        .bind(&gear.name)
        .bind(&gear.category)
        .bind(&gear.gear_type)
        .bind(&gear.brand)
        .bind(length)
        .bind(width)
        .bind(height)
        .bind(unit)
        .bind(gear.weight_kg)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn row_to_gear(row: &sqlx::sqlite::SqliteRow) -> Result<GearItem, RepositoryError> {
    let dimensions = dimensions_from_columns(
        row.try_get("length").map_err(decode_error)?,
        row.try_get("width").map_err(decode_error)?,
        row.try_get("height").map_err(decode_error)?,
        row.try_get("dimension_unit").map_err(decode_error)?,
    )?;

    Ok(GearItem {
        id: GearId(row.try_get("id").map_err(decode_error)?),
        name: row.try_get("name").map_err(decode_error)?,
        category: row.try_get("category").map_err(decode_error)?,
        gear_type: row.try_get("gear_type").map_err(decode_error)?,
        brand: row.try_get("brand").map_err(decode_error)?,
        dimensions,
        weight_kg: row.try_get("weight_kg").map_err(decode_error)?,
    })
}

#[async_trait::async_trait]
impl GearCatalog for SqlGearRepository {
    async fn find_gear(&self, id: &GearId) -> Result<Option<GearItem>, ApplicationError> {
        Ok(self.find_by_id(id).await?)
    }
}

#[cfg(test)]
mod tests {
    use gearfit_core::domain::dimensions::{Dimensions, LengthUnit};
    use gearfit_core::domain::gear::{GearId, GearItem};
    use gearfit_core::matching::GearCatalog;

    use super::SqlGearRepository;
    use crate::repositories::test_support::setup;

    fn sample_gear(id: &str) -> GearItem {
        GearItem {
            id: GearId(id.to_string()),
            name: "Digitakt".to_string(),
            category: Some("Drum Machines".to_string()),
            gear_type: Some("drum machine".to_string()),
            brand: Some("Elektron".to_string()),
            dimensions: Some(Dimensions::new(21.5, 17.6, 6.3, LengthUnit::Centimeters)),
            weight_kg: Some(1.0),
        }
    }

    #[tokio::test]
    async fn save_and_find_by_id() {
        let repo = SqlGearRepository::new(setup().await);
        let gear = sample_gear("gear-digitakt");

        repo.save(&gear).await.expect("save");
        let found = repo.find_gear(&gear.id).await.expect("find");

        assert_eq!(found, Some(gear));
    }

    #[tokio::test]
    async fn save_twice_updates_in_place() {
        let repo = SqlGearRepository::new(setup().await);
        let mut gear = sample_gear("gear-digitakt");
        repo.save(&gear).await.expect("save");

        gear.dimensions = None;
        gear.brand = None;
        repo.save(&gear).await.expect("resave");

        let all = repo.list(10).await.expect("list");
        assert_eq!(all, vec![gear]);
    }

    #[tokio::test]
    async fn missing_gear_is_none() {
        let repo = SqlGearRepository::new(setup().await);

        let found = repo.find_gear(&GearId("gear-unknown".to_string())).await.expect("find");

        assert_eq!(found, None);
    }
}
