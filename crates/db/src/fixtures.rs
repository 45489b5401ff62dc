use rust_decimal::Decimal;

use gearfit_core::domain::case::{CaseFeatures, CaseId, CaseItem, ProtectionLevel};
use gearfit_core::domain::dimensions::{Dimensions, LengthUnit};
use gearfit_core::domain::gear::{GearId, GearItem};

use crate::connection::DbPool;
use crate::repositories::{RepositoryError, SqlCaseRepository, SqlGearRepository};

type Measure = (f64, f64, f64, LengthUnit);

struct SeedGear {
    id: &'static str,
    name: &'static str,
    category: &'static str,
    gear_type: &'static str,
    brand: &'static str,
    dimensions: Measure,
    weight_kg: f64,
}

struct SeedCase {
    id: &'static str,
    name: &'static str,
    case_type: &'static str,
    brand: Option<&'static str>,
    interior: Option<Measure>,
    exterior: Option<Measure>,
    protection: Option<ProtectionLevel>,
    /// waterproof, shockproof, padded, compartments, lockable, handle, wheels
    flags: [bool; 7],
    price_cents: Option<i64>,
    rating: Option<f64>,
}

const CM: LengthUnit = LengthUnit::Centimeters;
const MM: LengthUnit = LengthUnit::Millimeters;

const SEED_GEAR: &[SeedGear] = &[
    SeedGear {
        id: "gear-roland-fa06",
        name: "Roland FA-06",
        category: "Keyboards",
        gear_type: "keyboard",
        brand: "Roland",
        dimensions: (100.8, 30.0, 11.4, CM),
        weight_kg: 7.0,
    },
    SeedGear {
        id: "gear-fender-strat",
        name: "Fender Player Stratocaster",
        category: "Guitars",
        gear_type: "guitar",
        brand: "Fender",
        dimensions: (99.0, 32.0, 5.5, CM),
        weight_kg: 3.6,
    },
    SeedGear {
        id: "gear-elektron-digitakt",
        name: "Elektron Digitakt",
        category: "Drum Machines",
        gear_type: "drum machine",
        brand: "Elektron",
        dimensions: (21.5, 17.6, 6.3, CM),
        weight_kg: 1.0,
    },
    SeedGear {
        id: "gear-pioneer-ddj400",
        name: "Pioneer DJ DDJ-400",
        category: "DJ Controllers",
        gear_type: "controller",
        brand: "Pioneer DJ",
        dimensions: (48.2, 27.3, 5.9, CM),
        weight_kg: 2.1,
    },
    SeedGear {
        id: "gear-shure-sm58",
        name: "Shure SM58",
        category: "Microphones",
        gear_type: "microphone",
        brand: "Shure",
        dimensions: (162.0, 51.0, 51.0, MM),
        weight_kg: 0.3,
    },
];

const SEED_CASES: &[SeedCase] = &[
    SeedCase {
        id: "case-gator-gkpe61",
        name: "Gator GKPE-61 Keyboard Case",
        case_type: "Keyboard Case",
        brand: Some("Gator"),
        interior: Some((102.9, 33.0, 14.0, CM)),
        exterior: Some((108.0, 38.1, 17.8, CM)),
        protection: Some(ProtectionLevel::Medium),
        flags: [false, false, true, false, false, true, true],
        price_cents: Some(17_999),
        rating: Some(4.5),
    },
    SeedCase {
        id: "case-roland-cb61rl",
        name: "Roland CB-61RL Keyboard Bag",
        case_type: "Keyboard Bag",
        brand: Some("Roland"),
        interior: Some((103.0, 32.0, 13.0, CM)),
        exterior: Some((106.0, 35.0, 16.0, CM)),
        protection: Some(ProtectionLevel::Low),
        flags: [false, false, true, true, false, true, true],
        price_cents: Some(14_999),
        rating: Some(4.2),
    },
    SeedCase {
        id: "case-skb-3skb4916",
        name: "SKB 61-Note Keyboard Hard Case",
        case_type: "Hard Case",
        brand: Some("SKB"),
        interior: Some((105.0, 35.0, 15.0, CM)),
        exterior: Some((111.0, 41.0, 19.0, CM)),
        protection: Some(ProtectionLevel::High),
        flags: [true, true, true, false, true, true, true],
        price_cents: Some(32_999),
        rating: Some(4.7),
    },
    SeedCase {
        id: "case-fender-deluxe",
        name: "Fender Deluxe Molded Strat Case",
        case_type: "Guitar Case",
        brand: Some("Fender"),
        interior: Some((101.0, 34.0, 8.0, CM)),
        exterior: Some((106.0, 40.0, 12.0, CM)),
        protection: Some(ProtectionLevel::High),
        flags: [false, true, true, true, true, true, false],
        price_cents: Some(15_999),
        rating: Some(4.6),
    },
    SeedCase {
        id: "case-gator-gigbag",
        name: "Gator Transit Electric Gig Bag",
        case_type: "Gig Bag",
        brand: Some("Gator"),
        interior: Some((104.0, 36.0, 9.0, CM)),
        exterior: Some((107.0, 39.0, 12.0, CM)),
        protection: Some(ProtectionLevel::Low),
        flags: [true, false, true, true, false, true, false],
        price_cents: Some(7_999),
        rating: Some(4.3),
    },
    SeedCase {
        id: "case-analog-pulse",
        name: "Analog Cases PULSE Digitakt Case",
        case_type: "Controller Case",
        brand: Some("Analog Cases"),
        interior: Some((23.0, 19.5, 8.0, CM)),
        exterior: Some((26.0, 22.5, 10.0, CM)),
        protection: Some(ProtectionLevel::Medium),
        flags: [false, true, true, false, false, true, false],
        price_cents: Some(6_900),
        rating: Some(4.4),
    },
    SeedCase {
        id: "case-pelican-1200",
        name: "Pelican 1200 Protector Case",
        case_type: "Hard Case",
        brand: Some("Pelican"),
        interior: Some((23.5, 18.1, 10.5, CM)),
        exterior: Some((27.0, 24.6, 12.4, CM)),
        protection: Some(ProtectionLevel::High),
        flags: [true, true, true, false, true, true, false],
        price_cents: Some(8_995),
        rating: Some(4.8),
    },
    SeedCase {
        id: "case-magma-ctrl",
        name: "Magma CTRL Case DDJ-400",
        case_type: "Controller Case",
        brand: Some("Magma"),
        interior: Some((50.0, 29.5, 8.0, CM)),
        exterior: Some((54.0, 33.0, 10.0, CM)),
        protection: Some(ProtectionLevel::Medium),
        flags: [false, true, true, true, false, true, false],
        price_cents: Some(9_900),
        rating: Some(4.1),
    },
    SeedCase {
        id: "case-shure-a58",
        name: "Shure A58 Microphone Case",
        case_type: "Microphone Case",
        brand: Some("Shure"),
        interior: Some((17.0, 6.0, 6.0, CM)),
        exterior: Some((19.0, 8.0, 8.0, CM)),
        protection: Some(ProtectionLevel::Medium),
        flags: [false, false, true, false, false, false, false],
        price_cents: Some(1_999),
        rating: None,
    },
    SeedCase {
        id: "case-generic-utility",
        name: "Utility Case",
        case_type: "Case",
        brand: None,
        interior: Some((30.0, 25.0, 12.0, CM)),
        exterior: None,
        protection: None,
        flags: [false, false, false, true, false, true, false],
        price_cents: None,
        rating: None,
    },
    SeedCase {
        id: "case-unmeasured-bag",
        name: "Unmeasured Gear Bag",
        case_type: "Gear Bag",
        brand: Some("Gator"),
        interior: None,
        exterior: Some((40.0, 30.0, 20.0, CM)),
        protection: Some(ProtectionLevel::Low),
        flags: [false, false, true, true, false, true, false],
        price_cents: Some(3_999),
        rating: Some(3.9),
    },
];

fn measure((length, width, height, unit): Measure) -> Dimensions {
    Dimensions::new(length, width, height, unit)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedResult {
    pub gear_seeded: usize,
    pub cases_seeded: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}

/// Deterministic demo catalog of musical gear and the cases built for it.
///
/// Loading is idempotent: every row is upserted by id.
pub struct DemoCatalog;

impl DemoCatalog {
    pub fn gear() -> Vec<GearItem> {
        SEED_GEAR
            .iter()
            .map(|seed| GearItem {
                id: GearId(seed.id.to_string()),
                name: seed.name.to_string(),
                category: Some(seed.category.to_string()),
                gear_type: Some(seed.gear_type.to_string()),
                brand: Some(seed.brand.to_string()),
                dimensions: Some(measure(seed.dimensions)),
                weight_kg: Some(seed.weight_kg),
            })
            .collect()
    }

    pub fn cases() -> Vec<CaseItem> {
        SEED_CASES
            .iter()
            .map(|seed| {
                let [waterproof, shockproof, padded, has_compartments, lockable, has_handle, has_wheels] =
                    seed.flags;
                CaseItem {
                    id: CaseId(seed.id.to_string()),
                    name: seed.name.to_string(),
                    case_type: Some(seed.case_type.to_string()),
                    brand: seed.brand.map(str::to_string),
                    interior: seed.interior.map(measure),
                    exterior: seed.exterior.map(measure),
                    features: CaseFeatures {
                        protection_level: seed.protection,
                        waterproof,
                        shockproof,
                        padded,
                        has_compartments,
                        lockable,
                        has_handle,
                        has_wheels,
                    },
                    price: seed.price_cents.map(|cents| Decimal::new(cents, 2)),
                    currency: "USD".to_string(),
                    rating: seed.rating,
                }
            })
            .collect()
    }

    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let gear_repo = SqlGearRepository::new(pool.clone());
        let case_repo = SqlCaseRepository::new(pool.clone());

        let gear = Self::gear();
        for item in &gear {
            gear_repo.save(item).await?;
        }
        let cases = Self::cases();
        for case in &cases {
            case_repo.save(case).await?;
        }

        Ok(SeedResult { gear_seeded: gear.len(), cases_seeded: cases.len() })
    }

    /// Confirms every demo row is present.
    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::new();

        for seed in SEED_GEAR {
            let exists: i64 = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM gear_item WHERE id = ?1)")
                .bind(seed.id)
                .fetch_one(pool)
                .await?;
            checks.push((seed.id, exists == 1));
        }
        for seed in SEED_CASES {
            let exists: i64 = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM case_item WHERE id = ?1)")
                .bind(seed.id)
                .fetch_one(pool)
                .await?;
            checks.push((seed.id, exists == 1));
        }

        let all_present = checks.iter().all(|(_, exists)| *exists);
        Ok(VerificationResult { all_present, checks })
    }

    /// Removes the demo rows. Stored matches for them go with them through the cascade.
    pub async fn clean(pool: &DbPool) -> Result<(), RepositoryError> {
        let mut tx = pool.begin().await?;

        for seed in SEED_GEAR {
            sqlx::query("DELETE FROM gear_item WHERE id = ?1").bind(seed.id).execute(&mut *tx).await?;
        }
        for seed in SEED_CASES {
            sqlx::query("DELETE FROM case_item WHERE id = ?1").bind(seed.id).execute(&mut *tx).await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
