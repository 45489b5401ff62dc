use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::dimensions::Dimensions;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CaseId(pub String);

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtectionLevel {
    Low,
    Medium,
    High,
}

impl ProtectionLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

/// Protective and convenience attributes of a case.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseFeatures {
    pub protection_level: Option<ProtectionLevel>,
    pub waterproof: bool,
    pub shockproof: bool,
    pub padded: bool,
    pub has_compartments: bool,
    pub lockable: bool,
    pub has_handle: bool,
    pub has_wheels: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CaseItem {
    pub id: CaseId,
    pub name: String,
    pub case_type: Option<String>,
    pub brand: Option<String>,
    /// Interior measurements; the only geometry that matters for fit.
    pub interior: Option<Dimensions>,
    pub exterior: Option<Dimensions>,
    pub features: CaseFeatures,
    pub price: Option<Decimal>,
    pub currency: String,
    /// Catalog rating on a 0-5 scale, used only to break ranking ties.
    pub rating: Option<f64>,
}

impl CaseItem {
    pub fn normalized_type(&self) -> Option<String> {
        self.case_type
            .as_deref()
            .map(|value| value.trim().to_lowercase())
            .filter(|value| !value.is_empty())
    }

    pub fn normalized_brand(&self) -> Option<String> {
        self.brand
            .as_deref()
            .map(|value| value.trim().to_lowercase())
            .filter(|value| !value.is_empty())
    }
}

/// Caller-supplied narrowing of the candidate case set.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CaseFilter {
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub case_type: Option<String>,
    pub brand: Option<String>,
    pub min_protection: Option<ProtectionLevel>,
    pub waterproof_only: bool,
}

impl CaseFilter {
    /// Evaluates the filter in memory. SQL-backed stores run it over their decoded rows.
    pub fn matches(&self, case: &CaseItem) -> bool {
        if let Some(min) = self.min_price {
            if case.price.map_or(true, |price| price < min) {
                return false;
            }
        }
        if let Some(max) = self.max_price {
            if case.price.map_or(true, |price| price > max) {
                return false;
            }
        }
        if let Some(case_type) = &self.case_type {
            if case.normalized_type().as_deref() != Some(case_type.trim().to_lowercase().as_str()) {
                return false;
            }
        }
        if let Some(brand) = &self.brand {
            if case.normalized_brand().as_deref() != Some(brand.trim().to_lowercase().as_str()) {
                return false;
            }
        }
        if let Some(min_protection) = self.min_protection {
            if case.features.protection_level.map_or(true, |level| level < min_protection) {
                return false;
            }
        }
        if self.waterproof_only && !case.features.waterproof {
            return false;
        }
        true
    }
}
