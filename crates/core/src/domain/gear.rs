use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::dimensions::Dimensions;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GearId(pub String);

impl fmt::Display for GearId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A piece of equipment that needs a case. Scoring reads a snapshot of this record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GearItem {
    pub id: GearId,
    pub name: String,
    pub category: Option<String>,
    pub gear_type: Option<String>,
    pub brand: Option<String>,
    pub dimensions: Option<Dimensions>,
    pub weight_kg: Option<f64>,
}

impl GearItem {
    /// Lower-cased type used for affinity lookups, falling back to the category.
    pub fn normalized_type(&self) -> Option<String> {
        self.gear_type
            .as_deref()
            .or(self.category.as_deref())
            .map(|value| value.trim().to_lowercase())
            .filter(|value| !value.is_empty())
    }
}
