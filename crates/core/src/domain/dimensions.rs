use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthUnit {
    Millimeters,
    Centimeters,
    Inches,
}

impl LengthUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Millimeters => "mm",
            Self::Centimeters => "cm",
            Self::Inches => "in",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mm" | "millimeter" | "millimeters" => Some(Self::Millimeters),
            "cm" | "centimeter" | "centimeters" => Some(Self::Centimeters),
            "in" | "inch" | "inches" | "\"" => Some(Self::Inches),
            _ => None,
        }
    }

    fn millimeters_per_unit(&self) -> f64 {
        match self {
            Self::Millimeters => 1.0,
            Self::Centimeters => 10.0,
            Self::Inches => 25.4,
        }
    }
}

impl fmt::Display for LengthUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Axis-aligned box measurements. A zero, negative or non-finite axis counts as missing.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub length: f64,
    pub width: f64,
    pub height: f64,
    pub unit: LengthUnit,
}

impl Dimensions {
    pub fn new(length: f64, width: f64, height: f64, unit: LengthUnit) -> Self {
        Self { length, width, height, unit }
    }

    pub fn axes(&self) -> [f64; 3] {
        [self.length, self.width, self.height]
    }

    /// True when every axis carries a usable positive measurement.
    pub fn is_complete(&self) -> bool {
        self.axes().iter().all(|axis| axis.is_finite() && *axis > 0.0)
    }

    pub fn to_unit(&self, unit: LengthUnit) -> Self {
        if unit == self.unit {
            return *self;
        }
        let factor = self.unit.millimeters_per_unit() / unit.millimeters_per_unit();
        Self {
            length: self.length * factor,
            width: self.width * factor,
            height: self.height * factor,
            unit,
        }
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{} {}", self.length, self.width, self.height, self.unit)
    }
}

#[cfg(test)]
mod tests {
    use super::{Dimensions, LengthUnit};

    #[test]
    fn converts_inches_to_centimeters() {
        let dims = Dimensions::new(10.0, 5.0, 2.0, LengthUnit::Inches).to_unit(LengthUnit::Centimeters);

        assert!((dims.length - 25.4).abs() < 1e-9);
        assert!((dims.width - 12.7).abs() < 1e-9);
        assert!((dims.height - 5.08).abs() < 1e-9);
        assert_eq!(dims.unit, LengthUnit::Centimeters);
    }

    #[test]
    fn zero_or_nan_axis_is_incomplete() {
        assert!(!Dimensions::new(10.0, 0.0, 3.0, LengthUnit::Centimeters).is_complete());
        assert!(!Dimensions::new(f64::NAN, 1.0, 3.0, LengthUnit::Centimeters).is_complete());
        assert!(Dimensions::new(10.0, 5.0, 3.0, LengthUnit::Centimeters).is_complete());
    }

    #[test]
    fn parses_unit_aliases() {
        assert_eq!(LengthUnit::parse("Inches"), Some(LengthUnit::Inches));
        assert_eq!(LengthUnit::parse(" cm "), Some(LengthUnit::Centimeters));
        assert_eq!(LengthUnit::parse("furlong"), None);
    }
}
