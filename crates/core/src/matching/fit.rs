//! Dimension fit scoring.
//!
//! Each axis compares the gear measurement against the case interior with a target padding on
//! both sides. Both inputs must already share a unit.

use serde::{Deserialize, Serialize};

use crate::domain::dimensions::Dimensions;

use super::{DEFAULT_PADDING, TIGHT_FIT_PENALTY_PER_UNIT};

/// How much room the case leaves around the gear once padding is accounted for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitQuality {
    /// Every axis fits but at least one leaves less than the target padding.
    Snug,
    /// Every axis is within one unit of the ideal padded size.
    Ideal,
    /// At least one axis has more than one unit of slack.
    Roomy,
    DoesNotFit,
    InsufficientData,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AxisFit {
    /// Case interior minus the padded gear size. Negative means less than ideal padding.
    pub extra: f64,
    pub score: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FitAssessment {
    /// Length, width and height, in that order. Empty when geometry was missing.
    pub axes: Option<[AxisFit; 3]>,
    pub score: f64,
    pub quality: FitQuality,
}

impl FitAssessment {
    fn insufficient_data() -> Self {
        Self { axes: None, score: 0.0, quality: FitQuality::InsufficientData }
    }

    pub fn fits(&self) -> bool {
        self.score > 0.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FitScorer {
    padding: f64,
}

impl FitScorer {
    pub fn new() -> Self {
        Self { padding: DEFAULT_PADDING }
    }

    pub fn with_padding(padding: f64) -> Self {
        let padding = if padding.is_finite() && padding >= 0.0 { padding } else { DEFAULT_PADDING };
        Self { padding }
    }

    pub fn padding(&self) -> f64 {
        self.padding
    }

    /// Scores a single axis on a 0-100 scale.
    ///
    /// * gear larger than the case: 0
    /// * less than ideal padding: `100 + extra * 40`, clamped to 0
    /// * `0 <= extra <= 1`: 100
    /// * `1 < extra <= 3`: `90 - (extra - 1) * 10`
    /// * `extra > 3`: `60 - (extra - 3) * 10`, clamped to 0
    pub fn score_axis(&self, gear: f64, case: f64) -> AxisFit {
        if gear > case {
            return AxisFit { extra: case - gear, score: 0.0 };
        }

        let extra = case - (gear + 2.0 * self.padding);
        let score = if extra < 0.0 {
            (100.0 + extra * TIGHT_FIT_PENALTY_PER_UNIT).max(0.0)
        } else if extra <= 1.0 {
            100.0
        } else if extra <= 3.0 {
            90.0 - (extra - 1.0) * 10.0
        } else {
            (60.0 - (extra - 3.0) * 10.0).max(0.0)
        };

        AxisFit { extra, score }
    }

    pub fn assess(&self, gear: Option<&Dimensions>, case: Option<&Dimensions>) -> FitAssessment {
        let (Some(gear), Some(case)) = (gear, case) else {
            return FitAssessment::insufficient_data();
        };
        if !gear.is_complete() || !case.is_complete() {
            return FitAssessment::insufficient_data();
        }

        let gear_axes = gear.axes();
        let case_axes = case.axes();
        let axes = [
            self.score_axis(gear_axes[0], case_axes[0]),
            self.score_axis(gear_axes[1], case_axes[1]),
            self.score_axis(gear_axes[2], case_axes[2]),
        ];

        if axes.iter().any(|axis| axis.score <= 0.0) {
            return FitAssessment { axes: Some(axes), score: 0.0, quality: FitQuality::DoesNotFit };
        }

        let score = axes.iter().map(|axis| axis.score).sum::<f64>() / 3.0;
        let quality = if axes.iter().any(|axis| axis.extra < 0.0) {
            FitQuality::Snug
        } else if axes.iter().all(|axis| axis.extra <= 1.0) {
            FitQuality::Ideal
        } else {
            FitQuality::Roomy
        };

        FitAssessment { axes: Some(axes), score, quality }
    }
}

impl Default for FitScorer {
    fn default() -> Self {
        Self::new()
    }
}
