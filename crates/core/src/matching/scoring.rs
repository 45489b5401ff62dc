//! Weighted aggregation of the fit, feature and affinity sub-scores.

use serde::{Deserialize, Serialize};

use crate::domain::case::{CaseId, CaseItem};
use crate::domain::compatibility::CompatibilityMatch;
use crate::domain::gear::{GearId, GearItem};

use super::affinity::{brand_match_score, type_match_score};
use super::explanation::{explain, join_reasons, MatchLabel};
use super::features::{convenience_score, protection_score};
use super::fit::{FitAssessment, FitScorer};

/// Weights for scoring components
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    /// Weight for the 0-100 fit score (default: 0.5)
    pub fit: f64,
    /// Weight for the 0-50 protection score (default: 0.2)
    pub protection: f64,
    /// Weight for the 0-10 convenience score (default: 0.1)
    pub convenience: f64,
    /// Weight for the 0-20 type affinity score (default: 0.1)
    pub type_match: f64,
    /// Weight for the 0-20 brand affinity score (default: 0.1)
    pub brand_match: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        super::DEFAULT_WEIGHTS
    }
}

/// Raw sub-scores for one pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub fit: FitAssessment,
    pub protection: u32,
    pub convenience: u32,
    pub type_match: u32,
    pub brand_match: u32,
}

/// Scored (gear, case) pair with its explanation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompatibilityAssessment {
    pub gear_id: GearId,
    pub case_id: CaseId,
    /// Integer in 0..=100.
    pub score: u8,
    pub label: MatchLabel,
    pub breakdown: ScoreBreakdown,
    pub reasons: Vec<String>,
}

impl CompatibilityAssessment {
    pub fn explanation(&self) -> String {
        join_reasons(&self.reasons)
    }

    pub fn to_match_record(&self, now: chrono::DateTime<chrono::Utc>) -> CompatibilityMatch {
        CompatibilityMatch::new(
            self.gear_id.clone(),
            self.case_id.clone(),
            self.score,
            self.explanation(),
            now,
        )
    }
}

/// Score calculator for gear/case compatibility
#[derive(Debug, Clone)]
pub struct CompatibilityCalculator {
    fit_scorer: FitScorer,
    weights: ScoringWeights,
}

impl CompatibilityCalculator {
    pub fn new() -> Self {
        Self { fit_scorer: FitScorer::new(), weights: ScoringWeights::default() }
    }

    pub fn with_settings(fit_scorer: FitScorer, weights: ScoringWeights) -> Self {
        Self { fit_scorer, weights }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Computes every sub-score. Gear geometry is converted into the case interior's unit first.
    pub fn breakdown(&self, gear: &GearItem, case: &CaseItem) -> ScoreBreakdown {
        let gear_dims =
            match (gear.dimensions, case.interior) {
                (Some(gear_dims), Some(interior)) => Some(gear_dims.to_unit(interior.unit)),
                (gear_dims, _) => gear_dims,
            };

        ScoreBreakdown {
            fit: self.fit_scorer.assess(gear_dims.as_ref(), case.interior.as_ref()),
            protection: protection_score(&case.features),
            convenience: convenience_score(&case.features),
            type_match: type_match_score(gear, case),
            brand_match: brand_match_score(gear.brand.as_deref(), case.brand.as_deref()),
        }
    }

    /// Weighted total rounded to an integer in 0..=100. Zero whenever the gear does not fit.
    pub fn weighted_score(&self, breakdown: &ScoreBreakdown) -> u8 {
        if !breakdown.fit.fits() {
            return 0;
        }

        let total = breakdown.fit.score * self.weights.fit
            + breakdown.protection as f64 * self.weights.protection
            + breakdown.convenience as f64 * self.weights.convenience
            + breakdown.type_match as f64 * self.weights.type_match
            + breakdown.brand_match as f64 * self.weights.brand_match;

        if !total.is_finite() {
            return 0;
        }
        total.round().clamp(0.0, 100.0) as u8
    }

    pub fn assess(&self, gear: &GearItem, case: &CaseItem) -> CompatibilityAssessment {
        let breakdown = self.breakdown(gear, case);
        let score = self.weighted_score(&breakdown);
        let reasons = explain(gear, case, &breakdown, score);

        CompatibilityAssessment {
            gear_id: gear.id.clone(),
            case_id: case.id.clone(),
            score,
            label: MatchLabel::from_score(score),
            breakdown,
            reasons,
        }
    }
}

impl Default for CompatibilityCalculator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::domain::case::{CaseFeatures, ProtectionLevel};
    use crate::domain::dimensions::{Dimensions, LengthUnit};
    use crate::matching::fit::FitQuality;

    fn gear(dims: Option<Dimensions>) -> GearItem {
        GearItem {
            id: GearId("gear-fa06".to_string()),
            name: "FA-06".to_string(),
            category: Some("Keyboards".to_string()),
            gear_type: Some("keyboard".to_string()),
            brand: Some("Roland".to_string()),
            dimensions: dims,
            weight_kg: Some(7.0),
        }
    }

    fn case(interior: Option<Dimensions>, features: CaseFeatures, brand: &str) -> CaseItem {
        CaseItem {
            id: CaseId("case-1".to_string()),
            name: "Keyboard Case".to_string(),
            case_type: Some("keyboard case".to_string()),
            brand: Some(brand.to_string()),
            interior,
            exterior: None,
            features,
            price: Some(Decimal::new(12999, 2)),
            currency: "USD".to_string(),
            rating: Some(4.5),
        }
    }

    fn cm(length: f64, width: f64, height: f64) -> Dimensions {
        Dimensions::new(length, width, height, LengthUnit::Centimeters)
    }

    fn protected() -> CaseFeatures {
        CaseFeatures {
            protection_level: Some(ProtectionLevel::High),
            waterproof: true,
            shockproof: true,
            padded: true,
            has_handle: true,
            has_wheels: true,
            ..CaseFeatures::default()
        }
    }

    #[test]
    fn perfect_fit_with_full_features_uses_default_weights() {
        let calculator = CompatibilityCalculator::new();
        let result = calculator.assess(
            &gear(Some(cm(10.0, 5.0, 3.0))),
            &case(Some(cm(11.0, 6.0, 4.0)), protected(), "roland"),
        );

        // 100*0.5 + 50*0.2 + 10*0.1 + 20*0.1 + 20*0.1 = 65
        assert_eq!(result.score, 65);
        assert_eq!(result.label, MatchLabel::Good);
        assert_eq!(result.breakdown.protection, 50);
        assert_eq!(result.breakdown.brand_match, 20);
        assert_eq!(result.breakdown.type_match, 20);
    }

    #[test]
    fn zero_fit_forces_zero_score_regardless_of_features() {
        let calculator = CompatibilityCalculator::new();
        let result = calculator.assess(
            &gear(Some(cm(10.0, 5.0, 3.0))),
            &case(Some(cm(20.0, 15.0, 10.0)), protected(), "Roland"),
        );

        assert_eq!(result.score, 0);
        assert_eq!(result.label, MatchLabel::Minimal);
        assert_eq!(result.reasons[0], "Case interior is too large to hold the gear securely");
    }

    #[test]
    fn oversized_gear_scores_zero_and_says_so() {
        let calculator = CompatibilityCalculator::new();
        let result = calculator.assess(
            &gear(Some(cm(12.0, 5.0, 3.0))),
            &case(Some(cm(11.0, 6.0, 4.0)), protected(), "Gator"),
        );

        assert_eq!(result.score, 0);
        assert_eq!(result.reasons[0], "Gear does not fit inside this case");
    }

    #[test]
    fn missing_geometry_is_degenerate_not_an_error() {
        let calculator = CompatibilityCalculator::new();
        let result = calculator.assess(&gear(None), &case(Some(cm(11.0, 6.0, 4.0)), protected(), "Gator"));

        assert_eq!(result.score, 0);
        assert_eq!(result.breakdown.fit.quality, FitQuality::InsufficientData);
        assert!(result.explanation().starts_with("Insufficient dimension data"));
    }

    #[test]
    fn gear_in_inches_is_converted_before_fitting() {
        let calculator = CompatibilityCalculator::new();
        // 10 x 5 x 3 cm expressed in inches.
        let gear_in = Dimensions::new(10.0 / 2.54, 5.0 / 2.54, 3.0 / 2.54, LengthUnit::Inches);
        let result = calculator.assess(
            &gear(Some(gear_in)),
            &case(Some(cm(11.0, 6.0, 4.0)), CaseFeatures::default(), "Gator"),
        );

        assert!((result.breakdown.fit.score - 100.0).abs() < 1e-6);
        assert_eq!(result.score, 52);
    }

    #[test]
    fn scoring_is_deterministic() {
        let calculator = CompatibilityCalculator::new();
        let g = gear(Some(cm(10.0, 5.0, 3.0)));
        let c = case(Some(cm(12.5, 6.0, 4.0)), protected(), "Gator");

        let first = calculator.assess(&g, &c);
        let second = calculator.assess(&g, &c);
        assert_eq!(first, second);
        assert_eq!(first.explanation(), second.explanation());
    }

    #[test]
    fn explanation_lists_features_brand_and_label_in_order() {
        let calculator = CompatibilityCalculator::new();
        let result = calculator.assess(
            &gear(Some(cm(10.0, 5.0, 3.0))),
            &case(Some(cm(11.0, 6.0, 4.0)), protected(), "Roland"),
        );

        assert_eq!(
            result.reasons,
            vec![
                "Good fit with proper padding".to_string(),
                "High protection level".to_string(),
                "Protective features: waterproof, shockproof, padded interior".to_string(),
                "Convenient features: carry handle, wheels".to_string(),
                "Same brand as your gear (Roland)".to_string(),
                "Case type designed for keyboard".to_string(),
                "Good match (65/100): a solid option worth considering".to_string(),
            ]
        );
    }

    #[test]
    fn custom_weights_can_reach_the_top_band() {
        let weights = ScoringWeights {
            fit: 0.6,
            protection: 0.4,
            convenience: 1.0,
            type_match: 0.5,
            brand_match: 0.5,
        };
        let calculator = CompatibilityCalculator::with_settings(FitScorer::new(), weights);
        let result = calculator.assess(
            &gear(Some(cm(10.0, 5.0, 3.0))),
            &case(Some(cm(11.0, 6.0, 4.0)), protected(), "Roland"),
        );

        // 60 + 20 + 10 + 10 + 10 = 110, clamped
        assert_eq!(result.score, 100);
        assert_eq!(result.label, MatchLabel::Perfect);
    }
}
