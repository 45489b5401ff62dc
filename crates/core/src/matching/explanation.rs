//! Human-readable reasons attached to a compatibility score.
//!
//! Reasons are derived from an already computed breakdown and never feed back into the score.

use serde::{Deserialize, Serialize};

use crate::domain::case::CaseItem;
use crate::domain::gear::GearItem;

use super::affinity::{GENERIC_CASE_SCORE, TYPE_MATCH_SCORE};
use super::features::{convenience_attributes, protective_attributes};
use super::fit::FitQuality;
use super::scoring::ScoreBreakdown;

/// Qualitative band for a 0-100 compatibility score.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchLabel {
    Perfect,
    Excellent,
    VeryGood,
    Good,
    Fair,
    Moderate,
    Limited,
    Minimal,
}

/// Lower score bound for each band, highest first.
const LABEL_LADDER: &[(u8, MatchLabel)] = &[
    (90, MatchLabel::Perfect),
    (80, MatchLabel::Excellent),
    (70, MatchLabel::VeryGood),
    (60, MatchLabel::Good),
    (50, MatchLabel::Fair),
    (40, MatchLabel::Moderate),
    (30, MatchLabel::Limited),
    (0, MatchLabel::Minimal),
];

impl MatchLabel {
    pub fn from_score(score: u8) -> Self {
        LABEL_LADDER
            .iter()
            .find(|(threshold, _)| score >= *threshold)
            .map(|(_, label)| *label)
            .unwrap_or(MatchLabel::Minimal)
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Perfect => "Perfect match",
            Self::Excellent => "Excellent match",
            Self::VeryGood => "Very good match",
            Self::Good => "Good match",
            Self::Fair => "Fair match",
            Self::Moderate => "Moderate match",
            Self::Limited => "Limited match",
            Self::Minimal => "Minimal match",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Perfect => "ideal protection and fit for this gear",
            Self::Excellent => "highly recommended for this gear",
            Self::VeryGood => "a strong choice with minor trade-offs",
            Self::Good => "a solid option worth considering",
            Self::Fair => "usable with some compromises",
            Self::Moderate => "meets basic needs only",
            Self::Limited => "significant compromises in fit or protection",
            Self::Minimal => "not recommended for this gear",
        }
    }
}

fn fit_reason(breakdown: &ScoreBreakdown) -> String {
    match breakdown.fit.quality {
        FitQuality::InsufficientData => "Insufficient dimension data to evaluate fit".to_string(),
        FitQuality::DoesNotFit => {
            let too_loose = breakdown
                .fit
                .axes
                .is_some_and(|axes| axes.iter().any(|axis| axis.score <= 0.0 && axis.extra > 3.0));
            if too_loose {
                "Case interior is too large to hold the gear securely".to_string()
            } else {
                "Gear does not fit inside this case".to_string()
            }
        }
        FitQuality::Snug => "Snug fit with minimal padding".to_string(),
        FitQuality::Ideal => "Good fit with proper padding".to_string(),
        FitQuality::Roomy => "Fits with extra room for accessories".to_string(),
    }
}

/// Ordered reasons: fit, protection, convenience, brand, type relation, overall label.
pub fn explain(
    gear: &GearItem,
    case: &CaseItem,
    breakdown: &ScoreBreakdown,
    score: u8,
) -> Vec<String> {
    let mut reasons = vec![fit_reason(breakdown)];

    if let Some(level) = case.features.protection_level {
        let mut title = level.as_str().to_string();
        if let Some(first) = title.get_mut(0..1) {
            first.make_ascii_uppercase();
        }
        reasons.push(format!("{title} protection level"));
    }

    let protective = protective_attributes(&case.features);
    if !protective.is_empty() {
        reasons.push(format!("Protective features: {}", protective.join(", ")));
    }

    let convenience = convenience_attributes(&case.features);
    if !convenience.is_empty() {
        reasons.push(format!("Convenient features: {}", convenience.join(", ")));
    }

    if breakdown.brand_match > 0 {
        if let Some(brand) = case.brand.as_deref() {
            reasons.push(format!("Same brand as your gear ({})", brand.trim()));
        }
    }

    let gear_type = gear.normalized_type().unwrap_or_else(|| "gear".to_string());
    if breakdown.type_match >= TYPE_MATCH_SCORE {
        reasons.push(format!("Case type designed for {gear_type}"));
    } else if breakdown.type_match >= GENERIC_CASE_SCORE {
        reasons.push(format!("General-purpose case suitable for {gear_type}"));
    }

    let label = MatchLabel::from_score(score);
    reasons.push(format!("{} ({}/100): {}", label.title(), score, label.description()));

    reasons
}

/// Joins reasons into the single explanation string stored on a match record.
pub fn join_reasons(reasons: &[String]) -> String {
    if reasons.is_empty() {
        return String::new();
    }
    format!("{}.", reasons.join(". "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ladder_covers_every_band() {
        assert_eq!(MatchLabel::from_score(100), MatchLabel::Perfect);
        assert_eq!(MatchLabel::from_score(90), MatchLabel::Perfect);
        assert_eq!(MatchLabel::from_score(89), MatchLabel::Excellent);
        assert_eq!(MatchLabel::from_score(70), MatchLabel::VeryGood);
        assert_eq!(MatchLabel::from_score(65), MatchLabel::Good);
        assert_eq!(MatchLabel::from_score(50), MatchLabel::Fair);
        assert_eq!(MatchLabel::from_score(41), MatchLabel::Moderate);
        assert_eq!(MatchLabel::from_score(30), MatchLabel::Limited);
        assert_eq!(MatchLabel::from_score(29), MatchLabel::Minimal);
        assert_eq!(MatchLabel::from_score(0), MatchLabel::Minimal);
    }

    #[test]
    fn join_reasons_terminates_with_period() {
        let joined = join_reasons(&["Snug fit".to_string(), "Waterproof".to_string()]);
        assert_eq!(joined, "Snug fit. Waterproof.");
        assert_eq!(join_reasons(&[]), "");
    }
}
