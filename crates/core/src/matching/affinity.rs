//! Type and brand affinity between gear and cases.

use crate::domain::case::CaseItem;
use crate::domain::gear::GearItem;

pub const TYPE_MATCH_SCORE: u32 = 20;
pub const GENERIC_CASE_SCORE: u32 = 10;
pub const BRAND_MATCH_SCORE: u32 = 20;

const GENERIC_CASE_TYPE: &str = "case";

/// Gear type (lower-cased) to the case types built for it.
const TYPE_AFFINITY: &[(&str, &[&str])] = &[
    ("keyboard", &["keyboard case", "keyboard bag", "gig bag", "hard case", "flight case"]),
    ("synthesizer", &["keyboard case", "keyboard bag", "gig bag", "hard case", "flight case"]),
    ("piano", &["keyboard case", "keyboard bag", "flight case"]),
    ("guitar", &["guitar case", "gig bag", "hard case", "flight case"]),
    ("bass", &["bass case", "guitar case", "gig bag", "hard case"]),
    ("violin", &["violin case", "hard case"]),
    ("drum", &["drum case", "drum bag", "hardware bag", "flight case"]),
    ("cymbal", &["cymbal bag", "cymbal case"]),
    ("drum machine", &["controller case", "gear bag", "hard case", "utility case"]),
    ("controller", &["controller case", "dj case", "gear bag", "hard case", "flight case"]),
    ("mixer", &["mixer case", "dj case", "flight case", "rack case", "hard case"]),
    ("audio interface", &["gear bag", "utility case", "hard case", "rack case"]),
    ("microphone", &["microphone case", "utility case", "hard case"]),
    ("pedal", &["pedalboard case", "pedal case", "gear bag"]),
    ("pedalboard", &["pedalboard case", "gig bag", "hard case"]),
    ("amplifier", &["amp cover", "amp case", "flight case"]),
    ("speaker", &["speaker bag", "speaker case", "flight case"]),
    ("headphones", &["headphone case", "utility case"]),
    ("laptop", &["laptop bag", "laptop sleeve", "hard case"]),
    ("camera", &["camera bag", "camera case", "hard case"]),
    ("lens", &["lens case", "camera bag", "hard case"]),
    ("drone", &["drone case", "hard case", "backpack"]),
    ("lighting", &["lighting case", "flight case", "gear bag"]),
    ("cable", &["cable bag", "utility case", "gear bag"]),
];

/// Case types considered purpose-built for the given lower-cased gear type.
pub fn compatible_case_types(gear_type: &str) -> Option<&'static [&'static str]> {
    TYPE_AFFINITY.iter().find(|(name, _)| *name == gear_type).map(|(_, types)| *types)
}

pub fn type_match_score(gear: &GearItem, case: &CaseItem) -> u32 {
    let Some(case_type) = case.normalized_type() else {
        return 0;
    };

    let purpose_built = gear
        .normalized_type()
        .and_then(|gear_type| compatible_case_types(&gear_type))
        .is_some_and(|types| types.contains(&case_type.as_str()));

    if purpose_built {
        TYPE_MATCH_SCORE
    } else if case_type == GENERIC_CASE_TYPE {
        GENERIC_CASE_SCORE
    } else {
        0
    }
}

/// 20 when both brands are present and equal ignoring case.
pub fn brand_match_score(gear_brand: Option<&str>, case_brand: Option<&str>) -> u32 {
    match (gear_brand.map(str::trim), case_brand.map(str::trim)) {
        (Some(gear), Some(case)) if !gear.is_empty() => {
            if gear.to_lowercase() == case.to_lowercase() {
                BRAND_MATCH_SCORE
            } else {
                0
            }
        }
        _ => 0,
    }
}
