//! Protection and convenience sub-scores derived from case attributes.

use crate::domain::case::{CaseFeatures, ProtectionLevel};

pub const MAX_PROTECTION_SCORE: u32 = 50;
pub const MAX_CONVENIENCE_SCORE: u32 = 10;

fn protection_base(level: Option<ProtectionLevel>) -> u32 {
    match level {
        Some(ProtectionLevel::High) => 30,
        Some(ProtectionLevel::Medium) => 20,
        Some(ProtectionLevel::Low) => 10,
        None => 0,
    }
}

/// Level base plus fixed increments per protective attribute, capped at 50.
pub fn protection_score(features: &CaseFeatures) -> u32 {
    let increments = [
        (features.waterproof, 10),
        (features.shockproof, 10),
        (features.padded, 10),
        (features.has_compartments, 5),
        (features.lockable, 5),
    ];

    let total = protection_base(features.protection_level)
        + increments.iter().filter(|(present, _)| *present).map(|(_, points)| points).sum::<u32>();

    total.min(MAX_PROTECTION_SCORE)
}

pub fn convenience_score(features: &CaseFeatures) -> u32 {
    let mut total = 0;
    if features.has_handle {
        total += 5;
    }
    if features.has_wheels {
        total += 5;
    }
    total.min(MAX_CONVENIENCE_SCORE)
}

/// Names of the protective attributes present, in a stable order.
pub fn protective_attributes(features: &CaseFeatures) -> Vec<&'static str> {
    [
        (features.waterproof, "waterproof"),
        (features.shockproof, "shockproof"),
        (features.padded, "padded interior"),
        (features.has_compartments, "storage compartments"),
        (features.lockable, "lockable"),
    ]
    .into_iter()
    .filter_map(|(present, name)| present.then_some(name))
    .collect()
}

pub fn convenience_attributes(features: &CaseFeatures) -> Vec<&'static str> {
    [(features.has_handle, "carry handle"), (features.has_wheels, "wheels")]
        .into_iter()
        .filter_map(|(present, name)| present.then_some(name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fully_protected_case_is_capped() {
        let features = CaseFeatures {
            protection_level: Some(ProtectionLevel::High),
            waterproof: true,
            shockproof: true,
            padded: true,
            ..CaseFeatures::default()
        };

        assert_eq!(protection_score(&features), 50);
    }

    #[test]
    fn level_bases_and_increments_add_up() {
        let medium = CaseFeatures {
            protection_level: Some(ProtectionLevel::Medium),
            has_compartments: true,
            ..CaseFeatures::default()
        };
        assert_eq!(protection_score(&medium), 25);

        let unset = CaseFeatures { lockable: true, padded: true, ..CaseFeatures::default() };
        assert_eq!(protection_score(&unset), 15);

        assert_eq!(protection_score(&CaseFeatures::default()), 0);
    }

    #[test]
    fn convenience_counts_handle_and_wheels() {
        let both = CaseFeatures { has_handle: true, has_wheels: true, ..CaseFeatures::default() };
        assert_eq!(convenience_score(&both), 10);
        assert_eq!(convenience_attributes(&both), vec!["carry handle", "wheels"]);

        let handle = CaseFeatures { has_handle: true, ..CaseFeatures::default() };
        assert_eq!(convenience_score(&handle), 5);
    }

    #[test]
    fn protective_attributes_are_listed_in_order() {
        let features = CaseFeatures {
            lockable: true,
            waterproof: true,
            padded: true,
            ..CaseFeatures::default()
        };
        assert_eq!(protective_attributes(&features), vec!["waterproof", "padded interior", "lockable"]);
    }
}
