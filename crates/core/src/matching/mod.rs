//! Compatibility matching between gear and cases.
//!
//! Three pure scorers (fit, features, affinity) feed a weighted aggregator; the recommendation
//! engine runs the aggregator over candidate cases pulled from the catalog ports.

pub mod affinity;
pub mod engine;
pub mod explanation;
pub mod features;
pub mod fit;
pub mod ports;
pub mod scoring;

pub use engine::{CaseMatch, EngineSettings, MatchOptions, RecommendationEngine, SortPreference};
pub use explanation::MatchLabel;
pub use fit::{AxisFit, FitAssessment, FitQuality, FitScorer};
pub use ports::{CaseCatalog, CompatibilityMatchStore, GearCatalog};
pub use scoring::{CompatibilityAssessment, CompatibilityCalculator, ScoreBreakdown, ScoringWeights};

/// Target clearance on each side of every axis, in the case interior's unit.
pub const DEFAULT_PADDING: f64 = 0.5;

/// Axis score lost per unit of missing padding when the gear still fits.
pub const TIGHT_FIT_PENALTY_PER_UNIT: f64 = 40.0;

/// Default scoring weights
pub const DEFAULT_WEIGHTS: ScoringWeights = ScoringWeights {
    fit: 0.5,
    protection: 0.2,
    convenience: 0.1,
    type_match: 0.1,
    brand_match: 0.1,
};

/// Results returned when the caller gives no limit.
pub const DEFAULT_RESULT_LIMIT: usize = 20;

/// Hard ceiling on a single result page.
pub const MAX_RESULT_LIMIT: usize = 100;
