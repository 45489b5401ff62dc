pub mod cache;
pub mod clock;
pub mod config;
pub mod domain;
pub mod errors;
pub mod feedback;
pub mod matching;

pub use cache::{derive_key, CacheOptions, CacheStore, CacheTtls, ResultCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use domain::cache::{CacheCategory, CacheEntry, CacheKey};
pub use domain::case::{CaseFeatures, CaseFilter, CaseId, CaseItem, ProtectionLevel};
pub use domain::compatibility::CompatibilityMatch;
pub use domain::dimensions::{Dimensions, LengthUnit};
pub use domain::feedback::{
    AverageRating, FeedbackId, FeedbackRecord, FeedbackSubmission, FeedbackSummary, FeedbackUpdate,
    TopRatedMatch,
};
pub use domain::gear::{GearId, GearItem};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use feedback::{AnnotatedMatch, FeedbackManager, FeedbackStore};
pub use matching::{
    CaseCatalog, CaseMatch, CompatibilityAssessment, CompatibilityCalculator,
    CompatibilityMatchStore, EngineSettings, FitScorer, GearCatalog, MatchLabel, MatchOptions,
    RecommendationEngine, ScoringWeights, SortPreference,
};
