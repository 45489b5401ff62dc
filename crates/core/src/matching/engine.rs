//! Recommendation engine: candidate retrieval, scoring, ranking and diversification.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cache::{CacheOptions, ResultCache};
use crate::clock::{Clock, SystemClock};
use crate::config::MatchingConfig;
use crate::domain::cache::CacheCategory;
use crate::domain::case::{CaseFilter, CaseId, CaseItem};
use crate::domain::compatibility::CompatibilityMatch;
use crate::domain::gear::{GearId, GearItem};
use crate::errors::{ApplicationError, DomainError};

use super::ports::{CaseCatalog, CompatibilityMatchStore, GearCatalog};
use super::scoring::{CompatibilityAssessment, CompatibilityCalculator};
use super::{DEFAULT_RESULT_LIMIT, MAX_RESULT_LIMIT};

const CANDIDATE_OPERATION: &str = "case_candidates";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortPreference {
    /// Score descending, then catalog rating, then lower price.
    #[default]
    Score,
    PriceLowToHigh,
    Rating,
}

impl SortPreference {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Score => "score",
            Self::PriceLowToHigh => "price_low_to_high",
            Self::Rating => "rating",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "score" | "best" => Some(Self::Score),
            "price_low_to_high" | "price" => Some(Self::PriceLowToHigh),
            "rating" => Some(Self::Rating),
            _ => None,
        }
    }
}

/// Per-request options supplied by the request layer.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchOptions {
    pub filter: CaseFilter,
    /// Clamped to `1..=max_limit`; the engine default applies when absent.
    pub limit: Option<usize>,
    pub sort: SortPreference,
    /// Overrides the engine's alternative diversification setting.
    pub diversify: Option<bool>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngineSettings {
    pub default_limit: usize,
    pub max_limit: usize,
    pub diversify_alternatives: bool,
}

impl EngineSettings {
    fn resolve_limit(&self, requested: Option<usize>) -> usize {
        let max_limit = self.max_limit.max(1);
        requested.unwrap_or(self.default_limit).clamp(1, max_limit)
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_RESULT_LIMIT,
            max_limit: MAX_RESULT_LIMIT,
            diversify_alternatives: true,
        }
    }
}

impl From<&MatchingConfig> for EngineSettings {
    fn from(config: &MatchingConfig) -> Self {
        Self {
            default_limit: config.default_limit,
            max_limit: config.max_limit,
            diversify_alternatives: config.diversify_alternatives,
        }
    }
}

/// A candidate case together with its scored assessment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CaseMatch {
    pub case: CaseItem,
    pub assessment: CompatibilityAssessment,
}

impl CaseMatch {
    pub fn score(&self) -> u8 {
        self.assessment.score
    }
}

pub struct RecommendationEngine {
    gear: Arc<dyn GearCatalog>,
    cases: Arc<dyn CaseCatalog>,
    matches: Option<Arc<dyn CompatibilityMatchStore>>,
    cache: Option<ResultCache>,
    candidate_cache: CacheOptions,
    calculator: CompatibilityCalculator,
    settings: EngineSettings,
    clock: Arc<dyn Clock>,
}

impl RecommendationEngine {
    pub fn new(gear: Arc<dyn GearCatalog>, cases: Arc<dyn CaseCatalog>) -> Self {
        Self {
            gear,
            cases,
            matches: None,
            cache: None,
            candidate_cache: CacheOptions::new(CacheCategory::Search),
            calculator: CompatibilityCalculator::new(),
            settings: EngineSettings::default(),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_calculator(mut self, calculator: CompatibilityCalculator) -> Self {
        self.calculator = calculator;
        self
    }

    pub fn with_settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_match_store(mut self, store: Arc<dyn CompatibilityMatchStore>) -> Self {
        self.matches = Some(store);
        self
    }

    /// Routes candidate queries through the result cache, bounded by `lookup_timeout`.
    pub fn with_cache(mut self, cache: ResultCache, lookup_timeout: Option<Duration>) -> Self {
        let mut options = CacheOptions::new(CacheCategory::Search);
        options.timeout = lookup_timeout;
        self.cache = Some(cache);
        self.candidate_cache = options;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn calculator(&self) -> &CompatibilityCalculator {
        &self.calculator
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub async fn load_gear(&self, gear_id: &GearId) -> Result<GearItem, ApplicationError> {
        if gear_id.0.trim().is_empty() {
            return Err(DomainError::validation("gear id is required").into());
        }
        self.gear
            .find_gear(gear_id)
            .await?
            .ok_or_else(|| DomainError::not_found("gear", gear_id.0.clone()).into())
    }

    pub async fn load_case(&self, case_id: &CaseId) -> Result<CaseItem, ApplicationError> {
        if case_id.0.trim().is_empty() {
            return Err(DomainError::validation("case id is required").into());
        }
        self.cases
            .find_case(case_id)
            .await?
            .ok_or_else(|| DomainError::not_found("case", case_id.0.clone()).into())
    }

    /// Best-scoring cases for a gear item. Zero-score candidates never appear.
    pub async fn find_compatible_cases(
        &self,
        gear_id: &GearId,
        options: &MatchOptions,
    ) -> Result<Vec<CaseMatch>, ApplicationError> {
        let gear = self.load_gear(gear_id).await?;
        let limit = self.settings.resolve_limit(options.limit);
        let candidates = self.candidates(&options.filter).await?;
        let candidate_count = candidates.len();

        let mut ranked = self.rank(&gear, candidates, options.sort);
        ranked.truncate(limit);

        info!(
            event_name = "matching.find_compatible.completed",
            gear_id = %gear.id,
            candidates = candidate_count,
            returned = ranked.len(),
            limit,
            sort = options.sort.as_str(),
            "compatible cases ranked"
        );
        Ok(ranked)
    }

    /// Ranked alternatives to `reference_case`, which is never part of the result. The reference
    /// must resolve to a stored case.
    pub async fn generate_alternative_recommendations(
        &self,
        gear: &GearItem,
        reference_case: &CaseId,
        options: &MatchOptions,
    ) -> Result<Vec<CaseMatch>, ApplicationError> {
        let limit = self.settings.resolve_limit(options.limit);
        let diversify = options.diversify.unwrap_or(self.settings.diversify_alternatives);
        self.load_case(reference_case).await?;

        let mut candidates = self.candidates(&options.filter).await?;
        candidates.retain(|case| case.id != *reference_case);
        let candidate_count = candidates.len();

        let ranked = self.rank(gear, candidates, options.sort);
        let alternatives =
            if diversify { diversify_by_brand(ranked, limit) } else { truncated(ranked, limit) };

        info!(
            event_name = "matching.alternatives.completed",
            gear_id = %gear.id,
            reference_case = %reference_case,
            candidates = candidate_count,
            returned = alternatives.len(),
            diversify,
            "alternative cases ranked"
        );
        Ok(alternatives)
    }

    /// Scores a single pair. Either id failing to resolve is a not-found error.
    pub async fn score_pair(
        &self,
        gear_id: &GearId,
        case_id: &CaseId,
    ) -> Result<CaseMatch, ApplicationError> {
        let gear = self.load_gear(gear_id).await?;
        let case = self.load_case(case_id).await?;
        let assessment = self.calculator.assess(&gear, &case);

        debug!(
            event_name = "matching.pair.scored",
            gear_id = %gear.id,
            case_id = %case.id,
            score = assessment.score,
            "pair scored"
        );
        Ok(CaseMatch { case, assessment })
    }

    /// Upserts a match record per scored pair.
    pub async fn persist_matches(
        &self,
        scored: &[CaseMatch],
    ) -> Result<Vec<CompatibilityMatch>, ApplicationError> {
        let Some(store) = &self.matches else {
            return Err(ApplicationError::Configuration(
                "no compatibility match store attached to the engine".to_string(),
            ));
        };

        let now = self.clock.now();
        let mut persisted = Vec::with_capacity(scored.len());
        for item in scored {
            persisted.push(store.upsert_match(item.assessment.to_match_record(now)).await?);
        }

        info!(event_name = "matching.matches.persisted", count = persisted.len(), "match records upserted");
        Ok(persisted)
    }

    async fn candidates(&self, filter: &CaseFilter) -> Result<Vec<CaseItem>, ApplicationError> {
        match &self.cache {
            Some(cache) => {
                cache
                    .cache_api_call(
                        CANDIDATE_OPERATION,
                        filter,
                        || self.cases.query_cases(filter),
                        &self.candidate_cache,
                    )
                    .await
            }
            None => self.cases.query_cases(filter).await,
        }
    }

    fn rank(&self, gear: &GearItem, candidates: Vec<CaseItem>, sort: SortPreference) -> Vec<CaseMatch> {
        let mut scored: Vec<CaseMatch> = candidates
            .into_iter()
            .map(|case| {
                let assessment = self.calculator.assess(gear, &case);
                CaseMatch { case, assessment }
            })
            .filter(|item| item.assessment.score > 0)
            .collect();

        scored.sort_by(|a, b| compare_matches(a, b, sort));
        scored
    }
}

fn compare_matches(a: &CaseMatch, b: &CaseMatch, sort: SortPreference) -> Ordering {
    let by_score = b.score().cmp(&a.score());
    let by_rating = compare_rating_desc(a.case.rating, b.case.rating);
    let by_price = compare_price_asc(&a.case, &b.case);

    let primary = match sort {
        SortPreference::Score => by_score.then(by_rating).then(by_price),
        SortPreference::PriceLowToHigh => by_price.then(by_score).then(by_rating),
        SortPreference::Rating => by_rating.then(by_score).then(by_price),
    };
    primary.then_with(|| a.case.id.0.cmp(&b.case.id.0))
}

/// Higher rating first; unrated cases last.
fn compare_rating_desc(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.total_cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Lower price first; unpriced cases last.
fn compare_price_asc(a: &CaseItem, b: &CaseItem) -> Ordering {
    match (a.price, b.price) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn truncated(mut ranked: Vec<CaseMatch>, limit: usize) -> Vec<CaseMatch> {
    ranked.truncate(limit);
    ranked
}

/// One case per brand in rank order, then back-filled from the remaining candidates when
/// there are fewer distinct brands than `limit`. Unbranded cases never collide.
fn diversify_by_brand(ranked: Vec<CaseMatch>, limit: usize) -> Vec<CaseMatch> {
    let mut seen_brands = HashSet::new();
    let mut diverse = Vec::new();
    let mut overflow = Vec::new();

    for item in ranked {
        match item.case.normalized_brand() {
            Some(brand) if seen_brands.contains(&brand) => overflow.push(item),
            Some(brand) => {
                seen_brands.insert(brand);
                diverse.push(item);
            }
            None => diverse.push(item),
        }
    }

    let needed = limit.saturating_sub(diverse.len());
    diverse.extend(overflow.into_iter().take(needed));
    diverse.truncate(limit);
    diverse
}
