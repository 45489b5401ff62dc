pub mod alternatives;
pub mod cache_sweep;
pub mod config;
pub mod feedback;
pub mod migrate;
pub mod recommend;
pub mod score;
pub mod seed;

use std::sync::Arc;
use std::time::Duration;

use gearfit_core::cache::ResultCache;
use gearfit_core::config::{AppConfig, LoadOptions};
use gearfit_core::domain::feedback::AverageRating;
use gearfit_core::errors::{ApplicationError, DomainError};
use gearfit_core::feedback::AnnotatedMatch;
use gearfit_core::matching::{
    CaseMatch, CompatibilityCalculator, EngineSettings, FitScorer, MatchLabel, RecommendationEngine,
    ScoringWeights,
};
use gearfit_db::repositories::{
    SqlCacheRepository, SqlCaseRepository, SqlCompatibilityMatchRepository, SqlGearRepository,
};
use gearfit_db::{connect_with_config, migrations, DbPool};
use serde::Serialize;
use serde_json::Value;
use tokio::runtime::Runtime;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        Self::success_with_data(command, message, None::<()>)
    }

    pub fn success_with_data<T: Serialize>(
        command: &str,
        message: impl Into<String>,
        data: Option<T>,
    ) -> Self {
        let data = match data.map(serde_json::to_value).transpose() {
            Ok(data) => data,
            Err(error) => {
                return Self::failure(command, "serialization", error.to_string(), 1);
            }
        };
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            data,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            data: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    fn from_failure(command: &str, (error_class, message, exit_code): CommandFailure) -> Self {
        Self::failure(command, error_class, message, exit_code)
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

/// Error class, user-facing message and process exit code.
pub(crate) type CommandFailure = (&'static str, String, u8);

/// Loaded configuration plus a single-threaded runtime to drive one command.
pub(crate) struct CommandContext {
    pub config: AppConfig,
    pub runtime: Runtime,
}

impl CommandContext {
    pub fn prepare(command: &str) -> Result<Self, CommandResult> {
        let config = AppConfig::load(LoadOptions::default()).map_err(|error| {
            CommandResult::failure(
                command,
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            )
        })?;

        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(
            |error| {
                CommandResult::failure(
                    command,
                    "runtime_init",
                    format!("failed to initialize async runtime: {error}"),
                    3,
                )
            },
        )?;

        Ok(Self { config, runtime })
    }

    /// Runs `work` to completion and folds its failure into a structured result.
    pub fn execute<F>(self, command: &str, work: impl FnOnce(AppConfig) -> F) -> CommandResult
    where
        F: std::future::Future<Output = Result<CommandResult, CommandFailure>>,
    {
        let Self { config, runtime } = self;
        match runtime.block_on(work(config)) {
            Ok(result) => result,
            Err(failure) => CommandResult::from_failure(command, failure),
        }
    }
}

/// Connects and brings the schema up to date so every command sees the current tables.
pub(crate) async fn open_pool(config: &AppConfig) -> Result<DbPool, CommandFailure> {
    let pool = connect_with_config(&config.database)
        .await
        .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;
    migrations::run_pending(&pool).await.map_err(|error| ("migration", error.to_string(), 5u8))?;
    Ok(pool)
}

pub(crate) fn build_engine(pool: &DbPool, config: &AppConfig) -> RecommendationEngine {
    let calculator = CompatibilityCalculator::with_settings(
        FitScorer::with_padding(config.matching.padding),
        ScoringWeights::default(),
    );
    let engine = RecommendationEngine::new(
        Arc::new(SqlGearRepository::new(pool.clone())),
        Arc::new(SqlCaseRepository::new(pool.clone())),
    )
    .with_calculator(calculator)
    .with_settings(EngineSettings::from(&config.matching))
    .with_match_store(Arc::new(SqlCompatibilityMatchRepository::new(pool.clone())));

    if config.cache.enabled {
        let cache = ResultCache::from_config(Arc::new(SqlCacheRepository::new(pool.clone())), &config.cache);
        engine.with_cache(cache, Some(Duration::from_secs(config.cache.lookup_timeout_secs)))
    } else {
        engine
    }
}

pub(crate) fn application_failure(error: ApplicationError) -> CommandFailure {
    let message = error.to_string();
    match error {
        ApplicationError::Domain(DomainError::NotFound { .. }) => ("not_found", message, 6),
        ApplicationError::Domain(_) => ("validation", message, 2),
        ApplicationError::Configuration(_) => ("config_validation", message, 2),
        ApplicationError::Persistence(_) => ("persistence", message, 5),
        ApplicationError::LookupTimeout { .. } => ("lookup_timeout", message, 7),
        ApplicationError::Integration(_) => ("integration", message, 7),
    }
}

/// One ranked case as printed by the listing commands.
#[derive(Debug, Serialize)]
pub(crate) struct MatchSummary {
    pub case_id: String,
    pub case_name: String,
    pub brand: Option<String>,
    pub price: Option<String>,
    pub currency: String,
    pub score: u8,
    pub label: MatchLabel,
    pub explanation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub community_rating: Option<AverageRating>,
}

impl MatchSummary {
    pub fn from_match(scored: &CaseMatch) -> Self {
        Self {
            case_id: scored.case.id.0.clone(),
            case_name: scored.case.name.clone(),
            brand: scored.case.brand.clone(),
            price: scored.case.price.map(|price| price.to_string()),
            currency: scored.case.currency.clone(),
            score: scored.score(),
            label: scored.assessment.label,
            explanation: scored.assessment.explanation(),
            community_rating: None,
        }
    }

    pub fn from_annotated(annotated: &AnnotatedMatch) -> Self {
        Self { community_rating: Some(annotated.community_rating), ..Self::from_match(&annotated.scored) }
    }
}
