use std::str::FromStr;
use std::sync::Arc;

use gearfit_core::domain::case::CaseFilter;
use gearfit_core::domain::gear::GearId;
use gearfit_core::feedback::FeedbackManager;
use gearfit_core::matching::MatchOptions;
use gearfit_db::repositories::SqlFeedbackRepository;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::commands::{
    application_failure, build_engine, open_pool, CommandContext, CommandResult, MatchSummary,
};

#[derive(Debug, Clone, Default)]
pub struct RecommendArgs {
    pub gear: String,
    pub limit: Option<usize>,
    pub max_price: Option<String>,
    pub persist: bool,
}

#[derive(Debug, Serialize)]
struct RecommendOutput {
    gear_id: String,
    matches: Vec<MatchSummary>,
    persisted: usize,
}

pub fn run(args: RecommendArgs) -> CommandResult {
    let max_price = match args.max_price.as_deref().map(parse_price).transpose() {
        Ok(max_price) => max_price,
        Err(message) => return CommandResult::failure("recommend", "invalid_argument", message, 2),
    };

    let context = match CommandContext::prepare("recommend") {
        Ok(context) => context,
        Err(result) => return result,
    };

    context.execute("recommend", |config| async move {
        let pool = open_pool(&config).await?;
        let engine = build_engine(&pool, &config);
        let feedback = FeedbackManager::new(Arc::new(SqlFeedbackRepository::new(pool.clone())));
        let gear_id = GearId(args.gear.trim().to_string());

        let options = MatchOptions {
            filter: CaseFilter { max_price, ..CaseFilter::default() },
            limit: args.limit,
            ..MatchOptions::default()
        };
        let matches =
            engine.find_compatible_cases(&gear_id, &options).await.map_err(application_failure)?;

        let persisted = if args.persist {
            engine.persist_matches(&matches).await.map_err(application_failure)?.len()
        } else {
            0
        };

        let annotated =
            feedback.annotate_matches(&gear_id, matches).await.map_err(application_failure)?;
        pool.close().await;

        let output = RecommendOutput {
            gear_id: gear_id.0.clone(),
            matches: annotated.iter().map(MatchSummary::from_annotated).collect(),
            persisted,
        };
        Ok(CommandResult::success_with_data(
            "recommend",
            format!("{} compatible cases for {}", output.matches.len(), gear_id),
            Some(output),
        ))
    })
}

fn parse_price(raw: &str) -> Result<Decimal, String> {
    let price = Decimal::from_str(raw.trim())
        .map_err(|error| format!("--max-price `{raw}` is not a decimal amount: {error}"))?;
    if price.is_sign_negative() {
        return Err(format!("--max-price must not be negative, got {raw}"));
    }
    Ok(price)
}
