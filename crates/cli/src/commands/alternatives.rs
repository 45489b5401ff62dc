use gearfit_core::domain::case::CaseId;
use gearfit_core::domain::gear::GearId;
use gearfit_core::matching::MatchOptions;
use serde::Serialize;

use crate::commands::{
    application_failure, build_engine, open_pool, CommandContext, CommandResult, MatchSummary,
};

#[derive(Debug, Serialize)]
struct AlternativesOutput {
    gear_id: String,
    reference_case_id: String,
    alternatives: Vec<MatchSummary>,
}

pub fn run(gear: &str, case: &str, limit: Option<usize>) -> CommandResult {
    let context = match CommandContext::prepare("alternatives") {
        Ok(context) => context,
        Err(result) => return result,
    };
    let gear_id = GearId(gear.trim().to_string());
    let reference = CaseId(case.trim().to_string());

    context.execute("alternatives", |config| async move {
        let pool = open_pool(&config).await?;
        let engine = build_engine(&pool, &config);

        let gear = engine.load_gear(&gear_id).await.map_err(application_failure)?;
        let options = MatchOptions { limit, ..MatchOptions::default() };
        let alternatives = engine
            .generate_alternative_recommendations(&gear, &reference, &options)
            .await
            .map_err(application_failure)?;
        pool.close().await;

        let output = AlternativesOutput {
            gear_id: gear.id.0.clone(),
            reference_case_id: reference.0.clone(),
            alternatives: alternatives.iter().map(MatchSummary::from_match).collect(),
        };
        Ok(CommandResult::success_with_data(
            "alternatives",
            format!("{} alternatives to {}", output.alternatives.len(), reference),
            Some(output),
        ))
    })
}
