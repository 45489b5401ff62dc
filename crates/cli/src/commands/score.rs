use gearfit_core::domain::case::CaseId;
use gearfit_core::domain::gear::GearId;

use crate::commands::{application_failure, build_engine, open_pool, CommandContext, CommandResult};

pub fn run(gear: &str, case: &str) -> CommandResult {
    let context = match CommandContext::prepare("score") {
        Ok(context) => context,
        Err(result) => return result,
    };
    let gear_id = GearId(gear.trim().to_string());
    let case_id = CaseId(case.trim().to_string());

    context.execute("score", |config| async move {
        let pool = open_pool(&config).await?;
        let engine = build_engine(&pool, &config);

        let scored = engine.score_pair(&gear_id, &case_id).await.map_err(application_failure)?;
        pool.close().await;

        let message = format!(
            "{} ({}/100) for {} in {}",
            scored.assessment.label.title(),
            scored.score(),
            gear_id,
            case_id
        );
        Ok(CommandResult::success_with_data("score", message, Some(scored.assessment)))
    })
}
