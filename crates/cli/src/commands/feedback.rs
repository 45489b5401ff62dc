use std::sync::Arc;

use gearfit_core::domain::case::CaseId;
use gearfit_core::domain::feedback::{FeedbackRecord, FeedbackSummary, TopRatedMatch};
use gearfit_core::domain::gear::GearId;
use gearfit_core::feedback::FeedbackManager;
use gearfit_db::repositories::SqlFeedbackRepository;
use serde::Serialize;

use crate::commands::{application_failure, open_pool, CommandContext, CommandResult};

const TOP_RATED_LIMIT: usize = 10;

#[derive(Debug, Serialize)]
struct PairFeedbackOutput {
    summary: FeedbackSummary,
    records: Vec<FeedbackRecord>,
}

#[derive(Debug, Serialize)]
struct TopRatedOutput {
    gear_id: String,
    top_rated: Vec<TopRatedMatch>,
}

pub fn run(gear: &str, case: Option<&str>) -> CommandResult {
    let context = match CommandContext::prepare("feedback") {
        Ok(context) => context,
        Err(result) => return result,
    };
    let gear_id = GearId(gear.trim().to_string());
    let case_id = case.map(|case| CaseId(case.trim().to_string()));

    context.execute("feedback", |config| async move {
        let pool = open_pool(&config).await?;
        let manager = FeedbackManager::new(Arc::new(SqlFeedbackRepository::new(pool.clone())));

        let result = match case_id {
            Some(case_id) => {
                let summary =
                    manager.feedback_summary(&gear_id, &case_id).await.map_err(application_failure)?;
                let records = manager
                    .get_feedback_for_match(&gear_id, &case_id)
                    .await
                    .map_err(application_failure)?;
                let message = match summary.overall.value() {
                    Some(average) => format!(
                        "{} reviews for {gear_id} in {case_id}, average {average:.2}",
                        summary.overall.count()
                    ),
                    None => format!("no feedback yet for {gear_id} in {case_id}"),
                };
                CommandResult::success_with_data(
                    "feedback",
                    message,
                    Some(PairFeedbackOutput { summary, records }),
                )
            }
            None => {
                let top_rated = manager
                    .get_top_rated_matches_for_gear(&gear_id, TOP_RATED_LIMIT)
                    .await
                    .map_err(application_failure)?;
                CommandResult::success_with_data(
                    "feedback",
                    format!("{} rated cases for {gear_id}", top_rated.len()),
                    Some(TopRatedOutput { gear_id: gear_id.0.clone(), top_rated }),
                )
            }
        };

        pool.close().await;
        Ok(result)
    })
}
