use gearfit_db::DemoCatalog;
use serde::Serialize;

use crate::commands::{open_pool, CommandContext, CommandResult};

#[derive(Debug, Serialize)]
struct SeedOutput {
    gear_seeded: usize,
    cases_seeded: usize,
}

pub fn run() -> CommandResult {
    let context = match CommandContext::prepare("seed") {
        Ok(context) => context,
        Err(result) => return result,
    };

    context.execute("seed", |config| async move {
        let pool = open_pool(&config).await?;

        let seed_result = DemoCatalog::load(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;

        let verification = DemoCatalog::verify(&pool)
            .await
            .map_err(|error| ("seed_verification", error.to_string(), 6u8))?;
        pool.close().await;

        if !verification.all_present {
            let failed_checks = verification
                .checks
                .iter()
                .filter_map(|(check, passed)| (!passed).then_some(*check))
                .collect::<Vec<_>>();
            return Err(("seed_verification", verification_message(&failed_checks), 6u8));
        }

        Ok(CommandResult::success_with_data(
            "seed",
            format!(
                "demo catalog loaded: {} gear items, {} cases",
                seed_result.gear_seeded, seed_result.cases_seeded
            ),
            Some(SeedOutput {
                gear_seeded: seed_result.gear_seeded,
                cases_seeded: seed_result.cases_seeded,
            }),
        ))
    })
}

fn verification_message(failed_checks: &[&str]) -> String {
    if failed_checks.is_empty() {
        "Some seed data failed to load".to_string()
    } else {
        format!("Seed verification failed for: {}", failed_checks.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::verification_message;

    #[test]
    fn verification_error_message_targets_failed_checks() {
        let message = verification_message(&["gear-roland-fa06", "case-pelican-1200"]);

        assert_eq!(message, "Seed verification failed for: gear-roland-fa06, case-pelican-1200");
    }

    #[test]
    fn verification_error_message_falls_back_to_generic_when_no_labels() {
        assert_eq!(verification_message(&[]), "Some seed data failed to load");
    }
}
