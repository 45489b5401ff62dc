use std::env;
use std::sync::{Mutex, OnceLock};

use gearfit_cli::commands::recommend::RecommendArgs;
use gearfit_cli::commands::{
    alternatives, cache_sweep, config, feedback, migrate, recommend, score, seed,
};
use serde_json::Value;

#[test]
fn migrate_returns_success_with_valid_env() {
    with_database(|| {
        let result = migrate::run();
        assert_eq!(result.exit_code, 0, "expected successful migrate run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "ok");
    });
}

#[test]
fn migrate_returns_config_failure_for_invalid_override() {
    with_env(&[("GEARFIT_CACHE_ENABLED", "sometimes")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn seed_is_idempotent_across_runs() {
    with_database(|| {
        let first = seed::run();
        assert_eq!(first.exit_code, 0, "expected first seed invocation success");
        let first_payload = parse_payload(&first.output);
        assert_eq!(first_payload["command"], "seed");
        assert_eq!(first_payload["data"]["gear_seeded"], 5);
        assert_eq!(first_payload["data"]["cases_seeded"], 11);

        let second = seed::run();
        assert_eq!(second.exit_code, 0, "expected second seed invocation success");
        let second_payload = parse_payload(&second.output);

        assert_eq!(first_payload["message"], second_payload["message"]);
    });
}

#[test]
fn recommend_ranks_seeded_cases_and_persists_them() {
    with_database(|| {
        assert_eq!(seed::run().exit_code, 0);

        let result = recommend::run(RecommendArgs {
            gear: "gear-roland-fa06".to_string(),
            persist: true,
            ..RecommendArgs::default()
        });
        assert_eq!(result.exit_code, 0, "unexpected output: {}", result.output);

        let payload = parse_payload(&result.output);
        let matches = payload["data"]["matches"].as_array().cloned().unwrap_or_default();
        assert_eq!(matches.len(), 3);
        assert_eq!(payload["data"]["persisted"], 3);

        let scores: Vec<u64> = matches.iter().filter_map(|m| m["score"].as_u64()).collect();
        assert!(scores.windows(2).all(|pair| pair[0] >= pair[1]));
        assert!(matches.iter().all(|m| m["community_rating"]["status"] == "no_data"));
    });
}

#[test]
fn recommend_applies_price_ceiling() {
    with_database(|| {
        assert_eq!(seed::run().exit_code, 0);

        let result = recommend::run(RecommendArgs {
            gear: "gear-roland-fa06".to_string(),
            max_price: Some("150".to_string()),
            ..RecommendArgs::default()
        });
        assert_eq!(result.exit_code, 0, "unexpected output: {}", result.output);

        let payload = parse_payload(&result.output);
        let matches = payload["data"]["matches"].as_array().cloned().unwrap_or_default();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0]["case_id"], "case-roland-cb61rl");
    });
}

#[test]
fn recommend_reports_unknown_gear_and_bad_prices() {
    with_database(|| {
        let missing = recommend::run(RecommendArgs {
            gear: "gear-does-not-exist".to_string(),
            ..RecommendArgs::default()
        });
        let missing_payload = parse_payload(&missing.output);
        assert_eq!(missing.exit_code, 6);
        assert_eq!(missing_payload["error_class"], "not_found");

        let bad_price = recommend::run(RecommendArgs {
            gear: "gear-roland-fa06".to_string(),
            max_price: Some("cheap".to_string()),
            ..RecommendArgs::default()
        });
        let bad_price_payload = parse_payload(&bad_price.output);
        assert_eq!(bad_price.exit_code, 2);
        assert_eq!(bad_price_payload["error_class"], "invalid_argument");
    });
}

#[test]
fn alternatives_never_include_the_reference_case() {
    with_database(|| {
        assert_eq!(seed::run().exit_code, 0);

        let result = alternatives::run("gear-roland-fa06", "case-gator-gkpe61", None);
        assert_eq!(result.exit_code, 0, "unexpected output: {}", result.output);

        let payload = parse_payload(&result.output);
        let alternatives = payload["data"]["alternatives"].as_array().cloned().unwrap_or_default();
        assert_eq!(alternatives.len(), 2);
        assert!(alternatives.iter().all(|m| m["case_id"] != "case-gator-gkpe61"));

        let unknown = alternatives::run("gear-roland-fa06", "case-does-not-exist", None);
        assert_eq!(unknown.exit_code, 6);
        assert_eq!(parse_payload(&unknown.output)["error_class"], "not_found");
    });
}

#[test]
fn score_returns_breakdown_for_a_pair() {
    with_database(|| {
        assert_eq!(seed::run().exit_code, 0);

        let fits = parse_payload(&score::run("gear-elektron-digitakt", "case-analog-pulse").output);
        let too_small = parse_payload(&score::run("gear-roland-fa06", "case-pelican-1200").output);

        assert_eq!(fits["status"], "ok");
        assert!(fits["data"]["score"].as_u64().unwrap_or(0) > 0);
        assert_eq!(fits["data"]["breakdown"]["fit"]["quality"], "ideal");
        assert_eq!(too_small["data"]["score"], 0);
        assert_eq!(too_small["data"]["label"], "minimal");
    });
}

#[test]
fn feedback_without_reviews_reports_no_data() {
    with_database(|| {
        assert_eq!(seed::run().exit_code, 0);

        let pair = parse_payload(&feedback::run("gear-roland-fa06", Some("case-gator-gkpe61")).output);
        let top = parse_payload(&feedback::run("gear-roland-fa06", None).output);

        assert_eq!(pair["status"], "ok");
        assert_eq!(pair["data"]["summary"]["overall"]["status"], "no_data");
        assert_eq!(pair["data"]["records"], Value::Array(Vec::new()));
        assert_eq!(top["data"]["top_rated"], Value::Array(Vec::new()));
    });
}

#[test]
fn cache_sweep_keeps_fresh_entries() {
    with_database(|| {
        assert_eq!(seed::run().exit_code, 0);
        let warmed = recommend::run(RecommendArgs {
            gear: "gear-fender-strat".to_string(),
            ..RecommendArgs::default()
        });
        assert_eq!(warmed.exit_code, 0);

        let sweep = parse_payload(&cache_sweep::run(None).output);
        let cleared = parse_payload(&cache_sweep::run(Some("case_candidates")).output);

        assert_eq!(sweep["data"]["expired_removed"], 0);
        assert_eq!(cleared["data"]["namespace_removed"], 1);
    });
}

#[test]
fn config_attributes_env_sources() {
    with_env(&[("GEARFIT_MATCHING_MAX_LIMIT", "40")], || {
        let result = config::run();
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        let entries = payload["data"].as_array().cloned().unwrap_or_default();
        let max_limit = entries
            .iter()
            .find(|entry| entry["key"] == "matching.max_limit")
            .cloned()
            .unwrap_or(Value::Null);

        assert_eq!(max_limit["value"], "40");
        assert_eq!(max_limit["source"], "env (GEARFIT_MATCHING_MAX_LIMIT)");
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).unwrap_or_else(|error| panic!("invalid JSON output {output}: {error}"))
}

/// Runs against a fresh on-disk database so consecutive commands share state.
fn with_database(test_fn: impl FnOnce()) {
    let dir = tempfile::tempdir().expect("tempdir");
    let url = format!("sqlite://{}", dir.path().join("gearfit.db").display());
    with_env(&[("GEARFIT_DATABASE_URL", url.as_str())], test_fn);
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "GEARFIT_DATABASE_URL",
        "GEARFIT_DATABASE_MAX_CONNECTIONS",
        "GEARFIT_DATABASE_TIMEOUT_SECS",
        "GEARFIT_MATCHING_DEFAULT_LIMIT",
        "GEARFIT_MATCHING_MAX_LIMIT",
        "GEARFIT_MATCHING_PADDING",
        "GEARFIT_MATCHING_DIVERSIFY_ALTERNATIVES",
        "GEARFIT_CACHE_ENABLED",
        "GEARFIT_CACHE_DEFAULT_TTL_SECS",
        "GEARFIT_CACHE_STATIC_TTL_SECS",
        "GEARFIT_CACHE_SEARCH_TTL_SECS",
        "GEARFIT_CACHE_PRICING_TTL_SECS",
        "GEARFIT_CACHE_LOOKUP_TIMEOUT_SECS",
        "GEARFIT_LOGGING_LEVEL",
        "GEARFIT_LOGGING_FORMAT",
        "GEARFIT_LOG_LEVEL",
        "GEARFIT_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
