use std::sync::Arc;

use gearfit_core::cache::ResultCache;
use gearfit_db::repositories::SqlCacheRepository;
use serde::Serialize;

use crate::commands::{application_failure, open_pool, CommandContext, CommandResult};

#[derive(Debug, Serialize)]
struct SweepOutput {
    expired_removed: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<String>,
    namespace_removed: u64,
}

pub fn run(namespace: Option<&str>) -> CommandResult {
    let context = match CommandContext::prepare("cache-sweep") {
        Ok(context) => context,
        Err(result) => return result,
    };
    let namespace = namespace.map(str::trim).filter(|ns| !ns.is_empty()).map(str::to_string);

    context.execute("cache-sweep", |config| async move {
        let pool = open_pool(&config).await?;
        let cache =
            ResultCache::from_config(Arc::new(SqlCacheRepository::new(pool.clone())), &config.cache);

        let expired_removed = cache.clear_expired().await.map_err(application_failure)?;
        let namespace_removed = match &namespace {
            Some(namespace) => cache.clear_namespace(namespace).await.map_err(application_failure)?,
            None => 0,
        };
        pool.close().await;

        Ok(CommandResult::success_with_data(
            "cache-sweep",
            format!("removed {expired_removed} expired and {namespace_removed} namespaced entries"),
            Some(SweepOutput { expired_removed, namespace, namespace_removed }),
        ))
    })
}
