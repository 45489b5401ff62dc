use crate::commands::{open_pool, CommandContext, CommandResult};

pub fn run() -> CommandResult {
    let context = match CommandContext::prepare("migrate") {
        Ok(context) => context,
        Err(result) => return result,
    };

    context.execute("migrate", |config| async move {
        let pool = open_pool(&config).await?;
        pool.close().await;
        Ok(CommandResult::success("migrate", "applied pending migrations"))
    })
}
