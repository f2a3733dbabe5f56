use crate::commands::{with_pool, CommandResult};
use snapbill_core::config::{AppConfig, LoadOptions};
use snapbill_db::migrations;

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "migrate",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let result = with_pool(&config, |pool| async move {
        migrations::run_pending(&pool).await.map_err(|error| ("migration", error.to_string(), 5u8))
    });

    match result {
        Ok(()) => CommandResult::success("migrate", "applied pending migrations"),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("migrate", error_class, message, exit_code)
        }
    }
}
