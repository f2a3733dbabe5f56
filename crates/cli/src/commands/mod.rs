pub mod config;
pub mod dashboard;
pub mod doctor;
pub mod migrate;

use std::future::Future;

use serde::Serialize;
use snapbill_core::config::AppConfig;
use snapbill_db::{connect_with_config, DbPool};

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
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
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
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

/// `(error_class, message, exit_code)` as reported through [`CommandResult::failure`].
pub type CommandFailure = (&'static str, String, u8);

/// Runs `work` against a freshly connected pool on a single-threaded runtime
/// and closes the pool afterwards, whatever the outcome.
pub fn with_pool<T, F, Fut>(config: &AppConfig, work: F) -> Result<T, CommandFailure>
where
    F: FnOnce(DbPool) -> Fut,
    Fut: Future<Output = Result<T, CommandFailure>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(
        |error| ("runtime_init", format!("failed to initialize async runtime: {error}"), 3u8),
    )?;

    runtime.block_on(async {
        let pool = connect_with_config(&config.database)
            .await
            .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;
        let outcome = work(pool.clone()).await;
        pool.close().await;
        outcome
    })
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}
