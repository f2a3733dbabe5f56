use chrono::Utc;
use snapbill_core::analytics::{aggregate, AnalyticsWindow, SalesHistory};
use snapbill_core::config::{AppConfig, LoadOptions};
use snapbill_core::domain::owner::OwnerId;
use snapbill_db::{
    migrations, BillRepository, InventoryRepository, SqlBillRepository, SqlInventoryRepository,
};

use crate::commands::{with_pool, CommandResult};

/// Prints the same summary `GET /analytics/dashboard` serves. Unlike the HTTP
/// route, storage failures are reported instead of degrading to an empty
/// summary.
pub fn run(owner: &str, days: Option<u32>) -> CommandResult {
    let owner = owner.trim();
    if owner.is_empty() {
        return CommandResult::failure("dashboard", "invalid_argument", "owner must not be empty", 2);
    }

    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "dashboard",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let days = days.unwrap_or(config.assistant.analytics_window_days);
    let owner = OwnerId(owner.to_string());
    let window = AnalyticsWindow::ending_at(Utc::now(), days);

    let result = with_pool(&config, |pool| async move {
        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let bills = SqlBillRepository::new(pool.clone());
        let inventory = SqlInventoryRepository::new(pool);
        let history = async {
            Ok::<_, snapbill_db::RepositoryError>(SalesHistory {
                bills: bills.totals_since(&owner, window.since).await?,
                sale_lines: bills.sale_lines_since(&owner, window.since).await?,
                inventory_count: inventory.count_for_owner(&owner).await?,
            })
        }
        .await
        .map_err(|error| ("db_query", error.to_string(), 6u8))?;

        Ok(aggregate(&history, &window))
    });

    match result {
        Ok(summary) => match serde_json::to_string_pretty(&summary) {
            Ok(output) => CommandResult { exit_code: 0, output },
            Err(error) => CommandResult::failure("dashboard", "serialization", error.to_string(), 7),
        },
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("dashboard", error_class, message, exit_code)
        }
    }
}
