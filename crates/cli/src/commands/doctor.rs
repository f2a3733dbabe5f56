use snapbill_core::config::{AppConfig, LoadOptions};
use snapbill_db::{migrations, ping};
use serde::Serialize;

use crate::commands::with_pool;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Warn,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> String {
    let report = build_report(AppConfig::load(LoadOptions::default()).map_err(|e| e.to_string()));

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report(config: Result<AppConfig, String>) -> DoctorReport {
    let mut checks = Vec::new();

    match config {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_language_provider(&config));
            checks.push(check_sms_gateway(&config));
            checks.push(check_database(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error,
            });
            for name in ["language_provider", "sms_gateway", "database_connectivity"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    // Warnings degrade features without blocking startup.
    let failed = checks
        .iter()
        .any(|check| matches!(check.status, CheckStatus::Fail | CheckStatus::Skipped));
    let (overall_status, summary) = if failed {
        (CheckStatus::Fail, "doctor: one or more readiness checks failed")
    } else if checks.iter().any(|check| check.status == CheckStatus::Warn) {
        (CheckStatus::Warn, "doctor: ready with degraded features")
    } else {
        (CheckStatus::Pass, "doctor: all readiness checks passed")
    };

    DoctorReport { overall_status, summary: summary.to_string(), checks }
}

fn check_language_provider(config: &AppConfig) -> DoctorCheck {
    if config.llm.api_key.is_some() {
        DoctorCheck {
            name: "language_provider",
            status: CheckStatus::Pass,
            details: format!(
                "api key set; candidate models: {}",
                config.llm.candidate_models.join(", ")
            ),
        }
    } else {
        DoctorCheck {
            name: "language_provider",
            status: CheckStatus::Warn,
            details: "no api key set; voice billing will return fallback replies".to_string(),
        }
    }
}

fn check_sms_gateway(config: &AppConfig) -> DoctorCheck {
    match (config.sms.enabled, config.sms.api_key.is_some()) {
        (true, true) => DoctorCheck {
            name: "sms_gateway",
            status: CheckStatus::Pass,
            details: "fast2sms delivery enabled".to_string(),
        },
        (true, false) => DoctorCheck {
            name: "sms_gateway",
            status: CheckStatus::Warn,
            details: "sms enabled without an api key; receipts go to the mock gateway".to_string(),
        },
        (false, _) => DoctorCheck {
            name: "sms_gateway",
            status: CheckStatus::Pass,
            details: "sms disabled; receipts go to the mock gateway".to_string(),
        },
    }
}

fn check_database(config: &AppConfig) -> DoctorCheck {
    let result = with_pool(config, |pool| async move {
        ping(&pool).await.map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;
        let known = migrations::MIGRATOR
            .iter()
            .filter(|migration| migration.migration_type.is_up_migration())
            .count();
        Ok(known)
    });

    match result {
        Ok(known) => DoctorCheck {
            name: "database_connectivity",
            status: CheckStatus::Pass,
            details: format!("connected using `{}` ({known} known migration(s))", config.database.url),
        },
        Err((_, message, _)) => DoctorCheck {
            name: "database_connectivity",
            status: CheckStatus::Fail,
            details: format!("failed to connect to database: {message}"),
        },
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Warn => "warn",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
