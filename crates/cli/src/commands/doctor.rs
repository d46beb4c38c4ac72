use queuebot_core::config::{AppConfig, BackendKind, LoadOptions};
use queuebot_slack::commands::CommandRegistry;
use queuebot_worker::bootstrap_with_config;
use serde::Serialize;

use crate::commands::config::detect_config_path;
use crate::commands::CommandResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

impl DoctorCheck {
    fn skipped(name: &'static str, reason: &str) -> Self {
        Self { name, status: CheckStatus::Skipped, details: format!("skipped because {reason}") }
    }
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

/// Exits `1` when any check fails.
pub fn run(json_output: bool) -> CommandResult {
    let report = build_report();
    let exit_code = if report.overall_status == CheckStatus::Pass { 0 } else { 1 };

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report() -> DoctorReport {
    let mut checks = vec![check_config_file()];

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            let registry = check_app_registry(&config);
            let registry_ok = registry.status == CheckStatus::Pass;
            checks.push(registry);
            if registry_ok {
                checks.push(check_backend(config));
            } else {
                checks.push(DoctorCheck::skipped(
                    "backend_readiness",
                    "the registry did not build",
                ));
            }
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.push(DoctorCheck::skipped("app_registry", "configuration did not load"));
            checks.push(DoctorCheck::skipped("backend_readiness", "configuration did not load"));
        }
    }

    let any_failed = checks.iter().any(|check| check.status == CheckStatus::Fail);
    let overall_status = if any_failed { CheckStatus::Fail } else { CheckStatus::Pass };
    let summary = if any_failed {
        "doctor: one or more readiness checks failed".to_string()
    } else {
        "doctor: all readiness checks passed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_config_file() -> DoctorCheck {
    let details = match detect_config_path() {
        Some(path) => format!("using `{}`", path.display()),
        None => "no config file found; using environment and defaults".to_string(),
    };
    DoctorCheck { name: "config_file", status: CheckStatus::Pass, details }
}

fn check_app_registry(config: &AppConfig) -> DoctorCheck {
    match CommandRegistry::from_app_names(&config.bot.apps, &config.bot.command_prefix) {
        Ok(registry) => DoctorCheck {
            name: "app_registry",
            status: CheckStatus::Pass,
            details: format!(
                "{} app(s) registered {} keyword(s): {}",
                config.bot.apps.len(),
                registry.len(),
                registry.keywords().join(", ")
            ),
        },
        Err(error) => DoctorCheck {
            name: "app_registry",
            status: CheckStatus::Fail,
            details: error.to_string(),
        },
    }
}

/// Only the local backend is opened; AWS credentials resolve lazily on the
/// first SDK call so there is nothing to probe offline.
fn check_backend(config: AppConfig) -> DoctorCheck {
    if config.backend.kind == BackendKind::Aws {
        return DoctorCheck {
            name: "backend_readiness",
            status: CheckStatus::Skipped,
            details: format!("aws backend targets queue `{}`", config.queue.url),
        };
    }

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return DoctorCheck {
                name: "backend_readiness",
                status: CheckStatus::Fail,
                details: format!("failed to initialize async runtime: {error}"),
            };
        }
    };

    let database_url = config.backend.database_url.clone();
    match runtime.block_on(bootstrap_with_config(config)) {
        Ok(_) => DoctorCheck {
            name: "backend_readiness",
            status: CheckStatus::Pass,
            details: format!("opened and migrated `{database_url}`"),
        },
        Err(error) => DoctorCheck {
            name: "backend_readiness",
            status: CheckStatus::Fail,
            details: error.to_string(),
        },
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
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
