use std::time::Instant;

use crate::commands::CommandResult;
use billgate_billing::BillingClient;
use billgate_core::config::{AppConfig, LoadOptions};
use billgate_core::{is_operation_error, BackendError, BillingBackend, BillingMonth};
use serde::Serialize;
use serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum SmokeStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct SmokeCheck {
    name: &'static str,
    status: SmokeStatus,
    elapsed_ms: u64,
    message: String,
}

#[derive(Debug, Serialize)]
struct SmokeReport {
    command: &'static str,
    status: SmokeStatus,
    summary: String,
    total_elapsed_ms: u64,
    checks: Vec<SmokeCheck>,
}

const QUERY_CHECKS: [&str; 3] = ["backend_auth", "unpaid_query", "detailed_query"];

pub fn run(subscriber_no: &str, month: &BillingMonth) -> CommandResult {
    let started = Instant::now();
    let mut checks = Vec::new();

    let config = match timed_check(|| AppConfig::load_for_backend(LoadOptions::default())) {
        Ok((elapsed_ms, config)) => {
            checks.push(SmokeCheck {
                name: "config_validation",
                status: SmokeStatus::Pass,
                elapsed_ms,
                message: "backend configuration loaded and validated".to_string(),
            });
            config
        }
        Err((elapsed_ms, error)) => {
            checks.push(SmokeCheck {
                name: "config_validation",
                status: SmokeStatus::Fail,
                elapsed_ms,
                message: error.to_string(),
            });
            checks.extend(QUERY_CHECKS.into_iter().map(skipped));
            return finalize_report(checks, elapsed_since(started));
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            checks.push(failed(
                "backend_auth",
                0,
                format!("failed to initialize async runtime: {error}"),
            ));
            checks.extend(QUERY_CHECKS[1..].iter().copied().map(skipped));
            return finalize_report(checks, elapsed_since(started));
        }
    };

    let _entered = runtime.enter();
    let client = match BillingClient::new(&config.backend) {
        Ok(client) => client,
        Err(error) => {
            checks.push(failed("backend_auth", 0, format!("failed to build client: {error}")));
            checks.extend(QUERY_CHECKS[1..].iter().copied().map(skipped));
            return finalize_report(checks, elapsed_since(started));
        }
    };

    let auth_started = Instant::now();
    match runtime.block_on(client.acquire_token()) {
        Ok(_) => checks.push(SmokeCheck {
            name: "backend_auth",
            status: SmokeStatus::Pass,
            elapsed_ms: elapsed_since(auth_started),
            message: format!(
                "authenticated as `{}` against `{}`",
                config.backend.username, config.backend.base_url
            ),
        }),
        Err(error) => {
            checks.push(failed("backend_auth", elapsed_since(auth_started), error.to_string()));
            checks.extend(QUERY_CHECKS[1..].iter().copied().map(skipped));
            return finalize_report(checks, elapsed_since(started));
        }
    }

    let unpaid_started = Instant::now();
    let unpaid = runtime.block_on(client.query_unpaid_bills(subscriber_no));
    checks.push(query_check("unpaid_query", elapsed_since(unpaid_started), unpaid));

    let detailed_started = Instant::now();
    let detailed = runtime.block_on(client.query_bill_detailed(subscriber_no, month.as_str()));
    checks.push(query_check("detailed_query", elapsed_since(detailed_started), detailed));

    finalize_report(checks, elapsed_since(started))
}

fn query_check(
    name: &'static str,
    elapsed_ms: u64,
    result: Result<Value, BackendError>,
) -> SmokeCheck {
    match result {
        Ok(payload) if is_operation_error(&payload) => {
            let status = payload.get("status").and_then(Value::as_u64).unwrap_or_default();
            failed(name, elapsed_ms, format!("backend reported status {status}: {payload}"))
        }
        Ok(_) => SmokeCheck {
            name,
            status: SmokeStatus::Pass,
            elapsed_ms,
            message: "query succeeded".to_string(),
        },
        Err(error) => failed(name, elapsed_ms, error.to_string()),
    }
}

fn timed_check<T, E>(check: impl FnOnce() -> Result<T, E>) -> Result<(u64, T), (u64, E)> {
    let started = Instant::now();
    match check() {
        Ok(value) => Ok((elapsed_since(started), value)),
        Err(error) => Err((elapsed_since(started), error)),
    }
}

fn elapsed_since(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

fn failed(name: &'static str, elapsed_ms: u64, message: String) -> SmokeCheck {
    SmokeCheck { name, status: SmokeStatus::Fail, elapsed_ms, message }
}

fn skipped(name: &'static str) -> SmokeCheck {
    SmokeCheck {
        name,
        status: SmokeStatus::Skipped,
        elapsed_ms: 0,
        message: "skipped due previous failure".to_string(),
    }
}

fn finalize_report(checks: Vec<SmokeCheck>, total_elapsed_ms: u64) -> CommandResult {
    let passed = checks.iter().filter(|check| check.status == SmokeStatus::Pass).count();
    let total = checks.len();
    let failed = checks.iter().any(|check| check.status == SmokeStatus::Fail);

    let report = SmokeReport {
        command: "smoke",
        status: if failed { SmokeStatus::Fail } else { SmokeStatus::Pass },
        summary: format!("smoke: {passed}/{total} checks passed in {total_elapsed_ms}ms"),
        total_elapsed_ms,
        checks,
    };

    let human = report.summary.clone();
    let machine = serde_json::to_string(&report).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"smoke\",\"status\":\"fail\",\"summary\":\"serialization failed\",\"error\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    });

    CommandResult { exit_code: if failed { 6 } else { 0 }, output: format!("{human}\n{machine}") }
}
