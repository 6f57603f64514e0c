use anyhow::Result;
use serde::Serialize;
use std::process::ExitCode;

use crate::core::error::AssistError;
use crate::core::session::UsageReport;
use crate::service::response::{format_primary, format_secondary, ErrorResponse};

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Prints the error body on stdout, a one-line summary on stderr, and maps
/// the failure kind onto the process exit code.
pub fn report_error(err: &AssistError) -> ExitCode {
    let body = ErrorResponse::from_error(err);
    match serde_json::to_string_pretty(&body) {
        Ok(json) => println!("{json}"),
        Err(e) => tracing::error!(error = %e, "failed to render error body"),
    }
    eprintln!("\x1b[31m{}: {err}\x1b[0m", err.kind().label());
    ExitCode::from(exit_status(err))
}

pub fn exit_status(err: &AssistError) -> u8 {
    u8::try_from(err.kind().exit_code()).unwrap_or(1)
}

/// One-line usage footer for interactive output.
pub fn usage_line(report: &UsageReport, currency: &str) -> String {
    let tokens = &report.request_tokens;
    let totals = &report.session_totals;
    format!(
        "Tokens: {} in / {} out | Cost: ${} ({} {}) | Session: {} requests, ${}",
        tokens.input,
        tokens.output,
        format_primary(report.request_cost.primary),
        format_secondary(report.request_cost.secondary),
        currency,
        totals.requests,
        format_primary(totals.total_cost_primary),
    )
}
