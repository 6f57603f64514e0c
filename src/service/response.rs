//! JSON views handed to the calling layer. Costs become fixed-precision
//! strings here and nowhere else.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::core::bundle::CodeBundle;
use crate::core::config::AppConfig;
use crate::core::error::AssistError;
use crate::core::session::{RequestTokens, Session, UsageReport};
use crate::providers::DEFAULT_PROVIDER;

use super::analysis::Analysis;

pub fn format_primary(amount: f64) -> String {
    format!("{amount:.6}")
}

pub fn format_secondary(amount: f64) -> String {
    format!("{amount:.2}")
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostView {
    pub usd: String,
    pub secondary: String,
    pub currency: String,
}

impl CostView {
    pub fn new(primary: f64, secondary: f64, currency: &str) -> Self {
        Self {
            usd: format_primary(primary),
            secondary: format_secondary(secondary),
            currency: currency.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestUsageView {
    pub tokens: RequestTokens,
    pub cost: CostView,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionTotalsView {
    pub requests: u64,
    pub total_tokens: u64,
    pub cost: CostView,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageReportView {
    pub session_id: String,
    pub request: RequestUsageView,
    pub session: SessionTotalsView,
}

impl UsageReportView {
    pub fn new(report: &UsageReport, currency: &str) -> Self {
        let totals = &report.session_totals;
        Self {
            session_id: report.session_id.clone(),
            request: RequestUsageView {
                tokens: report.request_tokens,
                cost: CostView::new(
                    report.request_cost.primary,
                    report.request_cost.secondary,
                    currency,
                ),
            },
            session: SessionTotalsView {
                requests: totals.requests,
                total_tokens: totals.total_tokens,
                cost: CostView::new(
                    totals.total_cost_primary,
                    totals.total_cost_secondary,
                    currency,
                ),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditResponse {
    pub success: bool,
    #[serde(flatten)]
    pub bundle: CodeBundle,
    pub usage: UsageReportView,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyzeResponse {
    pub success: bool,
    #[serde(flatten)]
    pub analysis: Analysis,
    pub usage: UsageReportView,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUsageView {
    pub session_id: String,
    pub model: String,
    pub requests: u64,
    pub tokens: RequestTokens,
    pub cost: CostView,
    pub average_tokens_per_request: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SessionUsageView {
    pub fn new(session: &Session, currency: &str) -> Self {
        Self {
            session_id: session.id.clone(),
            model: session.model.clone(),
            requests: session.requests,
            tokens: RequestTokens::new(session.total_input_tokens, session.total_output_tokens),
            cost: CostView::new(
                session.total_cost_primary,
                session.total_cost_secondary,
                currency,
            ),
            average_tokens_per_request: session.average_tokens_per_request(),
            created_at: session.created_at,
            updated_at: session.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AckResponse {
    pub success: bool,
    pub message: String,
}

impl AckResponse {
    pub fn cleared(session_id: &str) -> Self {
        Self {
            success: true,
            message: format!("Usage cleared for session {session_id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub provider: String,
    pub model: String,
    pub analyze_model: String,
    pub api_key_configured: bool,
    pub currency: String,
    pub exchange_rate: f64,
    pub sessions: usize,
}

impl HealthResponse {
    /// Health as far as the configuration alone can tell, with no provider
    /// built and no sessions recorded.
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            status: "ok".to_string(),
            provider: DEFAULT_PROVIDER.to_string(),
            model: config.edit.model.to_string(),
            analyze_model: config.analyze.model.to_string(),
            api_key_configured: config.has_api_key(),
            currency: config.currency.code.clone(),
            exchange_rate: config.currency.rate,
            sessions: 0,
        }
    }
}

/// Failure body. A decode failure carries the unchanged fallback bundle so
/// the client never loses its working code.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub details: String,
    #[serde(flatten)]
    pub fallback: Option<CodeBundle>,
}

impl ErrorResponse {
    pub fn from_error(err: &AssistError) -> Self {
        Self {
            success: false,
            error: err.kind().label().to_string(),
            details: err.to_string(),
            fallback: err.fallback_bundle().cloned(),
        }
    }
}
