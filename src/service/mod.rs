//! Edit and analysis flows: validate, call the provider, charge the
//! session, decode.

pub mod analysis;
pub mod prompt;
pub mod request;
pub mod response;


use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use crate::core::bundle::CodeBundle;
use crate::core::config::{AppConfig, CurrencyConfig, RequestProfile};
use crate::core::currency::CurrencyConverter;
use crate::core::error::{AssistError, ConfigError};
use crate::core::message::{ChatMessage, HistoryEntry};
use crate::core::model::PricingTable;
use crate::core::provider::{CompletionRequest, CompletionResponse, Provider};
use crate::core::session::{Session, UsageReport};
use crate::ledger::UsageLedger;
use crate::normalize::{normalize_with_path, DecodePath};
use crate::providers::create_provider;
use crate::storage::MemoryUsageStore;

use analysis::{decode_analysis, Analysis};
use prompt::{build_analysis_prompt, build_edit_messages, EDIT_SYSTEM_PROMPT};
use request::check_session_id;
use response::{AnalyzeResponse, EditResponse, HealthResponse, SessionUsageView, UsageReportView};

const EDIT_SESSION_PREFIX: &str = "session";
const ANALYZE_SESSION_PREFIX: &str = "analyze";

#[derive(Debug, Clone)]
pub struct EditOutcome {
    pub bundle: CodeBundle,
    pub usage: UsageReport,
    pub decode_path: DecodePath,
}

#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub analysis: Analysis,
    pub usage: UsageReport,
}

pub struct AssistService {
    provider: Arc<dyn Provider>,
    ledger: UsageLedger,
    config: AppConfig,
    ids: SessionIds,
}

impl AssistService {
    pub fn new(provider: Arc<dyn Provider>, ledger: UsageLedger, config: AppConfig) -> Self {
        Self {
            provider,
            ledger,
            config,
            ids: SessionIds::default(),
        }
    }

    /// In-memory ledger priced and converted per `config`.
    pub fn with_provider(provider: Arc<dyn Provider>, config: AppConfig) -> Self {
        let ledger = UsageLedger::new(
            Arc::new(MemoryUsageStore::new()),
            PricingTable::with_overrides(&config.pricing, &config.fallback_model),
            Arc::new(CurrencyConverter::new(
                &config.currency.code,
                config.currency.rate,
            )),
        );
        Self::new(provider, ledger, config)
    }

    pub fn from_config(config: AppConfig) -> Result<Self, AssistError> {
        let provider = create_provider(&config)?;
        Ok(Self::with_provider(provider, config))
    }

    /// One edit round: `history` plus the current code go to the model, the
    /// reply is normalized against `current`. A reply that cannot be decoded
    /// at all still charges the session, and the error carries `current`
    /// back unchanged.
    pub async fn submit_edit(
        &self,
        history: &[HistoryEntry],
        current: &CodeBundle,
        session_id: Option<&str>,
    ) -> Result<EditOutcome, AssistError> {
        let session_id = self.resolve_session_id(session_id, EDIT_SESSION_PREFIX)?;
        let fallback = current.as_fallback();

        let request = completion_request(
            &self.config.edit,
            Some(EDIT_SYSTEM_PROMPT.to_string()),
            build_edit_messages(history, current),
        );
        let response = self.complete(&session_id, &request).await?;
        let usage = self.charge(&session_id, &request, &response);

        match normalize_with_path(&response.text, &fallback) {
            Ok((bundle, decode_path)) => {
                tracing::debug!(session_id = %session_id, ?decode_path, "edit decoded");
                Ok(EditOutcome {
                    bundle,
                    usage,
                    decode_path,
                })
            }
            Err(source) => {
                tracing::error!(
                    session_id = %session_id,
                    error = %source,
                    output_len = response.text.len(),
                    "model output could not be decoded"
                );
                Err(AssistError::Decode { source, fallback })
            }
        }
    }

    pub async fn analyze(
        &self,
        html: &str,
        css: &str,
        js: &str,
        session_id: Option<&str>,
    ) -> Result<AnalysisOutcome, AssistError> {
        let session_id = self.resolve_session_id(session_id, ANALYZE_SESSION_PREFIX)?;

        let request = completion_request(
            &self.config.analyze,
            None,
            vec![ChatMessage::user(build_analysis_prompt(html, css, js))],
        );
        let response = self.complete(&session_id, &request).await?;
        let usage = self.charge(&session_id, &request, &response);

        let analysis = decode_analysis(&response.text).map_err(|e| {
            tracing::error!(session_id = %session_id, error = %e, "analysis output could not be decoded");
            AssistError::Analysis(e)
        })?;

        Ok(AnalysisOutcome { analysis, usage })
    }

    pub fn get_usage(&self, session_id: &str) -> Result<Session, AssistError> {
        self.ledger
            .get_stats(session_id)
            .ok_or_else(|| AssistError::SessionNotFound(session_id.to_string()))
    }

    pub fn clear_usage(&self, session_id: &str) {
        self.ledger.clear(session_id);
    }

    /// Applies a new exchange rate and currency code without a restart.
    pub fn reload_currency(&self, currency: &CurrencyConfig) -> Result<(), AssistError> {
        let converter = self.ledger.currency();
        if !converter.set_rate(currency.rate) {
            return Err(ConfigError::Invalid(format!(
                "exchange rate must be a positive number, got {}",
                currency.rate
            ))
            .into());
        }
        converter.set_code(&currency.code);
        Ok(())
    }

    /// Config health plus the live provider, exchange rate and session
    /// count.
    pub fn health(&self) -> HealthResponse {
        let currency = self.ledger.currency();
        HealthResponse {
            provider: self.provider.name().to_string(),
            currency: currency.code(),
            exchange_rate: currency.rate(),
            sessions: self.ledger.session_count(),
            ..HealthResponse::from_config(&self.config)
        }
    }

    pub fn edit_response(&self, outcome: &EditOutcome) -> EditResponse {
        EditResponse {
            success: true,
            bundle: outcome.bundle.clone(),
            usage: self.usage_report_view(&outcome.usage),
        }
    }

    pub fn analyze_response(&self, outcome: &AnalysisOutcome) -> AnalyzeResponse {
        AnalyzeResponse {
            success: true,
            analysis: outcome.analysis.clone(),
            usage: self.usage_report_view(&outcome.usage),
        }
    }

    pub fn usage_view(&self, session_id: &str) -> Result<SessionUsageView, AssistError> {
        let session = self.get_usage(session_id)?;
        Ok(SessionUsageView::new(&session, &self.ledger.currency().code()))
    }

    pub fn ledger(&self) -> &UsageLedger {
        &self.ledger
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    fn usage_report_view(&self, report: &UsageReport) -> UsageReportView {
        UsageReportView::new(report, &self.ledger.currency().code())
    }

    fn resolve_session_id(
        &self,
        session_id: Option<&str>,
        prefix: &str,
    ) -> Result<String, AssistError> {
        Ok(match check_session_id(session_id)? {
            Some(id) => id.to_string(),
            None => self.ids.next(prefix),
        })
    }

    async fn complete(
        &self,
        session_id: &str,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, AssistError> {
        self.provider.complete(request).await.map_err(|e| {
            tracing::warn!(
                session_id,
                provider = self.provider.name(),
                kind = e.kind().label(),
                error = %e,
                "completion failed"
            );
            AssistError::Provider(e)
        })
    }

    fn charge(
        &self,
        session_id: &str,
        request: &CompletionRequest,
        response: &CompletionResponse,
    ) -> UsageReport {
        self.ledger.record(
            session_id,
            response.usage.input_tokens,
            response.usage.output_tokens,
            &request.model.0,
        )
    }
}

fn completion_request(
    profile: &RequestProfile,
    system_prompt: Option<String>,
    messages: Vec<ChatMessage>,
) -> CompletionRequest {
    CompletionRequest {
        model: profile.model.clone(),
        max_output_tokens: profile.max_tokens,
        system_prompt,
        messages,
    }
}

/// Issues `<prefix>_<unix-millis>` ids, bumping the millisecond when two
/// requests land in the same one so generated ids never collide.
#[derive(Debug, Default)]
struct SessionIds {
    last_millis: AtomicI64,
}

impl SessionIds {
    fn next(&self, prefix: &str) -> String {
        let now = Utc::now().timestamp_millis();
        let previous = self
            .last_millis
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or_else(|last| last);
        format!("{prefix}_{}", now.max(previous + 1))
    }
}
