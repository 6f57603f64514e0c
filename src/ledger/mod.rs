//! Per-session token and cost accounting.


use std::sync::Arc;

use crate::core::currency::CurrencyConverter;
use crate::core::model::PricingTable;
use crate::core::session::{RequestCost, RequestTokens, Session, UsageReport};
use crate::storage::{MemoryUsageStore, UsageStore};

pub struct UsageLedger {
    store: Arc<dyn UsageStore>,
    pricing: PricingTable,
    currency: Arc<CurrencyConverter>,
}

impl UsageLedger {
    pub fn new(
        store: Arc<dyn UsageStore>,
        pricing: PricingTable,
        currency: Arc<CurrencyConverter>,
    ) -> Self {
        Self {
            store,
            pricing,
            currency,
        }
    }

    /// Builtin pricing, default exchange rate, process-local store.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryUsageStore::new()),
            PricingTable::builtin(),
            Arc::new(CurrencyConverter::default()),
        )
    }

    /// Charges one completed request to `session_id`, creating the session
    /// on first use. Unknown models are charged at the fallback tier.
    pub fn record(
        &self,
        session_id: &str,
        input_tokens: u64,
        output_tokens: u64,
        model: &str,
    ) -> UsageReport {
        let rate = self.pricing.rate_for(model);
        let primary = rate.cost(input_tokens, output_tokens);
        let cost = RequestCost {
            primary,
            secondary: self.currency.to_secondary(primary),
        };
        let tokens = RequestTokens::new(input_tokens, output_tokens);

        let row = self.store.upsert(
            session_id,
            &|| Session::new(session_id.to_string(), model.to_string()),
            &mut |session| {
                session.apply(&tokens, &cost);
            },
        );
        let session_totals = row.totals();

        tracing::info!(
            session_id,
            model,
            input_tokens,
            output_tokens,
            cost_usd = cost.primary,
            requests = session_totals.requests,
            session_cost_usd = session_totals.total_cost_primary,
            "recorded usage"
        );

        UsageReport {
            session_id: session_id.to_string(),
            request_tokens: tokens,
            request_cost: cost,
            session_totals,
        }
    }

    pub fn get_stats(&self, session_id: &str) -> Option<Session> {
        self.store.get(session_id)
    }

    /// Clearing an unknown session is not an error.
    pub fn clear(&self, session_id: &str) {
        if self.store.remove(session_id) {
            tracing::debug!(session_id, "cleared session usage");
        }
    }

    pub fn session_count(&self) -> usize {
        self.store.len()
    }

    pub fn pricing(&self) -> &PricingTable {
        &self.pricing
    }

    pub fn currency(&self) -> &CurrencyConverter {
        &self.currency
    }
}
