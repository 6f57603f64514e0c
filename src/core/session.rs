use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Accumulated usage for one editing session. Counters only grow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub requests: u64,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub total_cost_primary: f64,
    pub total_cost_secondary: f64,
    /// First model seen for this session.
    pub model: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(id: String, model: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            requests: 0,
            total_input_tokens: 0,
            total_output_tokens: 0,
            total_cost_primary: 0.0,
            total_cost_secondary: 0.0,
            model,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn total_tokens(&self) -> u64 {
        self.total_input_tokens
            .saturating_add(self.total_output_tokens)
    }

    pub fn average_tokens_per_request(&self) -> u64 {
        if self.requests == 0 {
            return 0;
        }
        (self.total_tokens() as f64 / self.requests as f64).round() as u64
    }

    pub fn apply(&mut self, tokens: &RequestTokens, cost: &RequestCost) -> SessionTotals {
        self.requests = self.requests.saturating_add(1);
        self.total_input_tokens = self.total_input_tokens.saturating_add(tokens.input);
        self.total_output_tokens = self.total_output_tokens.saturating_add(tokens.output);
        self.total_cost_primary += cost.primary;
        self.total_cost_secondary += cost.secondary;
        self.updated_at = Utc::now();
        self.totals()
    }

    pub fn totals(&self) -> SessionTotals {
        SessionTotals {
            requests: self.requests,
            total_tokens: self.total_tokens(),
            total_cost_primary: self.total_cost_primary,
            total_cost_secondary: self.total_cost_secondary,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestTokens {
    pub input: u64,
    pub output: u64,
    pub total: u64,
}

impl RequestTokens {
    pub fn new(input: u64, output: u64) -> Self {
        Self {
            input,
            output,
            total: input.saturating_add(output),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RequestCost {
    pub primary: f64,
    pub secondary: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionTotals {
    pub requests: u64,
    pub total_tokens: u64,
    pub total_cost_primary: f64,
    pub total_cost_secondary: f64,
}

/// Per-request figures plus the session totals right after the request was
/// applied. Returned once, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageReport {
    pub session_id: String,
    pub request_tokens: RequestTokens,
    pub request_cost: RequestCost,
    pub session_totals: SessionTotals,
}
