use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

pub const HAIKU_4_5: &str = "claude-haiku-4-5-20251001";
pub const SONNET_4_5: &str = "claude-sonnet-4-5-20250929";
pub const OPUS_4_1: &str = "claude-opus-4-1-20250514";

#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct ModelId(pub String);

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ModelId {
    fn from(s: &str) -> Self {
        ModelId(s.to_string())
    }
}

/// USD per one million tokens.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricingEntry {
    #[serde(rename = "input")]
    pub input_rate: f64,
    #[serde(rename = "output")]
    pub output_rate: f64,
}

impl PricingEntry {
    pub const fn new(input_rate: f64, output_rate: f64) -> Self {
        Self {
            input_rate,
            output_rate,
        }
    }

    /// Unrounded cost in the primary currency.
    pub fn cost(&self, input_tokens: u64, output_tokens: u64) -> f64 {
        let input_cost = (input_tokens as f64 / 1_000_000.0) * self.input_rate;
        let output_cost = (output_tokens as f64 / 1_000_000.0) * self.output_rate;
        input_cost + output_cost
    }
}

/// Claude tiers known at build time.
pub fn builtin_pricing() -> HashMap<ModelId, PricingEntry> {
    let mut m = HashMap::new();
    m.insert(ModelId::from(HAIKU_4_5), PricingEntry::new(0.80, 4.00));
    m.insert(ModelId::from(SONNET_4_5), PricingEntry::new(3.00, 15.00));
    m.insert(ModelId::from(OPUS_4_1), PricingEntry::new(15.00, 75.00));
    m
}

#[derive(Debug, Clone)]
pub struct PricingTable {
    entries: HashMap<ModelId, PricingEntry>,
    fallback: PricingEntry,
}

impl Default for PricingTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PricingTable {
    pub fn builtin() -> Self {
        let entries = builtin_pricing();
        let fallback = entries[&ModelId::from(HAIKU_4_5)];
        Self { entries, fallback }
    }

    /// Builtins overlaid with `overrides`; the fallback tier is the entry for
    /// `fallback_model`, or the builtin haiku rate when that id is unknown.
    pub fn with_overrides(
        overrides: &HashMap<String, PricingEntry>,
        fallback_model: &str,
    ) -> Self {
        let mut table = Self::builtin();
        for (id, entry) in overrides {
            table.entries.insert(ModelId(id.clone()), *entry);
        }
        if let Some(entry) = table.entries.get(&ModelId(fallback_model.to_string())) {
            table.fallback = *entry;
        } else {
            tracing::warn!(
                fallback_model,
                "fallback model has no pricing entry, using builtin baseline"
            );
        }
        table
    }

    /// Never fails: unknown ids are charged at the fallback tier.
    pub fn rate_for(&self, model: &str) -> PricingEntry {
        match self.entries.get(&ModelId(model.to_string())) {
            Some(entry) => *entry,
            None => {
                tracing::debug!(model, "unknown model, using fallback pricing tier");
                self.fallback
            }
        }
    }

    pub fn is_known(&self, model: &str) -> bool {
        self.entries.contains_key(&ModelId(model.to_string()))
    }

    pub fn fallback(&self) -> PricingEntry {
        self.fallback
    }
}
