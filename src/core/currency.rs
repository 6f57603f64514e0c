use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

pub const DEFAULT_CURRENCY_CODE: &str = "THB";
pub const DEFAULT_EXCHANGE_RATE: f64 = 33.50;

/// Converts USD amounts into the secondary display currency.
///
/// The rate is real-world data that goes stale, so it can be replaced at
/// runtime through [`CurrencyConverter::set_rate`]; readers never block.
#[derive(Debug)]
pub struct CurrencyConverter {
    rate_bits: AtomicU64,
    code: RwLock<String>,
}

impl Default for CurrencyConverter {
    fn default() -> Self {
        Self::new(DEFAULT_CURRENCY_CODE, DEFAULT_EXCHANGE_RATE)
    }
}

impl CurrencyConverter {
    pub fn new(code: &str, rate: f64) -> Self {
        let rate = if is_valid_rate(rate) {
            rate
        } else {
            tracing::warn!(rate, "invalid exchange rate, using default");
            DEFAULT_EXCHANGE_RATE
        };
        Self {
            rate_bits: AtomicU64::new(rate.to_bits()),
            code: RwLock::new(code.to_string()),
        }
    }

    pub fn rate(&self) -> f64 {
        f64::from_bits(self.rate_bits.load(Ordering::Acquire))
    }

    pub fn code(&self) -> String {
        self.code
            .read()
            .map(|c| c.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    pub fn to_secondary(&self, primary: f64) -> f64 {
        primary * self.rate()
    }

    /// Returns false and keeps the current rate when `rate` is not a
    /// positive finite number.
    pub fn set_rate(&self, rate: f64) -> bool {
        if !is_valid_rate(rate) {
            tracing::warn!(rate, "rejected exchange rate update");
            return false;
        }
        let previous = f64::from_bits(self.rate_bits.swap(rate.to_bits(), Ordering::AcqRel));
        tracing::info!(previous, rate, "exchange rate updated");
        true
    }

    pub fn set_code(&self, code: &str) {
        match self.code.write() {
            Ok(mut c) => *c = code.to_string(),
            Err(poisoned) => *poisoned.into_inner() = code.to_string(),
        }
    }
}

fn is_valid_rate(rate: f64) -> bool {
    rate.is_finite() && rate > 0.0
}
