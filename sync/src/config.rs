//! Controller configuration.

use std::time::Duration;

use ammsim_quote::QuoteContext;

/// Configuration for a synchronization controller.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Simulated oracle latency before a quote is applied.
    pub quote_latency: Duration,
    /// Simulated confirmation latency of a submission.
    pub submit_latency: Duration,
    /// Form the controller drives.
    pub context: QuoteContext,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            quote_latency: Duration::from_millis(500),
            submit_latency: Duration::from_millis(1500),
            context: QuoteContext::Swap,
        }
    }
}

impl ControllerConfig {
    /// Configuration with no simulated latency.
    pub fn immediate(context: QuoteContext) -> Self {
        Self {
            quote_latency: Duration::ZERO,
            submit_latency: Duration::ZERO,
            context,
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(ms) = std::env::var("AMMSIM_QUOTE_LATENCY_MS") {
            if let Ok(ms) = ms.parse() {
                config.quote_latency = Duration::from_millis(ms);
            }
        }

        if let Ok(ms) = std::env::var("AMMSIM_SUBMIT_LATENCY_MS") {
            if let Ok(ms) = ms.parse() {
                config.submit_latency = Duration::from_millis(ms);
            }
        }

        config
    }

    /// Drive a specific form.
    pub fn with_context(mut self, context: QuoteContext) -> Self {
        self.context = context;
        self
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.quote_latency > Duration::from_secs(60) {
            return Err("Quote latency cannot exceed 60s".to_string());
        }

        if self.submit_latency > Duration::from_secs(60) {
            return Err("Submit latency cannot exceed 60s".to_string());
        }

        Ok(())
    }
}
