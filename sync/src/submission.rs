//! Simulated form submissions.

use ammsim_quote::QuoteContext;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::state::QuoteSnapshot;

/// Record of a simulated swap or liquidity add.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionReceipt {
    /// Unique receipt ID.
    pub id: Uuid,
    /// Form that was submitted.
    pub context: QuoteContext,
    pub from_token: String,
    pub to_token: String,
    pub amount_from: String,
    pub amount_to: String,
    /// Pool share at submission, for liquidity adds.
    pub pool_share_estimate: Option<Decimal>,
    /// When the submission was confirmed.
    pub submitted_at: DateTime<Utc>,
}

impl SubmissionReceipt {
    /// Build a receipt from a submittable snapshot.
    pub(crate) fn from_snapshot(snapshot: &QuoteSnapshot) -> Self {
        Self {
            id: Uuid::now_v7(),
            context: snapshot.context,
            from_token: snapshot.from_token.clone().unwrap_or_default(),
            to_token: snapshot.to_token.clone().unwrap_or_default(),
            amount_from: snapshot.amount_from.clone(),
            amount_to: snapshot.amount_to.clone(),
            pool_share_estimate: snapshot.pool_share_estimate,
            submitted_at: Utc::now(),
        }
    }

    /// Human-readable summary.
    pub fn summary(&self) -> String {
        match self.context {
            QuoteContext::Swap => format!(
                "Swapped {} {} for {} {}",
                self.amount_from, self.from_token, self.amount_to, self.to_token
            ),
            QuoteContext::AddLiquidity => format!(
                "Added {} {} and {} {} to the pool",
                self.amount_from, self.from_token, self.amount_to, self.to_token
            ),
        }
    }
}
