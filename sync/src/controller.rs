//! Linked amount synchronization controller.
//!
//! Keeps the "from" and "to" amount fields of a form consistent. Editing one
//! field makes it the driving side and schedules a quote for the other one.
//! Every scheduling step issues a new sequence number and a result is only
//! applied while its number is still the latest, so a slow quote for an old
//! keystroke can never overwrite the answer to a newer one.

use std::sync::Arc;

use ammsim_common::{AmountInput, Side};
use ammsim_quote::{QuoteEngine, QuoteError, QuoteRequest, QuoteResult};
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, info, instrument};

use crate::config::ControllerConfig;
use crate::error::{Result, SyncError};
use crate::state::{ControllerStats, QuoteSnapshot, Readiness, SyncPhase};
use crate::submission::SubmissionReceipt;

/// A staged quote computation, tagged with the sequence number it was issued under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingQuote {
    /// Sequence number of the request.
    pub seq: u64,
    /// Request to run.
    pub request: QuoteRequest,
}

/// What happened to a completed computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// The quote was applied to the counter field.
    Applied(QuoteResult),
    /// The quote failed; counter cleared and error published.
    Rejected(QuoteError),
    /// A newer request exists; the result was dropped. A successful quote
    /// is returned marked stale.
    Superseded {
        seq: u64,
        latest: u64,
        result: Option<QuoteResult>,
    },
}

struct Inner {
    snapshot: QuoteSnapshot,
    stats: ControllerStats,
}

struct Shared {
    engine: Arc<QuoteEngine>,
    config: ControllerConfig,
    inner: Mutex<Inner>,
    updates: watch::Sender<QuoteSnapshot>,
}

/// Controller for one pair of linked amount fields.
///
/// Cloning yields another handle to the same controller. Fire-and-forget
/// operations spawn onto the current tokio runtime.
#[derive(Clone)]
pub struct SyncController {
    shared: Arc<Shared>,
}

impl SyncController {
    /// Create a controller preselecting the registry's default pair.
    pub fn new(engine: Arc<QuoteEngine>, config: ControllerConfig) -> Self {
        let (from, to) = engine.registry().default_pair();
        let snapshot = QuoteSnapshot::new(
            config.context,
            from.map(|t| t.symbol.clone()),
            to.map(|t| t.symbol.clone()),
        );
        let (updates, _) = watch::channel(snapshot.clone());

        Self {
            shared: Arc::new(Shared {
                engine,
                config,
                inner: Mutex::new(Inner {
                    snapshot,
                    stats: ControllerStats::default(),
                }),
                updates,
            }),
        }
    }

    /// Subscribe to published snapshots.
    pub fn subscribe(&self) -> watch::Receiver<QuoteSnapshot> {
        self.shared.updates.subscribe()
    }

    /// Get the current state.
    pub fn snapshot(&self) -> QuoteSnapshot {
        self.shared.inner.lock().snapshot.clone()
    }

    /// Get controller counters.
    pub fn stats(&self) -> ControllerStats {
        self.shared.inner.lock().stats
    }

    /// Get the quote engine.
    pub fn engine(&self) -> &Arc<QuoteEngine> {
        &self.shared.engine
    }

    /// Get the controller configuration.
    pub fn config(&self) -> &ControllerConfig {
        &self.shared.config
    }

    /// Select both tokens and edit one side. Returns the issued sequence number.
    #[instrument(skip(self, amount))]
    pub fn request_quote(
        &self,
        from: &str,
        to: &str,
        amount: impl Into<String>,
        side: Side,
    ) -> Result<u64> {
        let amount = amount.into();
        let (from, to) = match (self.resolve_symbol(from), self.resolve_symbol(to)) {
            (Ok(from), Ok(to)) => (from, to),
            (Err(err), _) | (_, Err(err)) => {
                let mut inner = self.shared.inner.lock();
                if inner.snapshot.phase == SyncPhase::Submitting {
                    return Err(SyncError::Submitting);
                }
                *inner.snapshot.amount_mut(side) = amount;
                inner.snapshot.driving_side = Some(side);
                reject(&mut inner, err.clone());
                self.publish(&inner);
                return Err(SyncError::Quote(err));
            }
        };

        let pending = {
            let mut inner = self.shared.inner.lock();
            if inner.snapshot.phase == SyncPhase::Submitting {
                return Err(SyncError::Submitting);
            }
            assign_token(&mut inner.snapshot, Side::From, from);
            assign_token(&mut inner.snapshot, Side::To, to);
            *inner.snapshot.amount_mut(side) = amount;
            inner.snapshot.driving_side = Some(side);
            let pending = stage(&mut inner);
            self.publish(&inner);
            pending
        };

        Ok(self.schedule(pending))
    }

    /// Edit one field. Returns the issued sequence number.
    pub fn apply_edit(&self, side: Side, value: impl Into<String>) -> u64 {
        let pending = self.begin_edit(side, value);
        self.schedule(pending)
    }

    /// Record an edit and stage the counter computation.
    ///
    /// Returns `None` when no computation is needed (the field was cleared)
    /// or when the edit was ignored because a submission is in progress.
    pub fn begin_edit(&self, side: Side, value: impl Into<String>) -> Option<PendingQuote> {
        let mut inner = self.shared.inner.lock();
        if inner.snapshot.phase == SyncPhase::Submitting {
            debug!(side = %side, "Ignoring edit during submission");
            return None;
        }
        *inner.snapshot.amount_mut(side) = value.into();
        inner.snapshot.driving_side = Some(side);
        let pending = stage(&mut inner);
        self.publish(&inner);
        pending
    }

    /// Run a staged computation and apply it if it is still the latest request.
    pub async fn complete(&self, pending: PendingQuote) -> Completion {
        let latency = self.shared.config.quote_latency;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let outcome = self.shared.engine.quote(&pending.request);

        let mut inner = self.shared.inner.lock();
        let latest = inner.snapshot.seq;
        if pending.seq != latest {
            inner.stats.discarded += 1;
            debug!(seq = pending.seq, latest, "Discarding superseded quote");
            return Completion::Superseded {
                seq: pending.seq,
                latest,
                result: outcome.ok().map(QuoteResult::into_stale),
            };
        }

        let counter = pending.request.driving_side.other();
        let snapshot = &mut inner.snapshot;
        let completion = match outcome {
            Ok(result) => {
                *snapshot.amount_mut(counter) = result.counter_amount.clone();
                snapshot.pool_share_estimate = result.pool_share_estimate;
                snapshot.used_fallback_rate = result.used_fallback_rate;
                Completion::Applied(result)
            }
            Err(err) => {
                debug!(seq = pending.seq, error = %err, "Quote rejected");
                snapshot.amount_mut(counter).clear();
                snapshot.pool_share_estimate = None;
                snapshot.used_fallback_rate = false;
                snapshot.last_error = Some(err.clone());
                Completion::Rejected(err)
            }
        };
        snapshot.phase = SyncPhase::Settled;
        inner.stats.applied += 1;
        self.publish(&inner);

        completion
    }

    /// Exchange tokens and amounts, then re-quote from the driving side.
    pub fn swap_sides(&self) -> u64 {
        let pending = {
            let mut inner = self.shared.inner.lock();
            if inner.snapshot.phase == SyncPhase::Submitting {
                debug!("Ignoring swap during submission");
                return inner.snapshot.seq;
            }
            let snapshot = &mut inner.snapshot;
            std::mem::swap(&mut snapshot.from_token, &mut snapshot.to_token);
            std::mem::swap(&mut snapshot.amount_from, &mut snapshot.amount_to);
            debug!(from = ?snapshot.from_token, to = ?snapshot.to_token, "Swapped sides");
            let pending = stage(&mut inner);
            self.publish(&inner);
            pending
        };

        self.schedule(pending)
    }

    /// Select a token for one side, swapping selections if the other side holds it.
    ///
    /// An unknown symbol keeps the current selection, publishes the error and
    /// clears the counter field.
    pub fn select_token(&self, side: Side, symbol: &str) -> Result<u64> {
        let resolved = self.resolve_symbol(symbol);

        let pending = {
            let mut inner = self.shared.inner.lock();
            if inner.snapshot.phase == SyncPhase::Submitting {
                return Err(SyncError::Submitting);
            }
            let symbol = match resolved {
                Ok(symbol) => symbol,
                Err(err) => {
                    reject(&mut inner, err.clone());
                    self.publish(&inner);
                    return Err(SyncError::Quote(err));
                }
            };
            assign_token(&mut inner.snapshot, side, symbol);
            let pending = stage(&mut inner);
            self.publish(&inner);
            pending
        };

        Ok(self.schedule(pending))
    }

    /// Wait until no quote is in flight and return the state.
    pub async fn settled(&self) -> QuoteSnapshot {
        let mut rx = self.subscribe();
        let snapshot = match rx.wait_for(|s| !s.is_calculating()).await {
            Ok(snapshot) => snapshot.clone(),
            Err(_) => self.snapshot(),
        };
        snapshot
    }

    /// Simulate confirming the form, then reset both amounts.
    ///
    /// The form is locked while the confirmation is pending: edits and swaps
    /// are ignored and token selections fail with [`SyncError::Submitting`].
    #[instrument(skip(self))]
    pub async fn submit(&self) -> Result<SubmissionReceipt> {
        let snapshot = {
            let mut inner = self.shared.inner.lock();
            match inner.snapshot.readiness() {
                Readiness::Ready => {}
                other => return Err(SyncError::NotReady(other)),
            }
            let snapshot = inner.snapshot.clone();
            inner.snapshot.phase = SyncPhase::Submitting;
            self.publish(&inner);
            snapshot
        };
        let mut guard = SubmitGuard {
            controller: self,
            restore: snapshot.phase,
            armed: true,
        };

        let latency = self.shared.config.submit_latency;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let receipt = SubmissionReceipt::from_snapshot(&snapshot);
        {
            guard.armed = false;
            let mut inner = self.shared.inner.lock();
            let snapshot = &mut inner.snapshot;
            snapshot.seq += 1;
            snapshot.amount_from.clear();
            snapshot.amount_to.clear();
            snapshot.driving_side = None;
            snapshot.pool_share_estimate = None;
            snapshot.used_fallback_rate = false;
            snapshot.last_error = None;
            snapshot.phase = SyncPhase::Idle;
            self.publish(&inner);
        }

        info!(receipt_id = %receipt.id, summary = %receipt.summary(), "Submission confirmed");
        Ok(receipt)
    }

    fn schedule(&self, pending: Option<PendingQuote>) -> u64 {
        match pending {
            Some(pending) => {
                let seq = pending.seq;
                let controller = self.clone();
                tokio::spawn(async move {
                    controller.complete(pending).await;
                });
                seq
            }
            None => self.shared.inner.lock().snapshot.seq,
        }
    }

    fn publish(&self, inner: &Inner) {
        self.shared.updates.send_replace(inner.snapshot.clone());
    }

    fn resolve_symbol(&self, symbol: &str) -> std::result::Result<String, QuoteError> {
        self.shared
            .engine
            .registry()
            .get(symbol.trim())
            .map(|t| t.symbol.clone())
            .ok_or_else(|| QuoteError::MissingToken(format!("unknown token {}", symbol)))
    }
}

/// Unlocks the form if a submission is dropped before it completes.
struct SubmitGuard<'a> {
    controller: &'a SyncController,
    restore: SyncPhase,
    armed: bool,
}

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut inner = self.controller.shared.inner.lock();
        if inner.snapshot.phase == SyncPhase::Submitting {
            inner.snapshot.phase = self.restore;
            self.controller.publish(&inner);
        }
    }
}

/// Put `symbol` on `side`; if the other side already holds it, the two
/// selections trade places so both sides never show the same token.
fn assign_token(snapshot: &mut QuoteSnapshot, side: Side, symbol: String) {
    if snapshot.token(side.other()) == Some(symbol.as_str()) {
        let previous = snapshot.token_mut(side).take();
        *snapshot.token_mut(side.other()) = previous;
    }
    *snapshot.token_mut(side) = Some(symbol);
}

/// Publish a failure without computing: the counter field is cleared and any
/// in-flight quote is invalidated.
fn reject(inner: &mut Inner, err: QuoteError) {
    let snapshot = &mut inner.snapshot;
    snapshot.seq += 1;
    if let Some(side) = snapshot.driving_side {
        snapshot.amount_mut(side.other()).clear();
    }
    snapshot.pool_share_estimate = None;
    snapshot.used_fallback_rate = false;
    snapshot.phase = SyncPhase::Settled;
    debug!(seq = snapshot.seq, error = %err, "Request rejected");
    snapshot.last_error = Some(err);
}

/// Issue a new sequence number for the driving side's current value.
fn stage(inner: &mut Inner) -> Option<PendingQuote> {
    let side = inner.snapshot.driving_side?;
    inner.stats.issued += 1;

    let snapshot = &mut inner.snapshot;
    snapshot.seq += 1;
    snapshot.last_error = None;

    let amount = snapshot.amount(side).to_string();
    if matches!(AmountInput::parse(&amount), Ok(AmountInput::Empty)) {
        snapshot.amount_mut(side.other()).clear();
        snapshot.pool_share_estimate = None;
        snapshot.used_fallback_rate = false;
        snapshot.phase = SyncPhase::Settled;
        debug!(seq = snapshot.seq, side = %side, "Driving field cleared");
        return None;
    }

    snapshot.phase = SyncPhase::Computing(side);
    Some(PendingQuote {
        seq: snapshot.seq,
        request: QuoteRequest {
            from: snapshot.from_token.clone(),
            to: snapshot.to_token.clone(),
            amount,
            driving_side: side,
            context: snapshot.context,
        },
    })
}
