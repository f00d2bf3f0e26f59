//! Session controller.

use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use ammsim_common::{Side, TokenPair};
use ammsim_quote::{
    preview_removal, LiquidityPosition, MarketDataProvider, QuoteContext, QuoteEngine,
};
use ammsim_sync::{ControllerConfig, QuoteSnapshot, SyncController, SyncPhase};

use crate::metrics::SessionMetrics;
use crate::scenario::{Scenario, ScenarioStep};

/// Drives a synchronization controller through a session.
pub struct SessionController {
    /// Quote engine shared by every form.
    engine: Arc<QuoteEngine>,
    /// Controller configuration (context is taken from the session).
    config: ControllerConfig,
    /// Market statistics source.
    market: Arc<dyn MarketDataProvider>,
    /// Liquidity positions available for removal previews.
    positions: Vec<LiquidityPosition>,
    /// Session speed multiplier.
    speed: f64,
    /// Random number generator.
    rng: StdRng,
    /// Session metrics.
    metrics: SessionMetrics,
}

impl SessionController {
    /// Create a new session controller.
    pub fn new(
        engine: Arc<QuoteEngine>,
        config: ControllerConfig,
        market: Arc<dyn MarketDataProvider>,
        speed: f64,
        seed: Option<u64>,
    ) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };

        Self {
            engine,
            config,
            market,
            positions: LiquidityPosition::mock_positions(),
            speed,
            rng,
            metrics: SessionMetrics::new(),
        }
    }

    /// Run a scenario.
    pub async fn run_scenario(&mut self, scenario: &Scenario) -> anyhow::Result<QuoteSnapshot> {
        info!("Running scenario: {} - {}", scenario.name, scenario.description);

        let sync = self.form(scenario.context);
        let observer = spawn_observer(sync.subscribe());

        let mut result = Ok(());
        for step in &scenario.steps {
            result = self.execute_step(&sync, step).await;
            if result.is_err() {
                break;
            }
        }

        let snapshot = sync.settled().await;
        self.metrics.controller = sync.stats();
        observer.abort();

        result.map(|_| snapshot)
    }

    /// Type random keystrokes into a form.
    pub async fn run_random(
        &mut self,
        keystrokes: usize,
        context: QuoteContext,
    ) -> anyhow::Result<QuoteSnapshot> {
        info!("Typing {} random keystrokes", keystrokes);

        let sync = self.form(context);
        let observer = spawn_observer(sync.subscribe());
        let symbols: Vec<String> = self
            .engine
            .registry()
            .tokens()
            .iter()
            .map(|t| t.symbol.clone())
            .collect();
        let mut side = Side::From;

        for _ in 0..keystrokes {
            let roll = self.rng.gen_range(0..100);
            match roll {
                0..=69 => {
                    let mut value = sync.snapshot().amount(side).to_string();
                    if self.rng.gen_bool(0.1) && !value.contains('.') {
                        value.push('.');
                    } else {
                        value.push(char::from(b'0' + self.rng.gen_range(0..10u8)));
                    }
                    sync.apply_edit(side, value);
                    self.metrics.edits += 1;
                }
                70..=79 => {
                    let mut value = sync.snapshot().amount(side).to_string();
                    value.pop();
                    sync.apply_edit(side, value);
                    self.metrics.edits += 1;
                }
                80..=87 => {
                    side = side.other();
                    debug!(side = %side, "Focus moved");
                }
                88..=93 => {
                    sync.swap_sides();
                    self.metrics.swaps += 1;
                }
                _ => {
                    let symbol = &symbols[self.rng.gen_range(0..symbols.len())];
                    let target = if self.rng.gen_bool(0.5) { Side::From } else { Side::To };
                    self.select(&sync, target, symbol);
                }
            }

            let pause = self.rng.gen_range(20..200);
            self.pause(pause).await;
        }

        let started = Instant::now();
        let snapshot = sync.settled().await;
        self.metrics.record_settle(started.elapsed().as_millis() as u64);
        self.metrics.controller = sync.stats();
        observer.abort();

        Ok(snapshot)
    }

    /// Get session metrics.
    pub fn metrics(&self) -> &SessionMetrics {
        &self.metrics
    }

    fn form(&self, context: QuoteContext) -> SyncController {
        SyncController::new(self.engine.clone(), self.config.clone().with_context(context))
    }

    fn select(&mut self, sync: &SyncController, side: Side, symbol: &str) {
        match sync.select_token(side, symbol) {
            Ok(_) => self.metrics.selections += 1,
            Err(e) => {
                warn!(side = %side, symbol, error = %e, "Token selection rejected");
                self.metrics.rejected_steps += 1;
            }
        }
    }

    async fn pause(&self, millis: u64) {
        let adjusted = (millis as f64 / self.speed) as u64;
        tokio::time::sleep(Duration::from_millis(adjusted)).await;
    }

    /// Execute a single scenario step.
    async fn execute_step(&mut self, sync: &SyncController, step: &ScenarioStep) -> anyhow::Result<()> {
        match step {
            ScenarioStep::Edit { side, value } => {
                info!("Typing '{}' into {} field", value, side);
                sync.apply_edit(*side, value.clone());
                self.metrics.edits += 1;
            }
            ScenarioStep::SelectToken { side, symbol } => {
                info!("Selecting {} for {} field", symbol, side);
                self.select(sync, *side, symbol);
            }
            ScenarioStep::Swap => {
                info!("Swapping sides");
                sync.swap_sides();
                self.metrics.swaps += 1;
            }
            ScenarioStep::Wait { millis } => {
                self.pause(*millis).await;
            }
            ScenarioStep::Settle => {
                let started = Instant::now();
                let snapshot = sync.settled().await;
                self.metrics.record_settle(started.elapsed().as_millis() as u64);
                info!(
                    from = %snapshot.amount_from,
                    to = %snapshot.amount_to,
                    "Form settled"
                );
            }
            ScenarioStep::Expect { side, value } => {
                let snapshot = sync.snapshot();
                let actual = snapshot.amount(*side);
                if actual != value.as_str() {
                    return Err(anyhow::anyhow!(
                        "Expected {} field to show '{}', got '{}'",
                        side,
                        value,
                        actual
                    ));
                }
            }
            ScenarioStep::Submit => match sync.submit().await {
                Ok(receipt) => {
                    info!(receipt_id = %receipt.id, "{}", receipt.summary());
                    self.metrics.submissions += 1;
                }
                Err(e) => {
                    warn!(error = %e, code = e.error_code(), "Submission rejected");
                    self.metrics.rejected_steps += 1;
                }
            },
            ScenarioStep::PreviewRemoval { pool_id, percent } => {
                let position = self
                    .positions
                    .iter()
                    .find(|p| &p.pool_id == pool_id)
                    .ok_or_else(|| anyhow::anyhow!("Unknown pool: {}", pool_id))?;
                let preview = preview_removal(position, *percent, &self.engine)?;
                info!(
                    pool = %position.label(),
                    lp_burned = %preview.lp_burned,
                    "Redeeming {}% returns {} {} and {} {}",
                    preview.percent,
                    preview.token_a_received,
                    position.token_a,
                    preview.token_b_received,
                    position.token_b
                );
            }
            ScenarioStep::MarketData => {
                let snapshot = sync.snapshot();
                let (Some(from), Some(to)) = (snapshot.from_token, snapshot.to_token) else {
                    warn!("No pair selected for market data");
                    return Ok(());
                };
                let pair = TokenPair::new(from, to);
                let data = self.market.market_data(&pair).await?;
                let now = chrono::Utc::now();
                let history = self
                    .market
                    .historical_data(&pair, now - chrono::Duration::days(7), now)
                    .await?;
                info!(
                    provider = self.market.name(),
                    pair = %pair,
                    price = %data.token_price,
                    pool_size = %data.liquidity_pool_size,
                    volume = %data.trading_volume,
                    history_points = history.len(),
                    "Market data"
                );
            }
        }

        Ok(())
    }
}

/// Log every settled snapshot published by a form.
fn spawn_observer(mut rx: watch::Receiver<QuoteSnapshot>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let snapshot = rx.borrow_and_update().clone();
            if snapshot.phase == SyncPhase::Settled {
                debug!(
                    seq = snapshot.seq,
                    from_token = ?snapshot.from_token,
                    to_token = ?snapshot.to_token,
                    amount_from = %snapshot.amount_from,
                    amount_to = %snapshot.amount_to,
                    pool_share = ?snapshot.pool_share_estimate,
                    fallback = snapshot.used_fallback_rate,
                    readiness = %snapshot.readiness(),
                    "Published"
                );
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ammsim_quote::MockMarketDataProvider;

    fn session(seed: u64) -> SessionController {
        SessionController::new(
            Arc::new(QuoteEngine::mock()),
            ControllerConfig::immediate(QuoteContext::Swap),
            Arc::new(MockMarketDataProvider::default()),
            1000.0,
            Some(seed),
        )
    }

    #[tokio::test]
    async fn test_builtin_scenarios_pass() {
        for name in Scenario::builtin_names() {
            let mut session = session(7);
            let scenario = Scenario::load(name).unwrap();

            let result = session.run_scenario(&scenario).await;

            assert!(result.is_ok(), "{}: {:?}", name, result.err());
        }
    }

    #[tokio::test]
    async fn test_failed_expectation_is_reported() {
        let mut session = session(7);
        let scenario = Scenario {
            name: "bad".to_string(),
            description: String::new(),
            context: QuoteContext::Swap,
            steps: vec![
                ScenarioStep::Edit {
                    side: Side::From,
                    value: "1".to_string(),
                },
                ScenarioStep::Settle,
                ScenarioStep::Expect {
                    side: Side::To,
                    value: "999".to_string(),
                },
            ],
        };

        assert!(session.run_scenario(&scenario).await.is_err());
    }

    #[tokio::test]
    async fn test_random_session_settles_consistently() {
        let mut session = session(42);

        let snapshot = session.run_random(50, QuoteContext::Swap).await.unwrap();

        assert!(!snapshot.is_calculating());
        assert_ne!(snapshot.from_token, snapshot.to_token);
        let stats = session.metrics().controller;
        assert!(stats.applied + stats.discarded <= stats.issued);
        assert!(session.metrics().edits > 0);
    }
}
