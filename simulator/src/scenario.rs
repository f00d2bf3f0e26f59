//! Session scenarios.

use ammsim_common::Side;
use ammsim_quote::QuoteContext;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A scripted form session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Form the session drives.
    #[serde(default)]
    pub context: QuoteContext,
    /// Steps in the scenario.
    pub steps: Vec<ScenarioStep>,
}

/// A step in a scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScenarioStep {
    /// Type a value into a field.
    Edit { side: Side, value: String },
    /// Pick a token for a field.
    SelectToken { side: Side, symbol: String },
    /// Exchange the two sides.
    Swap,
    /// Pause, in milliseconds.
    Wait { millis: u64 },
    /// Wait until no quote is in flight.
    Settle,
    /// Fail unless a field shows the given value.
    Expect { side: Side, value: String },
    /// Submit the form.
    Submit,
    /// Preview redeeming part of a liquidity position.
    PreviewRemoval { pool_id: String, percent: Decimal },
    /// Log market statistics for the selected pair.
    MarketData,
}

impl Scenario {
    /// Load a built-in scenario by name, or a JSON scenario from a path.
    pub fn load(name: &str) -> anyhow::Result<Self> {
        match name {
            "simple-swap" => Ok(Self::simple_swap()),
            "fast-typing" => Ok(Self::fast_typing()),
            "token-flip" => Ok(Self::token_flip()),
            "add-liquidity" => Ok(Self::add_liquidity()),
            path if path.ends_with(".json") => {
                let raw = std::fs::read_to_string(path)?;
                Ok(serde_json::from_str(&raw)?)
            }
            _ => Err(anyhow::anyhow!("Unknown scenario: {}", name)),
        }
    }

    /// Names of the built-in scenarios.
    pub fn builtin_names() -> &'static [&'static str] {
        &["simple-swap", "fast-typing", "token-flip", "add-liquidity"]
    }

    fn edit(side: Side, value: &str) -> ScenarioStep {
        ScenarioStep::Edit {
            side,
            value: value.to_string(),
        }
    }

    fn expect(side: Side, value: &str) -> ScenarioStep {
        ScenarioStep::Expect {
            side,
            value: value.to_string(),
        }
    }

    /// Quote and submit a SUI to USDC swap.
    fn simple_swap() -> Self {
        Self {
            name: "simple-swap".to_string(),
            description: "Quote 100 SUI in USDC and submit".to_string(),
            context: QuoteContext::Swap,
            steps: vec![
                Self::edit(Side::From, "100"),
                ScenarioStep::Settle,
                Self::expect(Side::To, "120.000000"),
                ScenarioStep::MarketData,
                ScenarioStep::Submit,
            ],
        }
    }

    /// Keystrokes on both fields faster than quotes resolve.
    fn fast_typing() -> Self {
        Self {
            name: "fast-typing".to_string(),
            description: "Rapid edits on both fields; only the last one wins".to_string(),
            context: QuoteContext::Swap,
            steps: vec![
                Self::edit(Side::From, "1"),
                Self::edit(Side::From, "12"),
                Self::edit(Side::From, "125"),
                Self::edit(Side::To, "6"),
                Self::edit(Side::To, "60"),
                ScenarioStep::Settle,
                Self::expect(Side::From, "50.00000000"),
                Self::expect(Side::To, "60"),
            ],
        }
    }

    /// Swap sides and pick duplicate tokens.
    fn token_flip() -> Self {
        Self {
            name: "token-flip".to_string(),
            description: "Swap sides, then select the token already on the other side".to_string(),
            context: QuoteContext::Swap,
            steps: vec![
                Self::edit(Side::From, "100"),
                ScenarioStep::Settle,
                ScenarioStep::Swap,
                ScenarioStep::Settle,
                Self::expect(Side::From, "120.000000"),
                Self::expect(Side::To, "100.00000000"),
                ScenarioStep::SelectToken {
                    side: Side::To,
                    symbol: "USDC".to_string(),
                },
                ScenarioStep::Settle,
                Self::expect(Side::To, "144.000000"),
            ],
        }
    }

    /// Add liquidity and preview a removal.
    fn add_liquidity() -> Self {
        Self {
            name: "add-liquidity".to_string(),
            description: "Add SUI/USDC liquidity and preview redeeming half of a position".to_string(),
            context: QuoteContext::AddLiquidity,
            steps: vec![
                Self::edit(Side::From, "2500"),
                ScenarioStep::Settle,
                Self::expect(Side::To, "3000.000000"),
                ScenarioStep::Submit,
                ScenarioStep::PreviewRemoval {
                    pool_id: "pool1".to_string(),
                    percent: Decimal::from(50),
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_builtin() {
        for name in Scenario::builtin_names() {
            let scenario = Scenario::load(name).unwrap();
            assert_eq!(scenario.name, *name);
            assert!(!scenario.steps.is_empty());
        }
        assert!(Scenario::load("nope").is_err());
    }

    #[test]
    fn test_parse_json_scenario() {
        let json = r#"{
            "name": "custom",
            "context": "add-liquidity",
            "steps": [
                {"type": "edit", "side": "to", "value": "12"},
                {"type": "settle"},
                {"type": "expect", "side": "from", "value": "10.00000000"},
                {"type": "preview_removal", "pool_id": "pool2", "percent": "25"}
            ]
        }"#;

        let scenario: Scenario = serde_json::from_str(json).unwrap();

        assert_eq!(scenario.context, QuoteContext::AddLiquidity);
        assert_eq!(scenario.steps.len(), 4);
        assert!(matches!(
            scenario.steps[0],
            ScenarioStep::Edit { side: Side::To, .. }
        ));
    }
}
