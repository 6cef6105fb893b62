//! JSON scenario files for the `series` command.
//!
//! ```json
//! {
//!   "config": {
//!     "mode": "parimutuel",
//!     "allocations": [{ "rank": "tier1", "basis_points": 10000 }]
//!   },
//!   "initial_carry": { "tier1": 500 },
//!   "rounds": [
//!     { "sales": 1000000 },
//!     { "sales": 1000000, "winners": { "tier1": 1 } }
//!   ]
//! }
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use lotto_execution::{simulate_series, SeriesError};
use lotto_types::{RoundOutput, SeriesConfig, TierAmounts, TierCounts};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Sales and winner counts for one round of a scenario.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundSpec {
    pub sales: i64,
    #[serde(default)]
    pub winners: TierCounts,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub config: SeriesConfig,
    #[serde(default)]
    pub initial_carry: Option<TierAmounts>,
    pub rounds: Vec<RoundSpec>,
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse scenario {}", path.display()))
    }

    /// Run every round through the series runner.
    pub fn run(&self) -> Result<Vec<RoundOutput>, SeriesError> {
        let sales: Vec<i64> = self.rounds.iter().map(|round| round.sales).collect();
        let winners: Vec<TierCounts> = self
            .rounds
            .iter()
            .map(|round| round.winners.clone())
            .collect();
        info!(
            mode = %self.config.mode,
            rounds = self.rounds.len(),
            "running scenario"
        );
        simulate_series(&self.config, &sales, &winners, self.initial_carry.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lotto_types::{Mode, Rank, RoundError};
    use std::io::Write as _;

    const CARRY_SCENARIO: &str = r#"{
        "config": {
            "mode": "parimutuel",
            "allocations": [{ "rank": "tier1", "basis_points": 10000 }]
        },
        "rounds": [
            { "sales": 1000000 },
            { "sales": 1000000, "winners": { "tier1": 1 } }
        ]
    }"#;

    #[test]
    fn loads_and_runs_scenario_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CARRY_SCENARIO.as_bytes()).unwrap();

        let scenario = Scenario::load(file.path()).unwrap();
        assert_eq!(scenario.config.mode, Mode::Parimutuel);
        assert_eq!(scenario.config.rounding_unit, 1);

        let outputs = scenario.run().unwrap();
        assert_eq!(outputs[0].carry_out.get(Rank::Tier1), 1_000_000);
        assert_eq!(outputs[1].paid_per_winner.get(Rank::Tier1), 2_000_000);
    }

    #[test]
    fn rejects_unknown_mode() {
        let raw = CARRY_SCENARIO.replace("parimutuel", "lucky");
        let err = serde_json::from_str::<Scenario>(&raw).unwrap_err();
        assert!(err.to_string().contains("invalid settlement mode"), "unexpected error: {err}");
    }

    #[test]
    fn surfaces_engine_errors() {
        let scenario = Scenario {
            config: SeriesConfig::standard(Mode::Fixed),
            initial_carry: None,
            rounds: vec![RoundSpec {
                sales: -1,
                winners: TierCounts::new(),
            }],
        };
        assert_eq!(
            scenario.run(),
            Err(SeriesError::Round(RoundError::NegativeSales { sales: -1 }))
        );
    }

    #[test]
    fn missing_file_reports_path() {
        let err = Scenario::load(Path::new("/nonexistent/scenario.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/scenario.json"));
    }
}
