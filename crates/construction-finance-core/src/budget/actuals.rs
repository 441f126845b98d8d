use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::ConstructionFinanceError;
use crate::types::Money;
use crate::ConstructionFinanceResult;

#[cfg(feature = "simulation")]
pub use simulated::SimulatedActuals;

/// Source of actual spend per budget category, typically a ledger export.
pub trait ActualsProvider: Send + Sync {
    fn actual_for(&self, category: &str, budgeted: Money) -> ConstructionFinanceResult<Money>;
}

/// Actuals supplied up front, keyed by category.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FixedActuals {
    actuals: HashMap<String, Money>,
}

impl FixedActuals {
    pub fn new(actuals: HashMap<String, Money>) -> Self {
        FixedActuals { actuals }
    }

    pub fn insert(&mut self, category: impl Into<String>, actual: Money) {
        self.actuals.insert(category.into(), actual);
    }
}

impl FromIterator<(String, Money)> for FixedActuals {
    fn from_iter<I: IntoIterator<Item = (String, Money)>>(iter: I) -> Self {
        FixedActuals {
            actuals: iter.into_iter().collect(),
        }
    }
}

impl ActualsProvider for FixedActuals {
    fn actual_for(&self, category: &str, _budgeted: Money) -> ConstructionFinanceResult<Money> {
        self.actuals.get(category).copied().ok_or_else(|| {
            ConstructionFinanceError::InsufficientData(format!(
                "No actual spend recorded for category '{category}'"
            ))
        })
    }
}

#[cfg(feature = "simulation")]
mod simulated {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::ActualsProvider;
    use crate::error::ConstructionFinanceError;
    use crate::types::{Money, Rate};
    use crate::ConstructionFinanceResult;

    const DEFAULT_RANGE: Rate = dec!(0.15);

    /// Demo actuals: budgeted × (1 + U(-range/2, range/2)), with a spread
    /// per category. Deterministic for a given seed.
    pub struct SimulatedActuals {
        rng: Mutex<StdRng>,
        ranges: HashMap<String, Rate>,
        default_range: Rate,
    }

    impl SimulatedActuals {
        pub fn new(seed: u64, ranges: HashMap<String, Rate>, default_range: Rate) -> Self {
            SimulatedActuals {
                rng: Mutex::new(StdRng::seed_from_u64(seed)),
                ranges,
                default_range,
            }
        }

        /// Spreads between 8% and 30% for the standard cost categories.
        pub fn with_default_ranges(seed: u64) -> Self {
            let ranges = [
                ("materials", dec!(0.20)),
                ("labor", dec!(0.15)),
                ("equipment", dec!(0.10)),
                ("permits", dec!(0.08)),
                ("design", dec!(0.12)),
                ("consulting", dec!(0.10)),
                ("site_specific", dec!(0.25)),
                ("contingency", dec!(0.30)),
            ]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
            Self::new(seed, ranges, DEFAULT_RANGE)
        }

        pub fn range_for(&self, category: &str) -> Rate {
            self.ranges
                .get(category)
                .copied()
                .unwrap_or(self.default_range)
        }
    }

    impl ActualsProvider for SimulatedActuals {
        fn actual_for(&self, category: &str, budgeted: Money) -> ConstructionFinanceResult<Money> {
            let range = self.range_for(category);
            let half = f64::try_from(range / dec!(2)).map_err(|e| {
                ConstructionFinanceError::ConfigError(format!("range for '{category}': {e}"))
            })?;

            let draw: f64 = {
                let mut rng = self.rng.lock().map_err(|_| {
                    ConstructionFinanceError::ConfigError("actuals generator lock poisoned".into())
                })?;
                if half > 0.0 {
                    rng.gen_range(-half..half)
                } else {
                    0.0
                }
            };

            let factor = Decimal::try_from(draw)
                .map_err(|e| ConstructionFinanceError::ConfigError(e.to_string()))?
                .round_dp(6);
            Ok((budgeted * (Decimal::ONE + factor)).round_dp(2))
        }
    }
}
