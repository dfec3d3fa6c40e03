use super::integrator::{select_range, summarize, ConsumptionSummary, PowerSample, TimeRange};
use serde::{Deserialize, Serialize};

/// Which readings of a requested range feed the energy total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum ConsumptionWindow {
    /// Every reading in the range.
    #[default]
    Full,
    /// Only the most recent `count` readings in the range.
    Latest { count: usize },
}

impl ConsumptionWindow {
    pub fn validate(&self) -> Result<(), String> {
        match self {
            ConsumptionWindow::Latest { count: 0 } => {
                Err("consumption window 'latest' requires count >= 1".to_string())
            }
            _ => Ok(()),
        }
    }

    /// Tail of an ascending slice that this window keeps.
    pub fn apply<'a, S>(&self, samples: &'a [S]) -> &'a [S] {
        match *self {
            ConsumptionWindow::Full => samples,
            ConsumptionWindow::Latest { count } => {
                &samples[samples.len().saturating_sub(count)..]
            }
        }
    }

    /// Filters by `range`, sorts, applies the window, then integrates.
    pub fn summarize<S: PowerSample>(
        &self,
        samples: &[S],
        range: &TimeRange,
        cost_per_kwh: f64,
    ) -> ConsumptionSummary {
        let selected = select_range(samples, range);
        summarize(self.apply(&selected), cost_per_kwh)
    }
}
