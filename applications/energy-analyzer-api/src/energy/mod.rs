//! Energy integration over power readings.
//!
//! The integrator itself lives in `energy-core` so the simulator computes its
//! running totals with the same rule. Callers hand over an immutable slice of
//! samples and get a fresh [`ConsumptionSummary`] back.

pub mod window;

pub use energy_core::integrator;
pub use energy_core::integrator::{
    select_range, summarize, summarize_range, ConsumptionSummary, PowerSample, TimeRange,
    DEFAULT_COST_PER_KWH,
};
pub use window::ConsumptionWindow;
