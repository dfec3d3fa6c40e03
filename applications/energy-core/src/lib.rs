//! Pieces shared by the energy analyzer API and the device simulator.

pub mod env;
pub mod integrator;

pub use integrator::{
    select_range, summarize, summarize_range, ConsumptionSummary, PowerSample, RunningEnergy,
    TimeRange, DEFAULT_COST_PER_KWH,
};
