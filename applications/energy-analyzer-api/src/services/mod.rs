pub mod auth;
pub mod consumption;

pub use auth::{AuthService, IssuedToken};
pub use consumption::{ConsumptionService, DeviceConsumption, DeviceStatus, FleetConsumption};
