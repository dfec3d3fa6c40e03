pub mod auth;
pub mod consumption;
pub mod device;
pub mod reading;

pub use auth::*;
pub use consumption::*;
pub use device::*;
pub use reading::*;
