pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod energy;
pub mod error;
pub mod repositories;
pub mod services;

// Re-export commonly used items
pub use config::Config;
pub use error::{AppError, Result};
