pub mod config;
pub mod error;
pub mod types;

pub use config::RelayConfig;
pub use error::{RelayError, Result};
pub use types::*;
