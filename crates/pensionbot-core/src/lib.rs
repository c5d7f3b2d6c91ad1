pub mod config;
pub mod error;

pub use config::PensionbotConfig;
pub use error::{PensionbotError, Result};
