pub mod config;
pub mod error;
pub mod types;

pub use config::MeetbriefConfig;
pub use error::{MeetbriefError, Result};
pub use types::*;
