pub mod config;
pub mod error;
pub mod review;

pub use config::ReviewConfig;
pub use error::{Result, ReviewError};
pub use review::{Feedback, ItemKey, ItemState, ItemStateStore, Scheduler};
