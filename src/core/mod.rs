//! Core business logic and collaborator abstractions

pub mod chart;
pub mod config;
pub mod decision;
pub mod error;
pub mod history;
pub mod log;
pub mod message;
pub mod metrics;
pub mod notify;
pub mod rate;
pub mod render;
pub mod source;
pub mod workflow;

// Re-export main types for cleaner imports
pub use history::RateHistory;
pub use notify::Notifier;
pub use rate::{RateObservation, RatePair};
pub use render::{ChartImage, ChartRenderer};
pub use source::RateSource;
pub use workflow::{Outcome, RatesUpdate};
