//! Core rate model, statistics, conversion and refresh logic

pub mod board;
pub mod config;
pub mod converter;
pub mod log;
pub mod rates;
pub mod scheduler;
pub mod stats;

// Re-export main types for cleaner imports
pub use board::{BoardView, DashboardState, RateBoard};
pub use converter::{ConversionError, ConversionRequest, convert};
pub use rates::{FetchError, RateRecord, RateSnapshot, RateSource};
pub use scheduler::RefreshScheduler;
pub use stats::{StatsError, StatsSummary, compute_stats};
