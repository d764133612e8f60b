//! Calculation core: recency tracking, mode selection, formulas, and the
//! session that ties them to a settings store.

mod config;
pub mod engine;
pub mod format;
mod recency;
mod session;

pub use config::CalculatorConfig;
pub use format::ResultView;
pub use session::Calculator;
