//! Sleep Calc - sleep cycle, caffeine and jet lag calculators
//!
//! Three independent, pure calculators built on a shared 24-hour clock:
//!
//! - **Sleep cycles**: bedtimes or wake times in whole 90-minute cycles, with
//!   age-based recommendations
//! - **Caffeine**: exponential decay of caffeine doses and bedtime advice
//! - **Jet lag**: a day-by-day preparation, travel and recovery plan
//!
//! The [`api`] module wraps them in JSON requests and reports, and [`ffi`]
//! exposes those to C callers.

pub mod api;
pub mod caffeine;
pub mod clock;
pub mod config;
pub mod error;
pub mod jetlag;
pub mod sleep;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use api::{caffeine_report_json, jet_lag_plan_json, sleep_options_json, Calculator};
pub use clock::WallClock;
pub use config::CalculatorConfig;
pub use error::CalcError;
pub use jetlag::{JetLagTrip, TimeZoneOffset};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
