//! tg-core: stable foundation for triggerflow.
//!
//! Contains:
//! - units (uom SI types + constructors for the electrical domain)
//! - numeric (Real + tolerances + float helpers)
//! - signal (piecewise-constant time signals)
//! - error (shared error types)

pub mod error;
pub mod numeric;
pub mod signal;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{CoreError, CoreResult};
pub use numeric::*;
pub use signal::{PiecewiseSignal, generate_square_signal};
pub use units::*;
