pub mod config;
pub mod detectors;
pub mod error;
pub mod io;
pub mod metrics;
pub mod pipeline;
pub mod signal;

pub use detectors::*;
pub use error::{Result, SignalError};
pub use metrics::*;
pub use signal::*;
