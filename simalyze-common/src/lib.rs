//! # Simalyze Common Library
//!
//! Shared code for the Simalyze crates:
//! - Error type
//! - Configuration file schema and path resolution
//! - Clock abstraction used by every time-based cache

pub mod config;
pub mod error;
pub mod time;

pub use error::{Error, Result};
pub use time::{Clock, ManualClock, SystemClock};
