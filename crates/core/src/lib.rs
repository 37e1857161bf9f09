//! Core types, errors, and date handling for the distribution engine.

pub mod dates;
pub mod error;
pub mod limits;
pub mod progress;
pub mod record;

pub use dates::*;
pub use error::{Error, Result};
pub use progress::*;
pub use record::*;
