//! Shared types for Parlor

mod error;

pub use error::{ApiError, Result};
