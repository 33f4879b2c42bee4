//! HTTP server for Parlor

mod http;

pub use http::{run, AppState};
