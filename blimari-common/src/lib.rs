//! Shared types for the Blimari learning-trail service
//!
//! Holds the pieces used by more than one layer of the server: the common
//! error type, the JSON response envelope, and the event bus that feeds the
//! SSE progress stream.

pub mod api;
pub mod error;
pub mod events;
pub mod sse;

pub use error::{Error, Result};
