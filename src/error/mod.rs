//! Error types for the action pipeline.
//!
//! - [`MergeError`] — Errors raised during token resolution and substitution.
//! - [`ActionError`] — Top-level errors for action parsing, evaluation, and dispatch.
//! - [`GatewayError`] — Failures reported by platform gateways, with payload-shape
//!   aware message extraction.

pub mod action_error;
pub mod gateway_error;
pub mod merge_error;

pub use action_error::ActionError;
pub use gateway_error::{extract_error_message, GatewayError};
pub use merge_error::MergeError;

/// Convenience alias for dispatch-level results.
pub type ActionResult<T> = Result<T, ActionError>;
/// Convenience alias for merge-level results.
pub type MergeResult<T> = Result<T, MergeError>;
