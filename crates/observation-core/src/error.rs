//! Observation error types.
//!
//! Scope-discipline violations are programmer errors. The unchecked API
//! (`end_tracking`, dropping a `TrackingScope`) turns them into panics; the
//! checked API reports them as [`TrackingError`] so callers such as test
//! harnesses can assert on them.

use thiserror::Error;

use crate::context::ContextId;

/// Result type for tracking-scope operations.
pub type TrackingResult<T> = Result<T, TrackingError>;

/// Broken pairing of `begin_tracking` / `end_tracking` on one thread.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum TrackingError {
	/// `end_tracking` was called while no context was active on this thread.
	#[error("tracking stack is empty; cannot end tracking context {context}")]
	EmptyStack {
		/// Context the caller tried to end.
		context: ContextId,
	},

	/// The context being ended is not the innermost active one.
	#[error("mismatched tracking scope: expected {expected} on top of the stack, found {found}")]
	Mismatched {
		/// Context the caller tried to end.
		expected: ContextId,
		/// Context actually on top of the stack.
		found: ContextId,
	},
}

/// Errors raised while loading a [`RegistrarConfig`](crate::RegistrarConfig).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ConfigError {
	/// Unknown fire policy name.
	#[error("invalid fire policy: {0:?} (expected \"on_attempt\" or \"on_success\")")]
	InvalidFirePolicy(String),

	/// A boolean setting could not be parsed.
	#[error("invalid boolean for {key}: {value:?}")]
	InvalidBool {
		/// Environment variable name.
		key: String,
		/// Offending value.
		value: String,
	},
}
