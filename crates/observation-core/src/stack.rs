//! Tracking stack
//!
//! Each thread owns one [`TrackingStack`]: the ordered list of tracking
//! contexts currently active on that thread, innermost last. Instrumented
//! reads are broadcast to *every* frame, not just the top one, so an outer
//! tracked execution observes the reads made inside the tracked executions
//! nested in it.
//!
//! ## Example
//!
//! ```ignore
//! with_stack(|stack| {
//!     stack.push(outer);
//!     stack.push(inner);
//!
//!     // Recorded on both `inner` and `outer`.
//!     stack.record_read(key, &table, true);
//!
//!     stack.pop_matching(inner_id)?;
//!     stack.pop_matching(outer_id)?;
//! });
//! ```
//!
//! Reads performed on another thread never reach this thread's stack.

use core::cell::RefCell;
use std::sync::Arc;

use crate::context::{ContextId, TrackingContext};
use crate::error::{TrackingError, TrackingResult};
use crate::key::PropertyKey;
use crate::registrar::InterestTable;

/// Thread-scoped stack of active tracking contexts.
pub struct TrackingStack {
	frames: RefCell<Vec<Arc<TrackingContext>>>,
}

impl TrackingStack {
	/// Create an empty stack.
	pub const fn new() -> Self {
		Self {
			frames: RefCell::new(Vec::new()),
		}
	}

	/// Number of active contexts.
	pub fn depth(&self) -> usize {
		self.frames.borrow().len()
	}

	/// Whether any context is active.
	pub fn is_tracking(&self) -> bool {
		!self.frames.borrow().is_empty()
	}

	/// Id of the innermost active context.
	pub fn current(&self) -> Option<ContextId> {
		self.frames.borrow().last().map(|ctx| ctx.id())
	}

	/// Push a context and start recording reads into it.
	pub(crate) fn push(&self, context: Arc<TrackingContext>) {
		context.activate();
		tracing::trace!(context = %context.id(), depth = self.depth() + 1, "push tracking context");
		self.frames.borrow_mut().push(context);
	}

	/// Pop the innermost context.
	pub(crate) fn pop(&self) -> Option<Arc<TrackingContext>> {
		let context = self.frames.borrow_mut().pop()?;
		context.deactivate();
		tracing::trace!(context = %context.id(), depth = self.depth(), "pop tracking context");
		Some(context)
	}

	/// Pop the innermost context, which must be `id`.
	pub(crate) fn pop_matching(&self, id: ContextId) -> TrackingResult<Arc<TrackingContext>> {
		match self.current() {
			None => Err(TrackingError::EmptyStack { context: id }),
			Some(found) if found != id => Err(TrackingError::Mismatched { expected: id, found }),
			Some(_) => self.pop().ok_or(TrackingError::EmptyStack { context: id }),
		}
	}

	/// Pop frames down to and including `id`.
	///
	/// Used while a panic unwinds through a tracked execution, where frames
	/// pushed by the body may not have been popped. Returns the number of
	/// frames removed; zero if `id` is not on the stack.
	pub(crate) fn unwind_to(&self, id: ContextId) -> usize {
		let position = self.frames.borrow().iter().rposition(|ctx| ctx.id() == id);
		let Some(position) = position else {
			return 0;
		};
		let removed: Vec<_> = self.frames.borrow_mut().drain(position..).collect();
		for context in &removed {
			context.deactivate();
		}
		removed.len()
	}

	/// Record a read of `key` on every active context.
	pub(crate) fn record_read(&self, key: PropertyKey, table: &Arc<InterestTable>, sweep: bool) {
		let frames = self.frames.borrow();
		if frames.is_empty() {
			return;
		}
		for context in frames.iter() {
			if context.observe(key, table, sweep) {
				tracing::trace!(context = %context.id(), key = %key, "recorded read");
			}
		}
	}
}

impl Default for TrackingStack {
	fn default() -> Self {
		Self::new()
	}
}

thread_local! {
	static TRACKING_STACK: TrackingStack = const { TrackingStack::new() };
}

/// Run `f` with the calling thread's tracking stack.
///
/// ```
/// use observation_core::{begin_tracking, end_tracking, stack::with_stack};
///
/// assert_eq!(with_stack(|stack| stack.depth()), 0);
///
/// let handle = begin_tracking(|| {});
/// assert_eq!(with_stack(|stack| stack.current()), Some(handle.id()));
/// end_tracking(handle);
/// ```
pub fn with_stack<F, R>(f: F) -> R
where
	F: FnOnce(&TrackingStack) -> R,
{
	TRACKING_STACK.with(f)
}

/// Like [`with_stack`], but returns `None` once thread-local storage has
/// been torn down.
pub fn try_with_stack<F, R>(f: F) -> Option<R>
where
	F: FnOnce(&TrackingStack) -> R,
{
	TRACKING_STACK.try_with(f).ok()
}
