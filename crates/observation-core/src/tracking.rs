//! Tracked executions
//!
//! A tracked execution runs a body while a fresh tracking context is active
//! on the calling thread. Every instrumented read made by the body, directly
//! or through nested tracked executions, makes the context interested in the
//! read property. The first later mutation of any of those properties runs
//! the context's `on_change` callback, exactly once.
//!
//! Three levels of API are provided:
//!
//! - [`with_observation_tracking`]: run a closure, scope handled for you.
//! - [`TrackingScope`]: RAII guard that ends tracking when dropped.
//! - [`begin_tracking`] / [`end_tracking`]: raw, explicitly paired calls.
//!
//! Pairing is strict: contexts end in reverse order of creation on the thread
//! that began them. [`TrackingHandle`] is `!Send`, so ending on another
//! thread does not compile; ending out of order is a fatal error.

use core::fmt;
use core::marker::PhantomData;
use std::sync::Arc;
use std::thread;

use crate::context::{ContextId, ContextState, TrackingContext};
use crate::error::TrackingResult;
use crate::key::PropertyKey;
use crate::stack::with_stack;

/// Opaque handle to a tracking context started by [`begin_tracking`].
#[must_use = "a tracking context must be ended with `end_tracking`"]
pub struct TrackingHandle {
	context: Arc<TrackingContext>,
	_not_send: PhantomData<*const ()>,
}

impl TrackingHandle {
	/// Id of the underlying context.
	pub fn id(&self) -> ContextId {
		self.context.id()
	}

	/// Lifecycle state of the underlying context.
	pub fn state(&self) -> ContextState {
		self.context.state()
	}

	/// Whether the context has already fired.
	pub fn is_fired(&self) -> bool {
		self.context.is_fired()
	}

	/// Keys observed so far.
	pub fn observed_keys(&self) -> Vec<PropertyKey> {
		self.context.observed_keys()
	}

	/// The underlying context.
	///
	/// Holding the context past `end_tracking` keeps it inspectable; it does
	/// not keep it registered anywhere.
	pub fn context(&self) -> &Arc<TrackingContext> {
		&self.context
	}
}

impl fmt::Debug for TrackingHandle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("TrackingHandle").field(&self.context).finish()
	}
}

/// Start a tracked execution on the calling thread.
///
/// `on_change` runs at most once, on whichever thread performs the first
/// mutation of a property read while this context is active.
pub fn begin_tracking<F>(on_change: F) -> TrackingHandle
where
	F: FnOnce() + Send + 'static,
{
	let context = TrackingContext::new(Box::new(on_change));
	with_stack(|stack| stack.push(Arc::clone(&context)));
	TrackingHandle {
		context,
		_not_send: PhantomData,
	}
}

/// End a tracked execution started by [`begin_tracking`].
///
/// # Panics
///
/// Panics if `handle` is not the innermost active context on this thread.
pub fn end_tracking(handle: TrackingHandle) {
	if let Err(err) = try_end_tracking(handle) {
		panic!("{err}");
	}
}

/// Checked form of [`end_tracking`].
pub fn try_end_tracking(handle: TrackingHandle) -> TrackingResult<()> {
	let id = handle.id();
	with_stack(|stack| stack.pop_matching(id)).map(|_| ())
}

/// Scope guard for a tracked execution.
///
/// The context is popped when the guard is dropped, including while a panic
/// unwinds through the scope.
///
/// ```
/// use observation_core::{ObservationRegistrar, PropertyId, TrackingScope};
///
/// const TITLE: PropertyId = PropertyId::new(0, "title");
/// let registrar = ObservationRegistrar::new();
///
/// {
///     let _scope = TrackingScope::enter(|| println!("title changed"));
///     registrar.access(TITLE);
/// }
///
/// assert_eq!(registrar.interest_count(TITLE), 1);
/// ```
#[must_use = "tracking ends as soon as the scope is dropped"]
pub struct TrackingScope {
	handle: Option<TrackingHandle>,
}

impl TrackingScope {
	/// Begin tracking until the returned guard is dropped.
	pub fn enter<F>(on_change: F) -> Self
	where
		F: FnOnce() + Send + 'static,
	{
		Self {
			handle: Some(begin_tracking(on_change)),
		}
	}

	/// Id of the context opened by this scope.
	pub fn id(&self) -> Option<ContextId> {
		self.handle.as_ref().map(TrackingHandle::id)
	}

	/// The open handle, while the scope is active.
	pub fn handle(&self) -> Option<&TrackingHandle> {
		self.handle.as_ref()
	}

	/// End tracking now and report scope violations instead of panicking.
	pub fn exit(mut self) -> TrackingResult<()> {
		match self.handle.take() {
			Some(handle) => try_end_tracking(handle),
			None => Ok(()),
		}
	}
}

impl Drop for TrackingScope {
	fn drop(&mut self) {
		let Some(handle) = self.handle.take() else {
			return;
		};
		if !thread::panicking() {
			end_tracking(handle);
			return;
		}
		let id = handle.id();
		let removed = with_stack(|stack| stack.unwind_to(id));
		if removed != 1 {
			tracing::error!(
				context = %id,
				removed,
				"tracking stack out of balance while unwinding a tracked execution"
			);
		}
	}
}

impl fmt::Debug for TrackingScope {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("TrackingScope")
			.field("handle", &self.handle)
			.finish()
	}
}

/// Run `body` as a tracked execution and return its result.
///
/// Tracking ends on every exit path of `body`, including panics. `on_change`
/// fires at most once, the first time any property read by `body` is mutated.
///
/// ```
/// use observation_core::{ObservationRegistrar, PropertyId, with_observation_tracking};
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicBool, Ordering};
///
/// const NAME: PropertyId = PropertyId::new(0, "name");
/// const AGE: PropertyId = PropertyId::new(1, "age");
///
/// let registrar = ObservationRegistrar::new();
/// let changed = Arc::new(AtomicBool::new(false));
///
/// let length = with_observation_tracking(
///     || {
///         registrar.access(NAME);
///         "Tom".len()
///     },
///     {
///         let changed = Arc::clone(&changed);
///         move || changed.store(true, Ordering::SeqCst)
///     },
/// );
/// assert_eq!(length, 3);
///
/// registrar.with_mutation(AGE, || ());
/// assert!(!changed.load(Ordering::SeqCst));
///
/// registrar.with_mutation(NAME, || ());
/// assert!(changed.load(Ordering::SeqCst));
/// ```
pub fn with_observation_tracking<T, B, C>(body: B, on_change: C) -> T
where
	B: FnOnce() -> T,
	C: FnOnce() + Send + 'static,
{
	let scope = TrackingScope::enter(on_change);
	let result = body();
	drop(scope);
	result
}
