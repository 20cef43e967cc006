//! Tracking contexts
//!
//! A [`TrackingContext`] is the activation record of one tracked execution.
//! It collects the [`PropertyKey`]s read while it is on a thread's tracking
//! stack and owns the single completion callback that runs when any of those
//! keys is later mutated.
//!
//! ## Lifecycle
//!
//! ```text
//! Created --push--> Active --pop--> Tracking --mutation--> Fired
//! ```
//!
//! `Fired` is terminal. A context can also fire while still `Active` when
//! another thread mutates a key the running body has already read; it stops
//! recording at that point.
//!
//! ## Locking
//!
//! A context registers itself in an interest table while holding its own key
//! lock, and never takes its key lock while holding a table lock. Firing takes
//! the key set out under the key lock, releases it, then visits each table.

use core::fmt;
use core::sync::atomic::{AtomicBool, AtomicU8, AtomicU64, Ordering};
use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::key::PropertyKey;
use crate::registrar::InterestTable;

/// Completion callback of a tracking context.
pub(crate) type OnChange = Box<dyn FnOnce() + Send + 'static>;

/// Unique identifier for a tracking context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContextId(u64);

impl ContextId {
	/// Allocate a new unique context id.
	pub fn new() -> Self {
		static COUNTER: AtomicU64 = AtomicU64::new(1);
		Self(COUNTER.fetch_add(1, Ordering::Relaxed))
	}
}

impl Default for ContextId {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Display for ContextId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "context#{}", self.0)
	}
}

/// Lifecycle state of a [`TrackingContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
	/// Created but never pushed.
	Created,
	/// On a tracking stack, recording reads.
	Active,
	/// Popped; waiting for a mutation of an observed key.
	Tracking,
	/// Callback invoked. Terminal.
	Fired,
}

const PHASE_CREATED: u8 = 0;
const PHASE_ACTIVE: u8 = 1;
const PHASE_TRACKING: u8 = 2;

/// Activation record of one tracked execution.
pub struct TrackingContext {
	id: ContextId,
	phase: AtomicU8,
	fired: AtomicBool,
	on_change: Mutex<Option<OnChange>>,
	/// Observed keys, each with the table it was registered in.
	observed: Mutex<HashMap<PropertyKey, Weak<InterestTable>>>,
}

impl TrackingContext {
	pub(crate) fn new(on_change: OnChange) -> Arc<Self> {
		Arc::new(Self {
			id: ContextId::new(),
			phase: AtomicU8::new(PHASE_CREATED),
			fired: AtomicBool::new(false),
			on_change: Mutex::new(Some(on_change)),
			observed: Mutex::new(HashMap::new()),
		})
	}

	/// Unique id of this context.
	pub fn id(&self) -> ContextId {
		self.id
	}

	/// Current lifecycle state.
	pub fn state(&self) -> ContextState {
		if self.is_fired() {
			return ContextState::Fired;
		}
		match self.phase.load(Ordering::Acquire) {
			PHASE_CREATED => ContextState::Created,
			PHASE_ACTIVE => ContextState::Active,
			_ => ContextState::Tracking,
		}
	}

	/// Whether the completion callback has been claimed.
	pub fn is_fired(&self) -> bool {
		self.fired.load(Ordering::Acquire)
	}

	/// Keys recorded so far, sorted. Empty once the context has fired.
	pub fn observed_keys(&self) -> Vec<PropertyKey> {
		let mut keys: Vec<_> = self.observed.lock().keys().copied().collect();
		keys.sort();
		keys
	}

	pub(crate) fn activate(&self) {
		self.phase.store(PHASE_ACTIVE, Ordering::Release);
	}

	pub(crate) fn deactivate(&self) {
		self.phase.store(PHASE_TRACKING, Ordering::Release);
	}

	/// Record a read of `key` and register interest in `table`.
	///
	/// Returns `true` when the key was newly recorded.
	pub(crate) fn observe(
		self: &Arc<Self>,
		key: PropertyKey,
		table: &Arc<InterestTable>,
		sweep: bool,
	) -> bool {
		let mut observed = self.observed.lock();
		if self.is_fired() || self.phase.load(Ordering::Acquire) != PHASE_ACTIVE {
			return false;
		}
		if observed.contains_key(&key) {
			return false;
		}
		observed.insert(key, Arc::downgrade(table));
		table.insert(key, Arc::clone(self), sweep);
		true
	}

	/// Fire the completion callback if nobody has yet.
	///
	/// Returns `true` for the single caller that won the race.
	pub(crate) fn fire(&self) -> bool {
		if self
			.fired
			.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
			.is_err()
		{
			return false;
		}

		let observed = core::mem::take(&mut *self.observed.lock());
		for (key, table) in observed {
			if let Some(table) = table.upgrade() {
				table.remove(key, self.id);
			}
		}

		let on_change = self.on_change.lock().take();
		tracing::debug!(context = %self.id, "firing tracking context");
		if let Some(on_change) = on_change {
			on_change();
		}
		true
	}
}

impl fmt::Debug for TrackingContext {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("TrackingContext")
			.field("id", &self.id)
			.field("state", &self.state())
			.field("observed", &self.observed.lock().len())
			.finish()
	}
}
