//! Observation registrar
//!
//! Every observable subject owns one [`ObservationRegistrar`]. Instrumented
//! getters call [`ObservationRegistrar::access`]; instrumented setters wrap
//! the actual write in [`ObservationRegistrar::with_mutation`].
//!
//! The registrar's interest table maps each [`PropertyKey`] to the set of
//! tracking contexts waiting on it. A mutation removes the whole set for the
//! mutated key (every member is about to fire, and firing is one-shot) and
//! fires each context after the table lock is released.
//!
//! ## Cleanup
//!
//! Interest entries are removed:
//!
//! 1. for the mutated key, when a mutation fires it;
//! 2. for every other key a context observed, by the context itself when it
//!    fires (it keeps weak references to the tables it registered in);
//! 3. lazily, when a key's set is touched by a new reader and
//!    [`RegistrarConfig::sweep_on_access`] is on, or on an explicit
//!    [`ObservationRegistrar::sweep`];
//! 4. all at once when the registrar itself is dropped.

use core::fmt;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::{FirePolicy, RegistrarConfig};
use crate::context::{ContextId, TrackingContext};
use crate::key::{PropertyId, PropertyKey, SubjectId};
use crate::stack::try_with_stack;

type InterestSet = HashMap<ContextId, Arc<TrackingContext>>;

/// Interest table of one subject.
pub(crate) struct InterestTable {
	subject: SubjectId,
	observers: Mutex<HashMap<PropertyKey, InterestSet>>,
}

impl InterestTable {
	pub(crate) fn new(subject: SubjectId) -> Self {
		Self {
			subject,
			observers: Mutex::new(HashMap::new()),
		}
	}

	pub(crate) fn subject(&self) -> SubjectId {
		self.subject
	}

	pub(crate) fn insert(&self, key: PropertyKey, context: Arc<TrackingContext>, sweep: bool) {
		let mut observers = self.observers.lock();
		let set = observers.entry(key).or_default();
		if sweep {
			set.retain(|_, ctx| !ctx.is_fired());
		}
		set.insert(context.id(), context);
	}

	pub(crate) fn remove(&self, key: PropertyKey, id: ContextId) {
		let mut observers = self.observers.lock();
		if let Some(set) = observers.get_mut(&key) {
			set.remove(&id);
			if set.is_empty() {
				observers.remove(&key);
			}
		}
	}

	/// Remove and return every context interested in `key`.
	pub(crate) fn take(&self, key: PropertyKey) -> Vec<Arc<TrackingContext>> {
		self.observers
			.lock()
			.remove(&key)
			.map(|set| set.into_values().collect())
			.unwrap_or_default()
	}

	/// Live (not yet fired) contexts interested in `key`.
	pub(crate) fn interest_count(&self, key: PropertyKey) -> usize {
		self.observers
			.lock()
			.get(&key)
			.map(|set| set.values().filter(|ctx| !ctx.is_fired()).count())
			.unwrap_or(0)
	}

	pub(crate) fn key_count(&self) -> usize {
		self.observers.lock().len()
	}

	/// Drop fired contexts and empty sets. Returns the number of entries removed.
	pub(crate) fn sweep(&self) -> usize {
		let mut observers = self.observers.lock();
		let mut removed = 0;
		observers.retain(|_, set| {
			let before = set.len();
			set.retain(|_, ctx| !ctx.is_fired());
			removed += before - set.len();
			!set.is_empty()
		});
		removed
	}
}

/// Per-subject registry of observers.
///
/// ## Example
///
/// ```
/// use observation_core::{ObservationRegistrar, PropertyId, with_observation_tracking};
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// const COUNT: PropertyId = PropertyId::new(0, "count");
///
/// let registrar = ObservationRegistrar::new();
/// let fired = Arc::new(AtomicUsize::new(0));
///
/// with_observation_tracking(
///     || registrar.access(COUNT),
///     {
///         let fired = Arc::clone(&fired);
///         move || {
///             fired.fetch_add(1, Ordering::SeqCst);
///         }
///     },
/// );
///
/// registrar.with_mutation(COUNT, || ());
/// registrar.with_mutation(COUNT, || ());
/// assert_eq!(fired.load(Ordering::SeqCst), 1);
/// ```
pub struct ObservationRegistrar {
	table: Arc<InterestTable>,
	config: RegistrarConfig,
}

impl ObservationRegistrar {
	/// Create a registrar for a new subject with the default configuration.
	pub fn new() -> Self {
		Self::with_config(RegistrarConfig::default())
	}

	/// Create a registrar for a new subject.
	pub fn with_config(config: RegistrarConfig) -> Self {
		Self {
			table: Arc::new(InterestTable::new(SubjectId::new())),
			config,
		}
	}

	/// Identity of the subject owning this registrar.
	pub fn subject_id(&self) -> SubjectId {
		self.table.subject()
	}

	/// Configuration in effect.
	pub fn config(&self) -> &RegistrarConfig {
		&self.config
	}

	/// Key of `property` on this registrar's subject.
	pub fn key(&self, property: PropertyId) -> PropertyKey {
		PropertyKey::new(self.subject_id(), property)
	}

	/// Report a read of `property`.
	///
	/// Every tracking context active on the calling thread records the key
	/// and becomes interested in it. Without active tracking this is a no-op.
	pub fn access(&self, property: PropertyId) {
		let key = self.key(property);
		let sweep = self.config.sweep_on_access;
		// Stack is gone during thread teardown; nothing can be tracking then.
		let _ = try_with_stack(|stack| stack.record_read(key, &self.table, sweep));
	}

	/// Run `mutation`, then fire every context interested in `property`.
	///
	/// The mutation's result is returned unchanged. If `mutation` panics, the
	/// interested contexts still fire while the panic unwinds unless the
	/// registrar uses [`FirePolicy::OnSuccess`].
	pub fn with_mutation<T, F>(&self, property: PropertyId, mutation: F) -> T
	where
		F: FnOnce() -> T,
	{
		let key = self.key(property);
		let guard = MutationNotifier::new(self, key);
		let result = mutation();
		guard.disarm();
		self.fire_interested(key);
		result
	}

	/// Like [`with_mutation`](Self::with_mutation) for fallible mutations.
	///
	/// An `Err` is returned unchanged. Whether it fires the interested
	/// contexts is decided by [`RegistrarConfig::fire_policy`].
	pub fn try_with_mutation<T, E, F>(&self, property: PropertyId, mutation: F) -> Result<T, E>
	where
		F: FnOnce() -> Result<T, E>,
	{
		let key = self.key(property);
		let guard = MutationNotifier::new(self, key);
		let result = mutation();
		guard.disarm();
		if result.is_ok() || self.config.fire_policy.fires_on_failure() {
			self.fire_interested(key);
		}
		result
	}

	/// Fire every context interested in `property` without running a mutation.
	///
	/// Returns the number of contexts fired by this call.
	pub fn notify(&self, property: PropertyId) -> usize {
		self.fire_interested(self.key(property))
	}

	/// Number of live contexts waiting on `property`.
	pub fn interest_count(&self, property: PropertyId) -> usize {
		self.table.interest_count(self.key(property))
	}

	/// Number of keys with at least one interest entry (fired or not).
	pub fn tracked_key_count(&self) -> usize {
		self.table.key_count()
	}

	/// Drop entries for contexts that have already fired.
	///
	/// Returns the number of entries removed.
	pub fn sweep(&self) -> usize {
		let removed = self.table.sweep();
		if removed > 0 {
			tracing::debug!(
				subject = %self.subject_id(),
				label = self.config.label.as_deref(),
				removed,
				"swept stale interest entries"
			);
		}
		removed
	}

	fn fire_interested(&self, key: PropertyKey) -> usize {
		let contexts = self.table.take(key);
		if contexts.is_empty() {
			return 0;
		}
		// Every taken context must fire; a panicking callback is re-raised
		// only after the rest have run.
		let mut fired = 0;
		let mut first_panic = None;
		for ctx in &contexts {
			match panic::catch_unwind(AssertUnwindSafe(|| ctx.fire())) {
				Ok(true) => fired += 1,
				Ok(false) => {}
				Err(payload) => {
					fired += 1;
					tracing::error!(
						key = %key,
						context = %ctx.id(),
						label = self.config.label.as_deref(),
						"observation callback panicked"
					);
					first_panic.get_or_insert(payload);
				}
			}
		}
		tracing::debug!(
			key = %key,
			label = self.config.label.as_deref(),
			interested = contexts.len(),
			fired,
			"property mutated"
		);
		if let Some(payload) = first_panic {
			panic::resume_unwind(payload);
		}
		fired
	}

	/// Firing path taken while a mutation body is unwinding.
	///
	/// A callback that panics here would abort the process, so each firing
	/// is isolated and failures are logged.
	fn fire_interested_unwinding(&self, key: PropertyKey) {
		for ctx in self.table.take(key) {
			let outcome = panic::catch_unwind(AssertUnwindSafe(|| ctx.fire()));
			if outcome.is_err() {
				tracing::error!(
					key = %key,
					context = %ctx.id(),
					"observation callback panicked while a mutation was unwinding"
				);
			}
		}
	}
}

impl Default for ObservationRegistrar {
	fn default() -> Self {
		Self::new()
	}
}

/// Cloning yields a registrar for a *new* subject with the same
/// configuration and no observers.
impl Clone for ObservationRegistrar {
	fn clone(&self) -> Self {
		Self::with_config(self.config.clone())
	}
}

impl fmt::Debug for ObservationRegistrar {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ObservationRegistrar")
			.field("subject", &self.subject_id())
			.field("label", &self.config.label)
			.field("tracked_keys", &self.tracked_key_count())
			.finish()
	}
}

/// Fires interested contexts if the mutation body unwinds.
struct MutationNotifier<'a> {
	registrar: &'a ObservationRegistrar,
	key: PropertyKey,
	armed: bool,
}

impl<'a> MutationNotifier<'a> {
	fn new(registrar: &'a ObservationRegistrar, key: PropertyKey) -> Self {
		Self {
			registrar,
			key,
			armed: true,
		}
	}

	fn disarm(mut self) {
		self.armed = false;
	}
}

impl Drop for MutationNotifier<'_> {
	fn drop(&mut self) {
		if !self.armed {
			return;
		}
		if self.registrar.config.fire_policy == FirePolicy::OnAttempt {
			self.registrar.fire_interested_unwinding(self.key);
		}
	}
}
