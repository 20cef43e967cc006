//! Instrumented model types covering ignored properties, composition,
//! object graphs, nested tracking and overridden hooks.

use observation::{Observable, ObservationRegistrar, PropertyId, with_observation_tracking};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// One tracked property and one that is deliberately not instrumented.
#[derive(Debug)]
pub struct HasIgnoredProperty {
	field: RwLock<i64>,
	ignored: RwLock<i64>,
	registrar: ObservationRegistrar,
}

impl HasIgnoredProperty {
	pub const FIELD: PropertyId = PropertyId::new(0, "field");

	pub fn new() -> Self {
		Self {
			field: RwLock::new(3),
			ignored: RwLock::new(4),
			registrar: ObservationRegistrar::new(),
		}
	}

	pub fn field(&self) -> i64 {
		self.access(Self::FIELD);
		*self.field.read()
	}

	pub fn set_field(&self, value: i64) {
		self.with_mutation(Self::FIELD, || *self.field.write() = value);
	}

	// Ignored: plain storage access, no registrar calls.
	pub fn ignored(&self) -> i64 {
		*self.ignored.read()
	}

	pub fn set_ignored(&self, value: i64) {
		*self.ignored.write() = value;
	}
}

impl Default for HasIgnoredProperty {
	fn default() -> Self {
		Self::new()
	}
}

impl Observable for HasIgnoredProperty {
	fn registrar(&self) -> &ObservationRegistrar {
		&self.registrar
	}
}

/// Shared base of [`Person`].
#[derive(Debug)]
pub struct Entity {
	age: RwLock<u32>,
	registrar: ObservationRegistrar,
}

impl Entity {
	pub const AGE: PropertyId = PropertyId::new(0, "age");

	pub fn new() -> Self {
		Self {
			age: RwLock::new(0),
			registrar: ObservationRegistrar::new(),
		}
	}

	pub fn age(&self) -> u32 {
		self.access(Self::AGE);
		*self.age.read()
	}

	pub fn set_age(&self, age: u32) {
		self.with_mutation(Self::AGE, || *self.age.write() = age);
	}
}

impl Default for Entity {
	fn default() -> Self {
		Self::new()
	}
}

impl Observable for Entity {
	fn registrar(&self) -> &ObservationRegistrar {
		&self.registrar
	}
}

/// A person with a computed full name and a list of friends.
///
/// The entity part is a separate subject, so `age` is keyed on the entity
/// and the name fields on the person.
#[derive(Debug)]
pub struct Person {
	entity: Entity,
	first_name: RwLock<String>,
	last_name: RwLock<String>,
	friends: RwLock<Vec<Arc<Person>>>,
	registrar: ObservationRegistrar,
}

impl Person {
	pub const FIRST_NAME: PropertyId = PropertyId::new(0, "first_name");
	pub const LAST_NAME: PropertyId = PropertyId::new(1, "last_name");
	pub const FRIENDS: PropertyId = PropertyId::new(2, "friends");

	pub fn new(first_name: &str, last_name: &str) -> Self {
		Self {
			entity: Entity::new(),
			first_name: RwLock::new(first_name.to_string()),
			last_name: RwLock::new(last_name.to_string()),
			friends: RwLock::new(Vec::new()),
			registrar: ObservationRegistrar::new(),
		}
	}

	pub fn entity(&self) -> &Entity {
		&self.entity
	}

	pub fn age(&self) -> u32 {
		self.entity.age()
	}

	pub fn set_age(&self, age: u32) {
		self.entity.set_age(age);
	}

	pub fn first_name(&self) -> String {
		self.access(Self::FIRST_NAME);
		self.first_name.read().clone()
	}

	pub fn set_first_name(&self, name: &str) {
		self.with_mutation(Self::FIRST_NAME, || *self.first_name.write() = name.to_string());
	}

	pub fn last_name(&self) -> String {
		self.access(Self::LAST_NAME);
		self.last_name.read().clone()
	}

	pub fn set_last_name(&self, name: &str) {
		self.with_mutation(Self::LAST_NAME, || *self.last_name.write() = name.to_string());
	}

	/// Computed; reads both name properties.
	pub fn full_name(&self) -> String {
		format!("{} {}", self.first_name(), self.last_name())
	}

	pub fn friends(&self) -> Vec<Arc<Person>> {
		self.access(Self::FRIENDS);
		self.friends.read().clone()
	}

	pub fn add_friend(&self, friend: Arc<Person>) {
		self.with_mutation(Self::FRIENDS, || self.friends.write().push(friend));
	}
}

impl Observable for Person {
	fn registrar(&self) -> &ObservationRegistrar {
		&self.registrar
	}
}

/// A [`Person`] with a middle name that takes part in the full name.
#[derive(Debug)]
pub struct MiddleNamePerson {
	person: Person,
	middle_name: RwLock<String>,
	registrar: ObservationRegistrar,
}

impl MiddleNamePerson {
	pub const MIDDLE_NAME: PropertyId = PropertyId::new(0, "middle_name");

	pub fn new(first_name: &str, middle_name: &str, last_name: &str) -> Self {
		Self {
			person: Person::new(first_name, last_name),
			middle_name: RwLock::new(middle_name.to_string()),
			registrar: ObservationRegistrar::new(),
		}
	}

	pub fn person(&self) -> &Person {
		&self.person
	}

	pub fn middle_name(&self) -> String {
		self.access(Self::MIDDLE_NAME);
		self.middle_name.read().clone()
	}

	pub fn set_middle_name(&self, name: &str) {
		self.with_mutation(Self::MIDDLE_NAME, || *self.middle_name.write() = name.to_string());
	}

	pub fn full_name(&self) -> String {
		format!(
			"{} {} {}",
			self.person.first_name(),
			self.middle_name(),
			self.person.last_name()
		)
	}
}

impl Observable for MiddleNamePerson {
	fn registrar(&self) -> &ObservationRegistrar {
		&self.registrar
	}
}

#[derive(Debug)]
pub struct RecursiveInner {
	value: RwLock<String>,
	registrar: ObservationRegistrar,
}

impl RecursiveInner {
	pub const VALUE: PropertyId = PropertyId::new(0, "value");

	pub fn new() -> Self {
		Self {
			value: RwLock::new("prefix".to_string()),
			registrar: ObservationRegistrar::new(),
		}
	}

	pub fn value(&self) -> String {
		self.access(Self::VALUE);
		self.value.read().clone()
	}

	pub fn set_value(&self, value: &str) {
		self.with_mutation(Self::VALUE, || *self.value.write() = value.to_string());
	}
}

impl Default for RecursiveInner {
	fn default() -> Self {
		Self::new()
	}
}

impl Observable for RecursiveInner {
	fn registrar(&self) -> &ObservationRegistrar {
		&self.registrar
	}
}

/// Runs a tracked execution nested inside another one.
///
/// The event counters are ignored properties.
#[derive(Debug)]
pub struct RecursiveOuter {
	inner: RwLock<Arc<RecursiveInner>>,
	value: RwLock<String>,
	inner_event_count: Arc<AtomicUsize>,
	outer_event_count: Arc<AtomicUsize>,
	registrar: ObservationRegistrar,
}

impl RecursiveOuter {
	pub const INNER: PropertyId = PropertyId::new(0, "inner");
	pub const VALUE: PropertyId = PropertyId::new(1, "value");

	pub fn new() -> Self {
		Self {
			inner: RwLock::new(Arc::new(RecursiveInner::new())),
			value: RwLock::new("prefix".to_string()),
			inner_event_count: Arc::new(AtomicUsize::new(0)),
			outer_event_count: Arc::new(AtomicUsize::new(0)),
			registrar: ObservationRegistrar::new(),
		}
	}

	pub fn inner(&self) -> Arc<RecursiveInner> {
		self.access(Self::INNER);
		Arc::clone(&self.inner.read())
	}

	pub fn set_inner(&self, inner: Arc<RecursiveInner>) {
		self.with_mutation(Self::INNER, || *self.inner.write() = inner);
	}

	pub fn value(&self) -> String {
		self.access(Self::VALUE);
		self.value.read().clone()
	}

	pub fn set_value(&self, value: &str) {
		self.with_mutation(Self::VALUE, || *self.value.write() = value.to_string());
	}

	pub fn inner_event_count(&self) -> usize {
		self.inner_event_count.load(Ordering::SeqCst)
	}

	pub fn outer_event_count(&self) -> usize {
		self.outer_event_count.load(Ordering::SeqCst)
	}

	/// Track `value` in an outer region and `inner.value` in a nested one.
	///
	/// Returns the inner value read by the nested region.
	pub fn recursive_tracking_calls(&self) -> String {
		let inner_events = Arc::clone(&self.inner_event_count);
		let outer_events = Arc::clone(&self.outer_event_count);
		with_observation_tracking(
			|| {
				let _ = self.value();
				with_observation_tracking(
					|| self.inner().value(),
					move || {
						inner_events.fetch_add(1, Ordering::SeqCst);
					},
				)
			},
			move || {
				outer_events.fetch_add(1, Ordering::SeqCst);
			},
		)
	}
}

impl Default for RecursiveOuter {
	fn default() -> Self {
		Self::new()
	}
}

impl Observable for RecursiveOuter {
	fn registrar(&self) -> &ObservationRegistrar {
		&self.registrar
	}
}

type PropertyHook = Box<dyn Fn(PropertyId) + Send + Sync>;

/// Overrides both instrumentation hooks to report every call.
pub struct ImplementsAccessAndMutation {
	field: RwLock<i64>,
	access_called: PropertyHook,
	with_mutation_called: PropertyHook,
	registrar: ObservationRegistrar,
}

impl ImplementsAccessAndMutation {
	pub const FIELD: PropertyId = PropertyId::new(0, "field");

	pub fn new<A, M>(access_called: A, with_mutation_called: M) -> Self
	where
		A: Fn(PropertyId) + Send + Sync + 'static,
		M: Fn(PropertyId) + Send + Sync + 'static,
	{
		Self {
			field: RwLock::new(3),
			access_called: Box::new(access_called),
			with_mutation_called: Box::new(with_mutation_called),
			registrar: ObservationRegistrar::new(),
		}
	}

	/// Variant that records hook calls into `log` as `"access:<name>"` and
	/// `"mutation:<name>"`.
	pub fn recording(log: Arc<Mutex<Vec<String>>>) -> Self {
		let access_log = Arc::clone(&log);
		Self::new(
			move |property| access_log.lock().push(format!("access:{property}")),
			move |property| log.lock().push(format!("mutation:{property}")),
		)
	}

	pub fn field(&self) -> i64 {
		self.access(Self::FIELD);
		*self.field.read()
	}

	pub fn set_field(&self, value: i64) {
		self.with_mutation(Self::FIELD, || *self.field.write() = value);
	}
}

impl Observable for ImplementsAccessAndMutation {
	fn registrar(&self) -> &ObservationRegistrar {
		&self.registrar
	}

	fn access(&self, property: PropertyId) {
		(self.access_called)(property);
		self.registrar.access(property);
	}

	fn with_mutation<T, F>(&self, property: PropertyId, mutation: F) -> T
	where
		F: FnOnce() -> T,
	{
		(self.with_mutation_called)(property);
		self.registrar.with_mutation(property, mutation)
	}
}
