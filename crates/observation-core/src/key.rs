//! Property identity
//!
//! A [`PropertyKey`] names one property of one subject instance. It is the
//! unit of interest in the observation system: tracked executions record the
//! keys they read, and mutations fire the contexts registered for a key.
//!
//! Subject identity is established by the subject's registrar. Each
//! observable object owns exactly one [`ObservationRegistrar`], and every
//! registrar draws a fresh [`SubjectId`] when it is created, so two subjects
//! never share an identity even if they compare equal by value.
//!
//! [`ObservationRegistrar`]: crate::ObservationRegistrar

use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

/// Identity of an observed object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubjectId(u64);

impl SubjectId {
	/// Allocate a new, process-unique subject identity.
	pub fn new() -> Self {
		static COUNTER: AtomicU64 = AtomicU64::new(1);
		Self(COUNTER.fetch_add(1, Ordering::Relaxed))
	}

	/// Raw numeric value, mainly for logging.
	pub fn as_u64(self) -> u64 {
		self.0
	}
}

impl Default for SubjectId {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Display for SubjectId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "subject#{}", self.0)
	}
}

/// Stable identifier for one property of an observable type.
///
/// Property ids are assigned when the observable type is defined, usually as
/// associated constants:
///
/// ```
/// use observation_core::PropertyId;
///
/// struct Person;
///
/// impl Person {
///     const NAME: PropertyId = PropertyId::new(0, "name");
///     const AGE: PropertyId = PropertyId::new(1, "age");
/// }
///
/// assert_ne!(Person::NAME, Person::AGE);
/// assert_eq!(Person::NAME.name(), "name");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PropertyId {
	index: u32,
	name: &'static str,
}

impl PropertyId {
	/// Create a property id from its declaration index and name.
	pub const fn new(index: u32, name: &'static str) -> Self {
		Self { index, name }
	}

	/// Declaration index within the owning type.
	pub const fn index(&self) -> u32 {
		self.index
	}

	/// Property name, as declared.
	pub const fn name(&self) -> &'static str {
		self.name
	}
}

impl fmt::Display for PropertyId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name)
	}
}

/// "This property of this subject".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PropertyKey {
	subject: SubjectId,
	property: PropertyId,
}

impl PropertyKey {
	/// Combine a subject identity with one of its properties.
	pub const fn new(subject: SubjectId, property: PropertyId) -> Self {
		Self { subject, property }
	}

	/// The owning subject.
	pub const fn subject(&self) -> SubjectId {
		self.subject
	}

	/// The property within the subject.
	pub const fn property(&self) -> PropertyId {
		self.property
	}
}

impl fmt::Display for PropertyKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}.{}", self.subject, self.property)
	}
}
