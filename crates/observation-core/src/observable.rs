//! Instrumentation boundary
//!
//! Observable types are normally produced by a code generator that rewrites
//! each stored property into a getter/setter pair. The generated code only
//! relies on the [`Observable`] trait: getters call [`Observable::access`],
//! setters wrap the write in [`Observable::with_mutation`], and properties
//! marked as ignored call neither.
//!
//! Hand-written instrumentation looks like this:
//!
//! ```
//! use observation_core::{Observable, ObservationRegistrar, PropertyId};
//! use parking_lot::RwLock;
//!
//! struct Car {
//!     name: RwLock<String>,
//!     needs_repairs: RwLock<bool>,
//!     registrar: ObservationRegistrar,
//! }
//!
//! impl Car {
//!     const NAME: PropertyId = PropertyId::new(0, "name");
//!     const NEEDS_REPAIRS: PropertyId = PropertyId::new(1, "needs_repairs");
//!
//!     fn name(&self) -> String {
//!         self.access(Self::NAME);
//!         self.name.read().clone()
//!     }
//!
//!     fn set_name(&self, name: impl Into<String>) {
//!         let name = name.into();
//!         self.with_mutation(Self::NAME, || *self.name.write() = name);
//!     }
//!
//!     fn needs_repairs(&self) -> bool {
//!         self.access(Self::NEEDS_REPAIRS);
//!         *self.needs_repairs.read()
//!     }
//! }
//!
//! impl Observable for Car {
//!     fn registrar(&self) -> &ObservationRegistrar {
//!         &self.registrar
//!     }
//! }
//!
//! let car = Car {
//!     name: RwLock::new("Herbie".into()),
//!     needs_repairs: RwLock::new(false),
//!     registrar: ObservationRegistrar::new(),
//! };
//! car.set_name("Lightning");
//! assert_eq!(car.name(), "Lightning");
//! assert!(!car.needs_repairs());
//! ```

use crate::key::{PropertyId, PropertyKey, SubjectId};
use crate::registrar::ObservationRegistrar;

/// A type whose property reads and writes are reported to a registrar.
pub trait Observable {
	/// The registrar owned by this subject.
	fn registrar(&self) -> &ObservationRegistrar;

	/// Identity of this subject.
	fn subject_id(&self) -> SubjectId {
		self.registrar().subject_id()
	}

	/// Key of `property` on this subject.
	fn property_key(&self, property: PropertyId) -> PropertyKey {
		self.registrar().key(property)
	}

	/// Report a read of `property`.
	///
	/// Override to observe reads; overrides must still forward to the
	/// registrar for tracking to work.
	fn access(&self, property: PropertyId) {
		self.registrar().access(property);
	}

	/// Perform a write of `property`, notifying interested observers.
	fn with_mutation<T, F>(&self, property: PropertyId, mutation: F) -> T
	where
		Self: Sized,
		F: FnOnce() -> T,
	{
		self.registrar().with_mutation(property, mutation)
	}
}

impl<O: Observable> Observable for std::sync::Arc<O> {
	fn registrar(&self) -> &ObservationRegistrar {
		(**self).registrar()
	}

	fn access(&self, property: PropertyId) {
		(**self).access(property);
	}

	fn with_mutation<T, F>(&self, property: PropertyId, mutation: F) -> T
	where
		F: FnOnce() -> T,
	{
		(**self).with_mutation(property, mutation)
	}
}
