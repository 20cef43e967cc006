//! # Observation Core
//!
//! Property-level change tracking for arbitrary mutable objects.
//!
//! Subjects report reads and writes of their individual properties to an
//! [`ObservationRegistrar`]. A caller runs a closure with
//! [`with_observation_tracking`]; every property the closure reads is
//! recorded, and the first later mutation of any of them runs the caller's
//! `on_change` callback, exactly once.
//!
//! ## Architecture
//!
//! 1. **Property keys** ([`key`]): subject identity plus a stable per-property id.
//! 2. **Tracking contexts** ([`context`]): one per tracked execution; observed
//!    keys, a one-shot callback, and an atomic fired flag.
//! 3. **Tracking stack** ([`stack`]): thread-local, innermost last. Reads are
//!    recorded on every active frame, which is what makes nested tracked
//!    executions each observe the same read.
//! 4. **Registrar** ([`registrar`]): per-subject interest table, `access` and
//!    `with_mutation`.
//!
//! Tracking is per thread; firing may come from any thread.
//!
//! ## Example
//!
//! ```
//! use observation_core::{Observable, ObservationRegistrar, PropertyId, with_observation_tracking};
//! use parking_lot::RwLock;
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! struct Person {
//!     name: RwLock<String>,
//!     age: RwLock<u32>,
//!     registrar: ObservationRegistrar,
//! }
//!
//! impl Person {
//!     const NAME: PropertyId = PropertyId::new(0, "name");
//!     const AGE: PropertyId = PropertyId::new(1, "age");
//!
//!     fn name(&self) -> String {
//!         self.access(Self::NAME);
//!         self.name.read().clone()
//!     }
//!
//!     fn set_name(&self, name: &str) {
//!         self.with_mutation(Self::NAME, || *self.name.write() = name.to_string());
//!     }
//!
//!     fn set_age(&self, age: u32) {
//!         self.with_mutation(Self::AGE, || *self.age.write() = age);
//!     }
//! }
//!
//! impl Observable for Person {
//!     fn registrar(&self) -> &ObservationRegistrar {
//!         &self.registrar
//!     }
//! }
//!
//! let person = Person {
//!     name: RwLock::new("Tom".into()),
//!     age: RwLock::new(25),
//!     registrar: ObservationRegistrar::new(),
//! };
//! let changes = Arc::new(AtomicUsize::new(0));
//!
//! with_observation_tracking(|| person.name(), {
//!     let changes = Arc::clone(&changes);
//!     move || {
//!         changes.fetch_add(1, Ordering::SeqCst);
//!     }
//! });
//!
//! person.set_age(26);
//! assert_eq!(changes.load(Ordering::SeqCst), 0);
//!
//! person.set_name("Tom!");
//! assert_eq!(changes.load(Ordering::SeqCst), 1);
//!
//! person.set_name("Tom!!");
//! assert_eq!(changes.load(Ordering::SeqCst), 1);
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod key;
pub mod observable;
pub mod registrar;
pub mod stack;
pub mod tracking;

pub use config::{ENV_PREFIX, FirePolicy, RegistrarConfig};
pub use context::{ContextId, ContextState, TrackingContext};
pub use error::{ConfigError, TrackingError, TrackingResult};
pub use key::{PropertyId, PropertyKey, SubjectId};
pub use observable::Observable;
pub use registrar::ObservationRegistrar;
pub use stack::TrackingStack;
pub use tracking::{
	TrackingHandle, TrackingScope, begin_tracking, end_tracking, try_end_tracking,
	with_observation_tracking,
};
