//! # Observation
//!
//! Fine-grained observation of mutable objects.
//!
//! Run a closure under [`with_observation_tracking`]; every instrumented
//! property it reads is recorded, and the first later mutation of any of
//! those properties calls back exactly once. Re-run the closure from the
//! callback to keep observing.
//!
//! Types opt in by owning an [`ObservationRegistrar`] and implementing
//! [`Observable`]: getters call [`Observable::access`], setters wrap the
//! write in [`Observable::with_mutation`].
//!
//! ## Quick Example
//!
//! ```
//! use observation::prelude::*;
//! use parking_lot::RwLock;
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! struct Thermostat {
//!     target: RwLock<f32>,
//!     registrar: ObservationRegistrar,
//! }
//!
//! impl Thermostat {
//!     const TARGET: PropertyId = PropertyId::new(0, "target");
//!
//!     fn target(&self) -> f32 {
//!         self.access(Self::TARGET);
//!         *self.target.read()
//!     }
//!
//!     fn set_target(&self, value: f32) {
//!         self.with_mutation(Self::TARGET, || *self.target.write() = value);
//!     }
//! }
//!
//! impl Observable for Thermostat {
//!     fn registrar(&self) -> &ObservationRegistrar {
//!         &self.registrar
//!     }
//! }
//!
//! let thermostat = Thermostat {
//!     target: RwLock::new(20.0),
//!     registrar: ObservationRegistrar::new(),
//! };
//! let redraws = Arc::new(AtomicUsize::new(0));
//!
//! let shown = with_observation_tracking(|| thermostat.target(), {
//!     let redraws = Arc::clone(&redraws);
//!     move || {
//!         redraws.fetch_add(1, Ordering::SeqCst);
//!     }
//! });
//! assert_eq!(shown, 20.0);
//!
//! thermostat.set_target(21.5);
//! thermostat.set_target(22.0);
//! assert_eq!(redraws.load(Ordering::SeqCst), 1);
//! ```
//!
//! ## Configuration
//!
//! Registrars take a [`RegistrarConfig`], either built in code or read from
//! `OBSERVATION_*` environment variables with [`RegistrarConfig::from_env`].
//! The [`FirePolicy`] decides whether a mutation that fails still notifies.

pub use observation_core::{
	ConfigError, ContextId, ContextState, ENV_PREFIX, FirePolicy, Observable,
	ObservationRegistrar, PropertyId, PropertyKey, RegistrarConfig, SubjectId, TrackingContext,
	TrackingError, TrackingHandle, TrackingResult, TrackingScope, TrackingStack, begin_tracking,
	end_tracking, try_end_tracking, with_observation_tracking,
};

/// Lower-level building blocks.
pub mod engine {
	pub use observation_core::{config, context, error, key, observable, registrar, stack, tracking};
}

/// Everything needed to instrument a type and track it.
pub mod prelude {
	pub use crate::{
		FirePolicy, Observable, ObservationRegistrar, PropertyId, PropertyKey, RegistrarConfig,
		TrackingScope, with_observation_tracking,
	};
}
