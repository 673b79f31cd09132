//! Type-keyed storage attached to a request
//!
//! The router uses it to hand route-level settings to middleware.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type Slot = Box<dyn Any + Send + Sync>;

/// Values keyed by their type, shared between clones.
#[derive(Clone, Default)]
pub struct Extensions {
	slots: Arc<Mutex<HashMap<TypeId, Slot>>>,
}

impl Extensions {
	pub fn new() -> Self {
		Self::default()
	}

	// A panic while holding the lock cannot leave a slot half-written.
	fn slots(&self) -> MutexGuard<'_, HashMap<TypeId, Slot>> {
		self.slots.lock().unwrap_or_else(PoisonError::into_inner)
	}

	/// Store `value`, replacing the previous value of type `T`.
	///
	/// # Examples
	///
	/// ```
	/// use etagger_http::Extensions;
	///
	/// let extensions = Extensions::new();
	/// extensions.insert(42u32);
	///
	/// assert_eq!(extensions.get::<u32>(), Some(42));
	/// assert_eq!(extensions.get::<String>(), None);
	/// ```
	pub fn insert<T: Send + Sync + 'static>(&self, value: T) {
		self.slots().insert(TypeId::of::<T>(), Box::new(value));
	}

	/// Copy of the stored `T`, if any.
	pub fn get<T: Clone + Send + Sync + 'static>(&self) -> Option<T> {
		self.slots()
			.get(&TypeId::of::<T>())
			.and_then(|slot| slot.downcast_ref::<T>().cloned())
	}

	pub fn contains<T: Send + Sync + 'static>(&self) -> bool {
		self.slots().contains_key(&TypeId::of::<T>())
	}

	/// Take the stored `T` out.
	pub fn remove<T: Send + Sync + 'static>(&self) -> Option<T> {
		let slot = self.slots().remove(&TypeId::of::<T>())?;
		slot.downcast::<T>().ok().map(|value| *value)
	}
}

impl fmt::Debug for Extensions {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Extensions")
			.field("len", &self.slots().len())
			.finish()
	}
}
