//! Injectable dependency slots.
//!
//! Beans are shared (`Arc`) from the moment they are registered, so
//! the injector cannot hand them `&mut self`. An [`Autowired`] field gives
//! the setter somewhere to write through a shared reference.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

/// A field that receives a dependency during the injection phase.
///
/// The slot starts empty. The injector calls [`set`](Autowired::set) once
/// per wiring with whatever the registry held under the field's key,
/// which may be nothing.
///
/// # Examples
/// ```
/// use khazna_container::autowired::Autowired;
/// use std::sync::Arc;
///
/// let slot: Autowired<String> = Autowired::new();
/// assert!(!slot.is_wired());
///
/// slot.set(Some(Arc::new("jdbc:h2:mem".to_string())));
/// assert_eq!(slot.get().as_deref().map(String::as_str), Some("jdbc:h2:mem"));
/// ```
pub struct Autowired<T: ?Sized> {
    value: RwLock<Option<Arc<T>>>,
}

impl<T: ?Sized> Autowired<T> {
    pub fn new() -> Self {
        Self {
            value: RwLock::new(None),
        }
    }

    /// Replaces the slot's value. `None` clears it.
    pub fn set(&self, value: Option<Arc<T>>) {
        *self.value.write() = value;
    }

    /// Returns the wired dependency, if any.
    pub fn get(&self) -> Option<Arc<T>> {
        self.value.read().clone()
    }

    /// Returns `true` once a value has been wired.
    pub fn is_wired(&self) -> bool {
        self.value.read().is_some()
    }
}

impl<T: ?Sized> Default for Autowired<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> fmt::Debug for Autowired<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Autowired")
            .field("target", &std::any::type_name::<T>())
            .field("wired", &self.is_wired())
            .finish()
    }
}
