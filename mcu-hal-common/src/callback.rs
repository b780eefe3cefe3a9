//! Interrupt callbacks
//!
//! A driver keeps at most one user callback. Interrupt handlers read the
//! slot while thread code may be replacing it, and a `&dyn Fn` is two words
//! wide, so every access happens inside a critical section.

use core::cell::Cell;
use critical_section::Mutex;

/// Storage for a single event callback.
pub struct CallbackSlot<'a, E> {
    callback: Mutex<Cell<Option<&'a dyn Fn(E)>>>,
}

impl<E> Default for CallbackSlot<'_, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, E> CallbackSlot<'a, E> {
    /// An empty slot.
    pub const fn new() -> Self {
        Self {
            callback: Mutex::new(Cell::new(None)),
        }
    }

    /// Installs `callback`, replacing any previous one.
    pub fn register(&self, callback: &'a dyn Fn(E)) {
        critical_section::with(|cs| self.callback.borrow(cs).set(Some(callback)));
    }

    /// Removes the callback.
    pub fn clear(&self) {
        critical_section::with(|cs| self.callback.borrow(cs).set(None));
    }

    /// Returns `true` if a callback is installed.
    pub fn is_set(&self) -> bool {
        critical_section::with(|cs| self.callback.borrow(cs).get().is_some())
    }

    /// Calls the installed callback with `event`.
    ///
    /// The callback itself runs outside the critical section. Returns `false`
    /// if no callback was installed.
    pub fn invoke(&self, event: E) -> bool {
        let callback = critical_section::with(|cs| self.callback.borrow(cs).get());
        match callback {
            Some(f) => {
                f(event);
                true
            }
            None => false,
        }
    }
}
