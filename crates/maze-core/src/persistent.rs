//! Scene-surviving state with first-writer-wins installation.
//!
//! Every time a level loads it brings its own candidate instance of the
//! long-lived managers (the checkpoint store, for one). Only the first
//! candidate ever offered becomes canonical. Later ones are dropped and the
//! caller gets a handle to the existing instance instead.
//!
//! The slot lives on the session, not in a static, so tests can create as
//! many independent "processes" as they like.
//!
//! # Example
//!
//! ```
//! use maze_core::persistent::{Claim, PersistentSlot};
//!
//! let mut slot = PersistentSlot::new("scoreboard");
//! let (first, claim) = slot.claim(|| vec![1]);
//! assert_eq!(claim, Claim::Installed);
//!
//! first.borrow_mut().push(2);
//!
//! let (second, claim) = slot.claim(|| vec![99]);
//! assert_eq!(claim, Claim::Discarded);
//! assert_eq!(*second.borrow(), vec![1, 2]);
//! ```

use std::cell::RefCell;
use std::rc::Rc;

/// Shared single-threaded handle to persistent state.
pub type Shared<T> = Rc<RefCell<T>>;

/// What happened to a candidate passed to [`PersistentSlot::claim`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claim {
    /// The candidate became the canonical instance.
    Installed,
    /// An instance already existed; the candidate was dropped.
    Discarded,
}

/// Holds at most one canonical instance of `T` for the lifetime of its owner.
#[derive(Debug)]
pub struct PersistentSlot<T> {
    name: &'static str,
    inner: Option<Shared<T>>,
}

impl<T> PersistentSlot<T> {
    /// An empty slot. `name` only appears in logs.
    pub fn new(name: &'static str) -> Self {
        Self { name, inner: None }
    }

    /// Offer a candidate. The closure only runs when the slot is empty.
    pub fn claim(&mut self, candidate: impl FnOnce() -> T) -> (Shared<T>, Claim) {
        match &self.inner {
            Some(existing) => {
                tracing::debug!(slot = self.name, "persistent instance exists, discarding candidate");
                (Rc::clone(existing), Claim::Discarded)
            }
            None => {
                let shared = Rc::new(RefCell::new(candidate()));
                self.inner = Some(Rc::clone(&shared));
                tracing::debug!(slot = self.name, "installed persistent instance");
                (shared, Claim::Installed)
            }
        }
    }

    /// The canonical instance, if one was installed.
    pub fn get(&self) -> Option<Shared<T>> {
        self.inner.as_ref().map(Rc::clone)
    }

    /// Whether an instance was installed.
    pub fn is_installed(&self) -> bool {
        self.inner.is_some()
    }
}
