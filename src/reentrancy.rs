//! Debug-only detection of user code re-entering a table.
//!
//! Hashing, key extraction and key equality run while a chain is being
//! walked. If one of them calls back into the same table, debug builds
//! panic instead of observing a half-linked chain. Release builds carry
//! no state and no checks.

use core::cell::Cell;
use core::marker::PhantomData;

#[derive(Debug, Default)]
pub(crate) struct ReentrancyCheck {
    #[cfg(debug_assertions)]
    busy: Cell<bool>,
    // Cell-based state; the table stays !Sync.
    _not_sync: PhantomData<Cell<()>>,
}

impl ReentrancyCheck {
    pub(crate) const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            busy: Cell::new(false),
            _not_sync: PhantomData,
        }
    }

    /// Marks the owner busy until the returned guard drops.
    #[inline]
    pub(crate) fn enter(&self) -> Busy<'_> {
        #[cfg(debug_assertions)]
        {
            assert!(
                !self.busy.replace(true),
                "reentrant call into hash table from hash, key or equality callback"
            );
            Busy { owner: self }
        }

        #[cfg(not(debug_assertions))]
        {
            Busy { _owner: PhantomData }
        }
    }
}

pub(crate) struct Busy<'a> {
    #[cfg(debug_assertions)]
    owner: &'a ReentrancyCheck,
    #[cfg(not(debug_assertions))]
    _owner: PhantomData<&'a ()>,
}

impl Drop for Busy<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        self.owner.busy.set(false);
    }
}
