//! Re-entrancy suppression scopes.
//!
//! A component that drives an external collaborator (a native control, a
//! widget, another observer) often receives callbacks for mutations it issued
//! itself. The conventional fix is a mutable counter incremented before the
//! call and decremented after; the failure mode is an early return that skips
//! the decrement and leaves notifications suppressed forever.
//!
//! [`Suppression`] makes the invariant structural: entering a scope returns a
//! [`SuppressGuard`] whose `Drop` restores the counter, so every exit path -
//! including `?` and panics - balances the increment.
//!
//! Scopes nest. The suppression is active while any guard is alive.

use std::sync::atomic::{AtomicUsize, Ordering};

/// A nestable suppression counter.
///
/// # Example
///
/// ```
/// use trellis_core::Suppression;
///
/// let suppression = Suppression::new();
/// {
///     let _outer = suppression.enter();
///     let _inner = suppression.enter();
///     assert_eq!(suppression.depth(), 2);
/// }
/// assert!(!suppression.is_active());
/// ```
#[derive(Debug, Default)]
pub struct Suppression {
    depth: AtomicUsize,
}

impl Suppression {
    /// Creates an inactive suppression counter.
    pub const fn new() -> Self {
        Self {
            depth: AtomicUsize::new(0),
        }
    }

    /// Enters a suppression scope.
    ///
    /// The counter stays incremented until the returned guard is dropped.
    #[must_use = "suppression ends as soon as the guard is dropped"]
    pub fn enter(&self) -> SuppressGuard<'_> {
        self.depth.fetch_add(1, Ordering::SeqCst);
        SuppressGuard { owner: self }
    }

    /// Returns `true` while at least one scope is alive.
    pub fn is_active(&self) -> bool {
        self.depth() > 0
    }

    /// Returns the current nesting depth.
    pub fn depth(&self) -> usize {
        self.depth.load(Ordering::SeqCst)
    }
}

/// RAII guard returned by [`Suppression::enter`].
///
/// Dropping the guard decrements the counter.
pub struct SuppressGuard<'a> {
    owner: &'a Suppression,
}

impl Drop for SuppressGuard<'_> {
    fn drop(&mut self) {
        self.owner.depth.fetch_sub(1, Ordering::SeqCst);
    }
}

static_assertions::assert_impl_all!(Suppression: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_restores_depth() {
        let suppression = Suppression::new();
        assert!(!suppression.is_active());

        {
            let _guard = suppression.enter();
            assert!(suppression.is_active());
            assert_eq!(suppression.depth(), 1);
        }

        assert!(!suppression.is_active());
        assert_eq!(suppression.depth(), 0);
    }

    #[test]
    fn scopes_nest() {
        let suppression = Suppression::new();
        let outer = suppression.enter();
        {
            let _inner = suppression.enter();
            assert_eq!(suppression.depth(), 2);
        }
        assert_eq!(suppression.depth(), 1);
        drop(outer);
        assert!(!suppression.is_active());
    }

    #[test]
    fn guard_restores_on_early_exit() {
        let suppression = Suppression::new();

        fn early_return(suppression: &Suppression) -> Option<()> {
            let _guard = suppression.enter();
            None?
        }

        let _ = early_return(&suppression);
        assert!(!suppression.is_active());
    }
}
