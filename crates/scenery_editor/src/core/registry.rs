//! Live-reference registry
//!
//! Process-wide table of currently-live reference-counted objects. The
//! registry answers one question: is this address still a valid live object?
//! [`crate::core::WeakRef`] validity checks are membership tests against it.
//!
//! Individual `register`/`unregister`/`is_live` calls are linearizable; the
//! guarding lock is held only for the duration of a single set operation.
//! A `true` answer from `is_live` is only meaningful on the thread that owns
//! the strong handles — under concurrent destruction the object may die the
//! instant after the check. Cross-thread weak validity requires external
//! synchronization.

use log::trace;
use std::collections::HashSet;
use std::sync::{Mutex, OnceLock, PoisonError};

/// Set of addresses of currently-undestroyed reference-counted objects
///
/// The process-wide instance lives behind [`LiveRegistry::global`]; standalone
/// instances can be constructed for tests.
#[derive(Debug, Default)]
pub struct LiveRegistry {
    live: Mutex<HashSet<usize>>,
}

static GLOBAL: OnceLock<LiveRegistry> = OnceLock::new();

impl LiveRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry used by the `Ref` machinery
    ///
    /// Created on first use, torn down at process exit. Code running during
    /// global teardown must not depend on registry state.
    pub fn global() -> &'static LiveRegistry {
        GLOBAL.get_or_init(LiveRegistry::new)
    }

    /// Add an address to the live set
    ///
    /// Registering an address that is already present is a no-op, so the
    /// per-handle increment path may call this unconditionally.
    pub fn register(&self, address: usize) {
        debug_assert!(address != 0, "registering null address");
        let mut live = self.lock();
        if live.insert(address) {
            trace!("live registry: +{:#x} ({} live)", address, live.len());
        }
    }

    /// Remove an address from the live set
    ///
    /// Removing an address that is not present is a no-op.
    pub fn unregister(&self, address: usize) {
        let mut live = self.lock();
        if live.remove(&address) {
            trace!("live registry: -{:#x} ({} live)", address, live.len());
        }
    }

    /// Membership test; `false` for the null address
    ///
    /// An absent address is guaranteed dead. A present address is guaranteed
    /// not-yet-destroyed at the time of the check only.
    pub fn is_live(&self, address: usize) -> bool {
        if address == 0 {
            return false;
        }
        self.lock().contains(&address)
    }

    /// Number of currently-live objects (diagnostics)
    pub fn live_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashSet<usize>> {
        // A panic mid-insert/remove cannot leave the set torn; recover the
        // guard rather than poisoning every later liveness check.
        self.live.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_register_and_query() {
        let registry = LiveRegistry::new();

        assert!(!registry.is_live(0x1000));
        registry.register(0x1000);
        assert!(registry.is_live(0x1000));
        assert_eq!(registry.live_count(), 1);

        registry.unregister(0x1000);
        assert!(!registry.is_live(0x1000));
        assert_eq!(registry.live_count(), 0);
    }

    #[test]
    fn test_null_is_never_live() {
        let registry = LiveRegistry::new();
        assert!(!registry.is_live(0));
    }

    #[test]
    fn test_duplicate_register_and_absent_unregister_are_noops() {
        let registry = LiveRegistry::new();

        registry.register(0x2000);
        registry.register(0x2000);
        assert_eq!(registry.live_count(), 1);

        registry.unregister(0x2000);
        registry.unregister(0x2000);
        assert_eq!(registry.live_count(), 0);
    }

    #[test]
    fn test_concurrent_mutation_does_not_corrupt() {
        let registry = Arc::new(LiveRegistry::new());
        let mut handles = Vec::new();

        for thread_index in 0..8usize {
            let registry = Arc::clone(&registry);
            handles.push(thread::spawn(move || {
                for i in 0..500usize {
                    let address = 0x1_0000 + thread_index * 0x1000 + i;
                    registry.register(address);
                    assert!(registry.is_live(address));
                    registry.unregister(address);
                }
            }));
        }

        for handle in handles {
            handle.join().expect("registry worker panicked");
        }
        assert_eq!(registry.live_count(), 0);
    }
}
