//! The process-wide slot holding the factory every new [Client](crate::Client)
//! uses to construct its transports.
//!
//! Rust runs tests on parallel threads, so installs and restores are
//! serialized by a process-wide lock that a [PatchScope](crate::PatchScope)
//! holds for its whole lifetime.

use std::{
    cell::Cell,
    sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError, RwLock},
};

use tracing::debug;

use crate::{HttpTransport, Transport};

/// Builds the transport a [Client](crate::Client) mounts for a URL scheme.
pub type TransportFactory = Arc<dyn Fn() -> Arc<dyn Transport> + Send + Sync>;

static INSTALLED: RwLock<Option<TransportFactory>> = RwLock::new(None);
static DEFAULT: OnceLock<TransportFactory> = OnceLock::new();
static SCOPE_LOCK: Mutex<()> = Mutex::new(());

thread_local! {
    static LOCK_HELD: Cell<bool> = const { Cell::new(false) };
}

/// The factory used when nothing is patched. It builds [HttpTransport]s.
pub fn default_factory() -> TransportFactory {
    DEFAULT
        .get_or_init(|| {
            let factory: TransportFactory =
                Arc::new(|| Arc::new(HttpTransport::new()) as Arc<dyn Transport>);
            factory
        })
        .clone()
}

/// The factory currently in effect. Compare factories with [Arc::ptr_eq].
pub fn installed_factory() -> TransportFactory {
    INSTALLED
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
        .unwrap_or_else(default_factory)
}

/// Returns true while a substitute factory is installed.
pub fn is_patched() -> bool {
    INSTALLED
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .is_some()
}

/// Builds a transport with the installed factory.
pub fn build_transport() -> Arc<dyn Transport> {
    (installed_factory())()
}

/// Replaces the installed factory, returning the previous one. `None` means
/// the default factory.
pub(crate) fn swap_factory(factory: Option<TransportFactory>) -> Option<TransportFactory> {
    let mut installed = INSTALLED.write().unwrap_or_else(PoisonError::into_inner);
    let previous = std::mem::replace(&mut *installed, factory);
    debug!(patched = installed.is_some(), "transport factory replaced");
    previous
}

/// Exclusive hold on the registry. No other [PatchScope](crate::PatchScope)
/// can be entered, on any thread, until it is dropped.
#[derive(Debug)]
pub struct RegistryLock {
    _guard: MutexGuard<'static, ()>,
}

/// Blocks until no other thread holds the registry, then holds it.
///
/// Tests that need the real transport can hold this to keep patch scopes in
/// other tests from intercepting their requests.
///
/// # Panics
///
/// Panics if the current thread already holds the registry, e.g. when patch
/// scopes are nested.
pub fn exclusive() -> RegistryLock {
    if LOCK_HELD.with(Cell::get) {
        panic!(
            "the transport registry is already held on this thread; patch scopes cannot be nested"
        );
    }

    // A panicking test poisons the lock while unwinding out of its scope. The
    // factory has already been restored by then.
    let guard = SCOPE_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    LOCK_HELD.with(|held| held.set(true));
    RegistryLock { _guard: guard }
}

impl Drop for RegistryLock {
    fn drop(&mut self) {
        LOCK_HELD.with(|held| held.set(false));
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn default_factory_is_stable() {
        assert!(Arc::ptr_eq(&default_factory(), &default_factory()));
    }

    #[test]
    fn unpatched_registry_uses_default() {
        let _lock = exclusive();
        assert!(!is_patched());
        assert!(Arc::ptr_eq(&installed_factory(), &default_factory()));
    }

    #[test]
    fn swap_and_restore() {
        let _lock = exclusive();
        let original = installed_factory();

        let substitute: TransportFactory =
            Arc::new(|| Arc::new(HttpTransport::new()) as Arc<dyn Transport>);
        let previous = swap_factory(Some(substitute.clone()));
        assert!(previous.is_none());
        assert!(is_patched());
        assert!(Arc::ptr_eq(&installed_factory(), &substitute));

        let replaced = swap_factory(previous);
        assert!(replaced.is_some_and(|replaced| Arc::ptr_eq(&replaced, &substitute)));
        assert!(Arc::ptr_eq(&installed_factory(), &original));
    }

    #[test]
    fn lock_is_released_on_drop() {
        drop(exclusive());
        let _lock = exclusive();
    }

    #[test]
    #[should_panic(expected = "cannot be nested")]
    fn nested_lock_panics() {
        let _outer = exclusive();
        let _inner = exclusive();
    }
}
