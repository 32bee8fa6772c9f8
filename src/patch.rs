use std::{fmt, ops::Deref, sync::Arc};

use tracing::debug;

use crate::{
    registry::{self, RegistryLock, TransportFactory},
    InterceptAdapter, Transport,
};

/// Keeps an [InterceptAdapter] installed as the transport of every
/// [Client](crate::Client) created while the scope is alive.
///
/// Dropping the scope restores the previous transport factory, including when
/// the test panics. Only one scope can be active in the process at a time:
/// entering a scope while another thread holds one blocks until it is
/// dropped.
///
/// The scope dereferences to its adapter, so assertions can be made on it
/// directly.
pub struct PatchScope {
    adapter: Arc<InterceptAdapter>,
    previous: Option<TransportFactory>,
    // Must be released after the previous factory is restored in drop.
    _lock: RegistryLock,
}

impl PatchScope {
    /// Installs an [InterceptAdapter] for `path`.
    ///
    /// # Panics
    ///
    /// Panics if the current thread is already inside a patch scope.
    pub fn enter(path: impl Into<String>) -> Self {
        let lock = registry::exclusive();
        let adapter = Arc::new(InterceptAdapter::new(path));

        let factory: TransportFactory = {
            let adapter = adapter.clone();
            Arc::new(move || adapter.clone() as Arc<dyn Transport>)
        };
        let previous = registry::swap_factory(Some(factory));
        debug!(path = adapter.path(), "patch scope entered");

        Self {
            adapter,
            previous,
            _lock: lock,
        }
    }

    pub fn adapter(&self) -> &Arc<InterceptAdapter> {
        &self.adapter
    }

    /// Ends the scope. Equivalent to dropping it.
    pub fn exit(self) {}
}

impl fmt::Debug for PatchScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatchScope")
            .field("adapter", &self.adapter)
            .finish_non_exhaustive()
    }
}

impl Deref for PatchScope {
    type Target = InterceptAdapter;

    fn deref(&self) -> &InterceptAdapter {
        &self.adapter
    }
}

impl Drop for PatchScope {
    fn drop(&mut self) {
        registry::swap_factory(self.previous.take());
        debug!(path = self.adapter.path(), "patch scope exited");
    }
}

/// Patches the transport for requests to `path`. See [PatchScope].
pub fn patch(path: impl Into<String>) -> PatchScope {
    PatchScope::enter(path)
}
