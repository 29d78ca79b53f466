//! Platform services injected into the workspace session.

use std::sync::Arc;

use crate::ports::{HeaderRewriteService, KeyValueStore};

/// The host facilities the engine relies on.
///
/// Passed in at construction; nothing in the engine reaches for a global.
#[derive(Clone)]
pub struct PlatformServices {
    /// Persisted key-value store and its change stream.
    pub storage: Arc<dyn KeyValueStore>,
    /// Privileged header-rewrite service.
    pub messaging: Arc<dyn HeaderRewriteService>,
}

impl PlatformServices {
    /// Bundles the given services.
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStore>, messaging: Arc<dyn HeaderRewriteService>) -> Self {
        Self { storage, messaging }
    }
}

impl std::fmt::Debug for PlatformServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformServices").finish_non_exhaustive()
    }
}
