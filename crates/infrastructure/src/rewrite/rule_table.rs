//! Forced-header rules shared between the rewrite worker and the transport.

use std::collections::BTreeMap;
use std::sync::Arc;

use courier_domain::HeaderPair;
use parking_lot::RwLock;

/// Override rules keyed by the exact URL they apply to.
///
/// Cloning is cheap; clones share the same table.
#[derive(Debug, Clone, Default)]
pub struct HeaderRuleTable {
    rules: Arc<RwLock<BTreeMap<String, Vec<HeaderPair>>>>,
}

impl HeaderRuleTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the rules for `url`, replacing whatever was there.
    pub fn install(&self, url: impl Into<String>, headers: Vec<HeaderPair>) {
        self.rules.write().insert(url.into(), headers);
    }

    /// Removes every rule.
    pub fn clear(&self) {
        self.rules.write().clear();
    }

    /// The rules for exactly this URL. No prefix or pattern matching.
    #[must_use]
    pub fn rules_for(&self, url: &str) -> Vec<HeaderPair> {
        self.rules.read().get(url).cloned().unwrap_or_default()
    }

    /// Number of URLs with rules installed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.read().len()
    }

    /// Returns true if no rules are installed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.read().is_empty()
    }
}
