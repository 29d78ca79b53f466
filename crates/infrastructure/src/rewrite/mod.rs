//! Header-rewrite service: forced-header rules and the worker that
//! installs them.

mod rule_table;
mod service;

pub use rule_table::HeaderRuleTable;
pub use service::{RewriteHandle, RewriteWorker, rewrite_channel};
