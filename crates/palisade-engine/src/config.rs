//! Engine defaults and limits

use serde::{Deserialize, Serialize};

/// System-wide evaluation defaults
///
/// The bulk-check limits are the fallbacks used when a
/// [`PermissionCheckCollection`](crate::cutoff::PermissionCheckCollection)
/// carries zero or negative limits. The depth bound guards the
/// inheritance ascent against misconfigured node graphs; the chain is
/// a tree by convention but that is not enforced at this layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Default cap on permission checks per bulk filter
    pub max_permission_checks: usize,
    /// Default cap on wall-clock time per bulk filter, in milliseconds
    pub max_permission_check_time_ms: u64,
    /// Maximum number of levels the inheritance ascent may visit
    pub max_acl_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_permission_checks: 10_000,
            max_permission_check_time_ms: 10_000,
            max_acl_depth: 1_000,
        }
    }
}
