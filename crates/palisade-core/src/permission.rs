//! Permission references, access status, and the interning model
//!
//! A [`PermissionReference`] names a permission scoped to a model
//! class or aspect. References are used as map keys on every
//! evaluation, so the [`PermissionModel`] interns them and hands out
//! shared [`Arc`]s.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::identifiers::QName;

/// The name of the wildcard permission that matches every permission
pub const ALL_PERMISSION: &str = "All";

/// Namespace for the built-in permission model
pub const PERMISSION_MODEL_NAMESPACE: &str = "http://palisade.dev/model/security/1.0";

/// Outcome of a permission evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccessStatus {
    /// Access is granted
    Allowed,
    /// Access is refused
    Denied,
    /// No policy exists; advisory callers may distinguish this from
    /// an explicit denial, everyone else treats it as denied
    Undetermined,
}

/// A named permission scoped to a type or aspect
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PermissionReference {
    qname: QName,
    name: String,
}

impl PermissionReference {
    /// Create a permission reference
    ///
    /// Prefer [`PermissionModel::get`] which interns the result.
    pub fn new(qname: QName, name: impl Into<String>) -> Self {
        Self {
            qname,
            name: name.into(),
        }
    }

    /// The type or aspect the permission is scoped to
    pub fn qname(&self) -> &QName {
        &self.qname
    }

    /// The permission name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this is the wildcard permission matching everything
    pub fn is_all(&self) -> bool {
        self.name == ALL_PERMISSION
    }
}

impl fmt::Display for PermissionReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.qname, self.name)
    }
}

static INTERNED: Lazy<RwLock<HashMap<PermissionReference, Arc<PermissionReference>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Interning registry for permission references
///
/// Equal `(qname, name)` inputs always return the same `Arc`, so
/// evaluation code can compare references cheaply and reuse them as
/// keys without re-allocating.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissionModel;

impl PermissionModel {
    /// Fetch or intern the reference for `(qname, name)`
    pub fn get(qname: QName, name: impl Into<String>) -> Arc<PermissionReference> {
        let key = PermissionReference::new(qname, name);
        if let Some(existing) = INTERNED.read().get(&key) {
            return Arc::clone(existing);
        }
        let mut cache = INTERNED.write();
        // Re-check: another thread may have interned between locks
        if let Some(existing) = cache.get(&key) {
            return Arc::clone(existing);
        }
        let interned = Arc::new(key.clone());
        cache.insert(key, Arc::clone(&interned));
        interned
    }

    /// Fetch a reference in the built-in security namespace
    pub fn named(name: impl Into<String>) -> Arc<PermissionReference> {
        Self::get(
            QName::new(PERMISSION_MODEL_NAMESPACE, "base"),
            name,
        )
    }

    /// The wildcard permission
    pub fn all() -> Arc<PermissionReference> {
        Self::named(ALL_PERMISSION)
    }
}
