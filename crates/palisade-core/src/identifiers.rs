//! Qualified names and node references
//!
//! `QName` scopes a local name with a namespace URI. `NodeRef` is the
//! identity of a repository node: a store plus a UUID. Both are small
//! immutable value types used as map keys throughout the workspace.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A namespace-qualified name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QName {
    /// Namespace URI
    namespace: String,
    /// Local part of the name
    local_name: String,
}

impl QName {
    /// Create a qualified name from a namespace URI and local name
    pub fn new(namespace: impl Into<String>, local_name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            local_name: local_name.into(),
        }
    }

    /// Namespace URI
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Local part of the name
    pub fn local_name(&self) -> &str {
        &self.local_name
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}{}", self.namespace, self.local_name)
    }
}

/// Identity of a node store (protocol plus identifier)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StoreRef {
    /// Store protocol, e.g. `workspace`
    pub protocol: String,
    /// Store identifier, e.g. `SpacesStore`
    pub identifier: String,
}

impl StoreRef {
    /// Create a store reference
    pub fn new(protocol: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            protocol: protocol.into(),
            identifier: identifier.into(),
        }
    }
}

impl fmt::Display for StoreRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.protocol, self.identifier)
    }
}

/// Identity of a single node within a store
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeRef {
    /// The store holding the node
    pub store: StoreRef,
    /// The node identifier within the store
    pub id: Uuid,
}

impl NodeRef {
    /// Create a node reference
    pub fn new(store: StoreRef, id: Uuid) -> Self {
        Self { store, id }
    }

    /// Create a node reference with a fresh random identifier
    pub fn random(store: StoreRef) -> Self {
        Self {
            store,
            id: Uuid::new_v4(),
        }
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.store, self.id)
    }
}
