//! The access-control list, its properties, and per-node views
//!
//! An [`AccessControlList`] owns an ordered entry list plus the
//! provenance metadata ([`AccessControlListProperties`]) describing
//! its type, version, and inheritance linkage. The entry list is kept
//! sorted by the entry comparator through every mutation, and the
//! cached per-node view is invalidated whenever entries or properties
//! change.

use palisade_core::{NodeRef, PalisadeResult, PermissionReference};
use serde::{Deserialize, Serialize};

use crate::entry::AccessControlEntry;
use crate::types::AclType;

/// Identity, versioning, and inheritance metadata of an ACL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessControlListProperties {
    /// Opaque storage identity of this row
    pub id: i64,
    /// Logical identity, stable across versions
    pub acl_id: String,
    /// Version within the logical identity
    pub acl_version: i64,
    /// Change set that produced this version
    pub acl_change_set_id: i64,
    /// Provenance type
    pub acl_type: AclType,
    /// Whether evaluation may consult ancestors
    pub inherits: bool,
    /// Pointer to the defining ACL (shared) or base ACL (layered)
    pub inherits_from: Option<String>,
    /// Whether updates create new versions
    pub versioned: bool,
    /// Whether this is the latest version of its logical identity
    pub is_latest: bool,
}

impl AccessControlListProperties {
    /// Properties for a fresh, unversioned ACL of the given type
    pub fn new(id: i64, acl_id: impl Into<String>, acl_type: AclType) -> Self {
        Self {
            id,
            acl_id: acl_id.into(),
            acl_version: 1,
            acl_change_set_id: 0,
            acl_type,
            inherits: true,
            inherits_from: None,
            versioned: false,
            is_latest: true,
        }
    }
}

/// An ordered, typed, versioned collection of access-control entries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessControlList {
    properties: AccessControlListProperties,
    entries: Vec<AccessControlEntry>,
    #[serde(skip)]
    cached_view: Option<(NodeRef, NodePermissionEntry)>,
}

// The cached view is derived state and never part of list identity
impl PartialEq for AccessControlList {
    fn eq(&self, other: &Self) -> bool {
        self.properties == other.properties && self.entries == other.entries
    }
}

impl Eq for AccessControlList {}

impl AccessControlList {
    /// An empty list with the given properties
    pub fn new(properties: AccessControlListProperties) -> Self {
        Self {
            properties,
            entries: Vec::new(),
            cached_view: None,
        }
    }

    /// Provenance and versioning metadata
    pub fn properties(&self) -> &AccessControlListProperties {
        &self.properties
    }

    /// Entries in evaluation order
    pub fn entries(&self) -> &[AccessControlEntry] {
        &self.entries
    }

    /// Replace the properties, invalidating the cached view
    pub fn set_properties(&mut self, properties: AccessControlListProperties) {
        self.properties = properties;
        self.cached_view = None;
    }

    /// Toggle inheritance, invalidating the cached view
    pub fn set_inherits(&mut self, inherits: bool) {
        self.properties.inherits = inherits;
        self.cached_view = None;
    }

    /// Insert an entry at its comparator position
    ///
    /// Insertion is stable: an entry comparing equal to existing ones
    /// lands after them.
    pub fn insert_entry(&mut self, entry: AccessControlEntry) {
        let at = self.entries.partition_point(|e| e <= &entry);
        self.entries.insert(at, entry);
        self.cached_view = None;
    }

    /// Remove entries for an authority/permission pair
    ///
    /// A `None` authority or permission acts as a wildcard for the
    /// removal, matching any value in that slot. Returns how many
    /// entries were removed.
    pub fn remove_entries(
        &mut self,
        authority: Option<&str>,
        permission: Option<&PermissionReference>,
    ) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| {
            let authority_matches = authority.map_or(true, |a| e.authority() == Some(a));
            let permission_matches =
                permission.map_or(true, |p| e.permission().map(AsRef::as_ref) == Some(p));
            !(authority_matches && permission_matches)
        });
        let removed = before - self.entries.len();
        if removed > 0 {
            self.cached_view = None;
        }
        removed
    }

    /// Remove every entry
    pub fn clear_entries(&mut self) {
        if !self.entries.is_empty() {
            self.entries.clear();
            self.cached_view = None;
        }
    }

    /// The per-node view of this list, computed once and cached until
    /// the next mutation
    pub fn node_permission_entry(&mut self, node_ref: &NodeRef) -> NodePermissionEntry {
        if let Some((cached_node, view)) = &self.cached_view {
            if cached_node == node_ref {
                return view.clone();
            }
        }
        let view = NodePermissionEntry {
            node_ref: node_ref.clone(),
            inherit_permissions: self.properties.inherits,
            entries: self.entries.clone(),
        };
        self.cached_view = Some((node_ref.clone(), view.clone()));
        view
    }

    /// Validate that the inheritance pointer is present when the type
    /// requires one
    pub fn validate(&self) -> PalisadeResult<()> {
        use palisade_core::PalisadeError;
        match self.properties.acl_type {
            AclType::Shared | AclType::Layered if self.properties.inherits_from.is_none() => {
                Err(PalisadeError::integrity(format!(
                    "{:?} ACL {} has no inherits_from pointer",
                    self.properties.acl_type, self.properties.acl_id
                )))
            }
            _ => Ok(()),
        }
    }
}

/// Per-node permission view: local entries plus the inheritance flag
///
/// Used both to report effective local state and to set permissions
/// in bulk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodePermissionEntry {
    /// The node the view describes
    pub node_ref: NodeRef,
    /// Whether the node also inherits from its ancestors
    pub inherit_permissions: bool,
    /// Entries in evaluation order
    pub entries: Vec<AccessControlEntry>,
}
