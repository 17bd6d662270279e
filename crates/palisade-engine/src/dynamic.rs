//! Dynamically computed authorities
//!
//! A dynamic authority is a principal nobody is statically a member
//! of: it is computed per (node, user) at decision time. The engine
//! asks each registered implementation whether it applies to the
//! permission being checked, and if so whether the user holds it on
//! the node; a held dynamic authority then participates in entry
//! matching exactly like a static one, so a deny entry at a better
//! position still wins.
//!
//! Implementations must be side-effect-free and safe to call from
//! multiple threads.

use std::collections::HashSet;
use std::sync::Arc;

use palisade_core::{NodeRef, PalisadeResult, PermissionReference};

use crate::collaborators::OwnerLookup;

/// The authority name granted to a node's owner
pub const ROLE_OWNER: &str = "ROLE_OWNER";

/// A per-(node, user) computed authority
pub trait DynamicAuthority: Send + Sync {
    /// The authority string this implementation grants
    fn authority(&self) -> &str;

    /// The permissions this authority must be consulted for
    ///
    /// `None` means all permissions.
    fn required_for(&self) -> Option<&HashSet<Arc<PermissionReference>>>;

    /// Whether the user holds this authority on the node
    fn has_authority(&self, node_ref: &NodeRef, user_name: &str) -> PalisadeResult<bool>;

    /// Whether this authority participates in a check for `permission`
    fn applies_to(&self, permission: &PermissionReference) -> bool {
        match self.required_for() {
            None => true,
            Some(set) => set.iter().any(|p| p.as_ref() == permission),
        }
    }
}

/// Grants [`ROLE_OWNER`] to the owning user of a node
pub struct OwnerDynamicAuthority<L> {
    owner_lookup: Arc<L>,
    required_for: Option<HashSet<Arc<PermissionReference>>>,
}

impl<L: OwnerLookup> OwnerDynamicAuthority<L> {
    /// Owner authority consulted for every permission
    pub fn new(owner_lookup: Arc<L>) -> Self {
        Self {
            owner_lookup,
            required_for: None,
        }
    }

    /// Owner authority consulted only for the given permissions
    pub fn required_for(
        owner_lookup: Arc<L>,
        permissions: HashSet<Arc<PermissionReference>>,
    ) -> Self {
        Self {
            owner_lookup,
            required_for: Some(permissions),
        }
    }
}

impl<L: OwnerLookup + Send + Sync> DynamicAuthority for OwnerDynamicAuthority<L> {
    fn authority(&self) -> &str {
        ROLE_OWNER
    }

    fn required_for(&self) -> Option<&HashSet<Arc<PermissionReference>>> {
        self.required_for.as_ref()
    }

    fn has_authority(&self, node_ref: &NodeRef, user_name: &str) -> PalisadeResult<bool> {
        Ok(self.owner_lookup.owner_of(node_ref)?.as_deref() == Some(user_name))
    }
}
