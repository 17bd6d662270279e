//! Collaborator traits supplied by the surrounding repository
//!
//! The engine performs no I/O of its own: node existence and
//! hierarchy, authority membership closure, node ownership, and ACL
//! persistence are all supplied from outside through these seams.
//! Implementations are expected to provide read-committed or better
//! isolation; the engine calls them synchronously on the caller's
//! thread.

use std::collections::BTreeSet;

use palisade_acl::AccessControlList;
use palisade_core::{NodeRef, PalisadeResult, QName};

/// Node identity and primary-parent traversal
pub trait NodeHierarchy {
    /// Whether the node exists
    fn exists(&self, node_ref: &NodeRef) -> bool;

    /// The node's primary parent, `None` at a root
    fn primary_parent(&self, node_ref: &NodeRef) -> PalisadeResult<Option<NodeRef>>;

    /// The classes (type and aspects) the node carries, for ACE
    /// context matching
    fn node_classes(&self, node_ref: &NodeRef) -> PalisadeResult<BTreeSet<QName>>;

    /// The properties the node carries, for ACE context matching
    fn node_properties(&self, node_ref: &NodeRef) -> PalisadeResult<BTreeSet<QName>>;
}

/// Authority and group-membership closure
pub trait AuthorityResolver {
    /// Every authority the user holds: the user name itself, its
    /// groups transitively, and the well-known everyone group
    fn authorities_for_user(&self, user_name: &str) -> PalisadeResult<BTreeSet<String>>;
}

/// Node ownership lookup, consulted by the owner dynamic authority
pub trait OwnerLookup {
    /// The owning user of the node, if any
    fn owner_of(&self, node_ref: &NodeRef) -> PalisadeResult<Option<String>>;
}

/// Persistence of ACLs and node-to-ACL linkage
///
/// The logical shape is fixed here; the physical schema belongs to
/// the implementation. `update_acl` owns the versioning rule: a
/// versioned ACL gets a new `(acl_id, acl_version)` row with the
/// prior version marked not-latest, an unversioned one is mutated in
/// place. Both must happen atomically within the caller's
/// transaction.
pub trait AclStore {
    /// The ACL attached to the node, if any
    fn acl_for_node(&self, node_ref: &NodeRef) -> PalisadeResult<Option<AccessControlList>>;

    /// The latest version of the ACL with the given logical identity
    fn acl_by_id(&self, acl_id: &str) -> PalisadeResult<Option<AccessControlList>>;

    /// Attach an ACL to a node, replacing any existing linkage
    fn set_acl_for_node(&self, node_ref: &NodeRef, acl: AccessControlList) -> PalisadeResult<()>;

    /// Persist a changed ACL, applying the versioning rule
    ///
    /// Returns the stored list: either the same version mutated in
    /// place, or the freshly created successor version.
    fn update_acl(&self, acl: AccessControlList) -> PalisadeResult<AccessControlList>;

    /// The repository-wide singleton ACL, if one is configured
    fn global_acl(&self) -> PalisadeResult<Option<AccessControlList>>;
}
