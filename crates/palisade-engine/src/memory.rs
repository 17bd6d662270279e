//! In-memory collaborators for tests and embedders
//!
//! A single [`MemoryRepository`] implements every collaborator seam:
//! node hierarchy, authority closure, ownership, and the ACL store
//! with its versioning rule. State lives behind `parking_lot` locks
//! so a repository can be shared across threads in tests.

use std::collections::{BTreeSet, HashMap};

use indexmap::IndexMap;
use palisade_acl::AccessControlList;
use palisade_core::{NodeRef, PalisadeError, PalisadeResult, QName, PERMISSIONS_EVERYONE};
use parking_lot::RwLock;

use crate::collaborators::{AclStore, AuthorityResolver, NodeHierarchy, OwnerLookup};

#[derive(Debug, Default)]
struct NodeRecord {
    parent: Option<NodeRef>,
    classes: BTreeSet<QName>,
    properties: BTreeSet<QName>,
    owner: Option<String>,
    acl_id: Option<String>,
}

/// Shared in-memory repository state
#[derive(Debug, Default)]
pub struct MemoryRepository {
    nodes: RwLock<HashMap<NodeRef, NodeRecord>>,
    /// authority -> authorities that directly contain it
    containers: RwLock<HashMap<String, BTreeSet<String>>>,
    /// acl_id -> versions, oldest first
    acls: RwLock<IndexMap<String, Vec<AccessControlList>>>,
    global: RwLock<Option<AccessControlList>>,
}

impl MemoryRepository {
    /// An empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node under an optional primary parent
    pub fn add_node(&self, node_ref: NodeRef, parent: Option<NodeRef>) {
        self.nodes.write().entry(node_ref).or_default().parent = parent;
    }

    /// Attach a class (type or aspect) to a node
    pub fn add_node_class(&self, node_ref: &NodeRef, class: QName) {
        if let Some(record) = self.nodes.write().get_mut(node_ref) {
            record.classes.insert(class);
        }
    }

    /// Attach a property name to a node
    pub fn add_node_property(&self, node_ref: &NodeRef, property: QName) {
        if let Some(record) = self.nodes.write().get_mut(node_ref) {
            record.properties.insert(property);
        }
    }

    /// Record the owning user of a node
    pub fn set_owner(&self, node_ref: &NodeRef, owner: impl Into<String>) {
        if let Some(record) = self.nodes.write().get_mut(node_ref) {
            record.owner = Some(owner.into());
        }
    }

    /// Record that `member` belongs directly to `container`
    ///
    /// Containment is transitive: a user in a group that is itself in
    /// a parent group holds all three authorities.
    pub fn add_membership(&self, member: impl Into<String>, container: impl Into<String>) {
        self.containers
            .write()
            .entry(member.into())
            .or_default()
            .insert(container.into());
    }

    /// Install the repository-wide singleton ACL
    pub fn set_global_acl(&self, acl: AccessControlList) {
        *self.global.write() = Some(acl);
    }

    /// Deliberately point a node at an ACL id without storing the ACL
    ///
    /// Only useful for provoking dangling-pointer integrity errors in
    /// tests.
    pub fn link_node_to_missing_acl(&self, node_ref: &NodeRef, acl_id: impl Into<String>) {
        if let Some(record) = self.nodes.write().get_mut(node_ref) {
            record.acl_id = Some(acl_id.into());
        }
    }
}

impl NodeHierarchy for MemoryRepository {
    fn exists(&self, node_ref: &NodeRef) -> bool {
        self.nodes.read().contains_key(node_ref)
    }

    fn primary_parent(&self, node_ref: &NodeRef) -> PalisadeResult<Option<NodeRef>> {
        let nodes = self.nodes.read();
        let record = nodes
            .get(node_ref)
            .ok_or_else(|| PalisadeError::not_found(format!("node {node_ref}")))?;
        Ok(record.parent.clone())
    }

    fn node_classes(&self, node_ref: &NodeRef) -> PalisadeResult<BTreeSet<QName>> {
        let nodes = self.nodes.read();
        let record = nodes
            .get(node_ref)
            .ok_or_else(|| PalisadeError::not_found(format!("node {node_ref}")))?;
        Ok(record.classes.clone())
    }

    fn node_properties(&self, node_ref: &NodeRef) -> PalisadeResult<BTreeSet<QName>> {
        let nodes = self.nodes.read();
        let record = nodes
            .get(node_ref)
            .ok_or_else(|| PalisadeError::not_found(format!("node {node_ref}")))?;
        Ok(record.properties.clone())
    }
}

impl AuthorityResolver for MemoryRepository {
    fn authorities_for_user(&self, user_name: &str) -> PalisadeResult<BTreeSet<String>> {
        let containers = self.containers.read();
        let mut closure: BTreeSet<String> = BTreeSet::new();
        closure.insert(user_name.to_string());
        closure.insert(PERMISSIONS_EVERYONE.to_string());

        let mut frontier = vec![user_name.to_string()];
        while let Some(current) = frontier.pop() {
            if let Some(parents) = containers.get(&current) {
                for parent in parents {
                    if closure.insert(parent.clone()) {
                        frontier.push(parent.clone());
                    }
                }
            }
        }
        Ok(closure)
    }
}

impl OwnerLookup for MemoryRepository {
    fn owner_of(&self, node_ref: &NodeRef) -> PalisadeResult<Option<String>> {
        let nodes = self.nodes.read();
        let record = nodes
            .get(node_ref)
            .ok_or_else(|| PalisadeError::not_found(format!("node {node_ref}")))?;
        Ok(record.owner.clone())
    }
}

impl AclStore for MemoryRepository {
    fn acl_for_node(&self, node_ref: &NodeRef) -> PalisadeResult<Option<AccessControlList>> {
        let acl_id = {
            let nodes = self.nodes.read();
            let record = nodes
                .get(node_ref)
                .ok_or_else(|| PalisadeError::not_found(format!("node {node_ref}")))?;
            match &record.acl_id {
                Some(id) => id.clone(),
                None => return Ok(None),
            }
        };
        match self.acl_by_id(&acl_id)? {
            Some(acl) => Ok(Some(acl)),
            None => Err(PalisadeError::integrity(format!(
                "node {node_ref} points at missing ACL {acl_id}"
            ))),
        }
    }

    fn acl_by_id(&self, acl_id: &str) -> PalisadeResult<Option<AccessControlList>> {
        let acls = self.acls.read();
        let Some(versions) = acls.get(acl_id) else {
            return Ok(None);
        };
        let latest = versions
            .iter()
            .rev()
            .find(|acl| acl.properties().is_latest)
            .ok_or_else(|| {
                PalisadeError::integrity(format!("ACL {acl_id} has no latest version"))
            })?;
        Ok(Some(latest.clone()))
    }

    fn set_acl_for_node(&self, node_ref: &NodeRef, acl: AccessControlList) -> PalisadeResult<()> {
        acl.validate()?;
        let acl_id = acl.properties().acl_id.clone();
        {
            let mut acls = self.acls.write();
            let versions = acls.entry(acl_id.clone()).or_default();
            versions.clear();
            versions.push(acl);
        }
        let mut nodes = self.nodes.write();
        let record = nodes
            .get_mut(node_ref)
            .ok_or_else(|| PalisadeError::not_found(format!("node {node_ref}")))?;
        record.acl_id = Some(acl_id);
        Ok(())
    }

    fn update_acl(&self, mut acl: AccessControlList) -> PalisadeResult<AccessControlList> {
        acl.validate()?;
        let acl_id = acl.properties().acl_id.clone();
        let mut acls = self.acls.write();
        let versions = acls
            .get_mut(&acl_id)
            .ok_or_else(|| PalisadeError::not_found(format!("ACL {acl_id}")))?;

        if acl.properties().versioned {
            // New row: bump the version, retire the predecessor
            for prior in versions.iter_mut() {
                let mut properties = prior.properties().clone();
                properties.is_latest = false;
                prior.set_properties(properties);
            }
            let mut properties = acl.properties().clone();
            properties.acl_version += 1;
            properties.is_latest = true;
            acl.set_properties(properties);
            versions.push(acl.clone());
        } else {
            // Mutate in place: same row, same version
            let Some(slot) = versions.last_mut() else {
                return Err(PalisadeError::integrity(format!(
                    "ACL {acl_id} has no versions"
                )));
            };
            *slot = acl.clone();
        }
        Ok(acl)
    }

    fn global_acl(&self) -> PalisadeResult<Option<AccessControlList>> {
        Ok(self.global.read().clone())
    }
}

impl MemoryRepository {
    /// Every stored version of an ACL, oldest first
    ///
    /// Exposed so tests can assert on version history.
    pub fn acl_versions(&self, acl_id: &str) -> Vec<AccessControlList> {
        self.acls.read().get(acl_id).cloned().unwrap_or_default()
    }
}
