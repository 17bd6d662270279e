//! The permission service itself
//!
//! Evaluation walks the node's ACL chain most-specific first. Each
//! level contributes its entries in comparator order (position
//! ascending, denied before allowed, most specific authority type
//! first), so the first entry that covers the requested permission
//! and matches one of the user's authorities is decisive. If nothing
//! matches anywhere, the answer is denied: the model fails closed.
//!
//! The acting user is an explicit parameter on every call; the engine
//! carries no ambient identity or transaction state.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use palisade_acl::{
    AccessControlEntry, AccessControlList, AccessControlListProperties, AceType, AclType,
    NodePermissionEntry,
};
use palisade_core::{AccessStatus, NodeRef, PalisadeError, PalisadeResult, PermissionReference};
use tracing::debug;
use uuid::Uuid;

use crate::collaborators::{AclStore, AuthorityResolver, NodeHierarchy};
use crate::config::EngineConfig;
use crate::dynamic::DynamicAuthority;

/// One level of the resolved inheritance chain
struct Level {
    /// The node that contributed the entries
    node: NodeRef,
    /// Whether that node's ACL inherits further
    inherits: bool,
    /// Entries applicable at the checked node, evaluation order
    entries: Vec<AccessControlEntry>,
}

/// The decisive entry and where it came from
struct Decision {
    status: AccessStatus,
    level_node: NodeRef,
    level_inherits: bool,
    entry: AccessControlEntry,
}

/// The ACL permission-evaluation engine
pub struct PermissionService {
    hierarchy: Arc<dyn NodeHierarchy + Send + Sync>,
    authorities: Arc<dyn AuthorityResolver + Send + Sync>,
    store: Arc<dyn AclStore + Send + Sync>,
    dynamic_authorities: Vec<Arc<dyn DynamicAuthority>>,
    config: EngineConfig,
}

impl PermissionService {
    /// Build a service over the given collaborators
    pub fn new(
        hierarchy: Arc<dyn NodeHierarchy + Send + Sync>,
        authorities: Arc<dyn AuthorityResolver + Send + Sync>,
        store: Arc<dyn AclStore + Send + Sync>,
    ) -> Self {
        Self {
            hierarchy,
            authorities,
            store,
            dynamic_authorities: Vec::new(),
            config: EngineConfig::default(),
        }
    }

    /// Replace the engine configuration
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Register a dynamic authority
    pub fn register_dynamic_authority(&mut self, authority: Arc<dyn DynamicAuthority>) {
        self.dynamic_authorities.push(authority);
    }

    /// The engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Whether `user_name` holds `permission` on `node_ref`
    ///
    /// Fails closed: when no entry anywhere in the chain matches, the
    /// result is [`AccessStatus::Denied`].
    pub fn has_permission(
        &self,
        node_ref: &NodeRef,
        permission: &PermissionReference,
        user_name: &str,
    ) -> PalisadeResult<AccessStatus> {
        let status = match self.access_status(node_ref, permission, user_name)? {
            AccessStatus::Allowed => AccessStatus::Allowed,
            AccessStatus::Denied | AccessStatus::Undetermined => AccessStatus::Denied,
        };
        Ok(status)
    }

    /// Advisory variant of [`has_permission`](Self::has_permission)
    ///
    /// Returns [`AccessStatus::Undetermined`] when no policy exists
    /// anywhere in the chain, so callers that care can distinguish
    /// "denied by an entry" from "nothing said anything".
    pub fn access_status(
        &self,
        node_ref: &NodeRef,
        permission: &PermissionReference,
        user_name: &str,
    ) -> PalisadeResult<AccessStatus> {
        self.require_node(node_ref)?;
        let levels = self.resolve_levels(node_ref)?;
        if levels.is_empty() {
            return Ok(AccessStatus::Undetermined);
        }
        let decision = self.decide(node_ref, permission, user_name, &levels)?;
        let status = match decision {
            Some(d) => {
                debug!(
                    node = %node_ref,
                    permission = %permission,
                    user = user_name,
                    level = %d.level_node,
                    status = ?d.status,
                    "decisive access control entry"
                );
                d.status
            }
            None => {
                debug!(
                    node = %node_ref,
                    permission = %permission,
                    user = user_name,
                    "no matching entry, failing closed"
                );
                AccessStatus::Denied
            }
        };
        Ok(status)
    }

    /// Which node and entry decided the outcome, if any
    ///
    /// Retains provenance from the evaluation walk: the returned view
    /// names the level in the inheritance chain that supplied the
    /// decisive entry.
    pub fn explain_permission(
        &self,
        node_ref: &NodeRef,
        permission: &PermissionReference,
        user_name: &str,
    ) -> PalisadeResult<Option<NodePermissionEntry>> {
        self.require_node(node_ref)?;
        let levels = self.resolve_levels(node_ref)?;
        let decision = self.decide(node_ref, permission, user_name, &levels)?;
        Ok(decision.map(|d| NodePermissionEntry {
            node_ref: d.level_node,
            inherit_permissions: d.level_inherits,
            entries: vec![d.entry],
        }))
    }

    /// Grant or deny `permission` to `authority` on the node
    ///
    /// Local entries land at position 0 so they take precedence over
    /// inherited content. The write goes through the store's
    /// versioning rule.
    pub fn set_permission(
        &self,
        node_ref: &NodeRef,
        authority: &str,
        permission: Arc<PermissionReference>,
        allow: bool,
    ) -> PalisadeResult<()> {
        let mut acl = self.writable_acl(node_ref)?;
        let entry = if allow {
            AccessControlEntry::allowed(permission, authority, 0)
        } else {
            AccessControlEntry::denied(permission, authority, 0)
        };
        acl.insert_entry(entry);
        self.store.update_acl(acl)?;
        Ok(())
    }

    /// Replace the node's local entries and inheritance flag in bulk
    pub fn set_node_permissions(&self, entry: &NodePermissionEntry) -> PalisadeResult<()> {
        let mut acl = self.writable_acl(&entry.node_ref)?;
        acl.clear_entries();
        acl.set_inherits(entry.inherit_permissions);
        for ace in &entry.entries {
            acl.insert_entry(ace.clone());
        }
        self.store.update_acl(acl)?;
        Ok(())
    }

    /// Remove entries for an authority/permission pair
    pub fn delete_permission(
        &self,
        node_ref: &NodeRef,
        authority: &str,
        permission: &PermissionReference,
    ) -> PalisadeResult<()> {
        let Some(mut acl) = self.store.acl_for_node(node_ref)? else {
            return Ok(());
        };
        if acl.remove_entries(Some(authority), Some(permission)) > 0 {
            self.store.update_acl(acl)?;
        }
        Ok(())
    }

    /// Remove every local entry on the node
    pub fn delete_permissions(&self, node_ref: &NodeRef) -> PalisadeResult<()> {
        let Some(mut acl) = self.store.acl_for_node(node_ref)? else {
            return Ok(());
        };
        acl.clear_entries();
        self.store.update_acl(acl)?;
        Ok(())
    }

    /// Toggle whether the node inherits from its ancestors
    ///
    /// Disabling inheritance on a node whose content came entirely
    /// from ancestors leaves it with an empty defining ACL: the point
    /// of the operation is to cut that content off.
    pub fn set_inherit_parent_permissions(
        &self,
        node_ref: &NodeRef,
        inherit: bool,
    ) -> PalisadeResult<()> {
        self.require_node(node_ref)?;
        match self.store.acl_for_node(node_ref)? {
            Some(acl) if acl.properties().inherits == inherit => Ok(()),
            Some(mut acl) if acl.properties().acl_type != AclType::Shared => {
                acl.set_inherits(inherit);
                self.store.update_acl(acl)?;
                Ok(())
            }
            // No ACL and inheritance requested: already implicit
            None if inherit => Ok(()),
            _ => {
                // Shared pointer or no ACL: the node needs its own
                // defining ACL carrying the new flag. When
                // inheritance stays on, the effective inherited
                // content moves into it; switched off, it starts
                // empty.
                let mut properties = AccessControlListProperties::new(
                    0,
                    Uuid::new_v4().to_string(),
                    AclType::Defining,
                );
                properties.inherits = inherit;
                let mut acl = AccessControlList::new(properties);
                if inherit {
                    for entry in self.materialised_inheritance(node_ref)? {
                        acl.insert_entry(entry);
                    }
                }
                self.store.set_acl_for_node(node_ref, acl)?;
                Ok(())
            }
        }
    }

    fn require_node(&self, node_ref: &NodeRef) -> PalisadeResult<()> {
        if self.hierarchy.exists(node_ref) {
            Ok(())
        } else {
            Err(PalisadeError::not_found(format!("node {node_ref}")))
        }
    }

    /// Fetch the node's ACL for mutation, creating or privatising one
    /// as needed
    ///
    /// A node carrying a SHARED ACL gets a fresh DEFINING ACL of its
    /// own: writing through the shared pointer would change every
    /// sibling that reuses the same content. A node with no ACL at
    /// all inherited implicitly, and a DEFINING ACL never ascends, so
    /// it gets one too. In both cases the node's effective inherited
    /// entries are materialised into the new ACL, so inherited
    /// permissions survive the local write.
    fn writable_acl(&self, node_ref: &NodeRef) -> PalisadeResult<AccessControlList> {
        self.require_node(node_ref)?;
        match self.store.acl_for_node(node_ref)? {
            Some(acl) if acl.properties().acl_type != AclType::Shared => Ok(acl),
            existing => {
                let inherited = self.materialised_inheritance(node_ref)?;
                let acl_id = Uuid::new_v4().to_string();
                let mut properties =
                    AccessControlListProperties::new(0, acl_id, AclType::Defining);
                if let Some(shared) = &existing {
                    properties.inherits = shared.properties().inherits;
                }
                let mut acl = AccessControlList::new(properties);
                for entry in inherited {
                    acl.insert_entry(entry);
                }
                self.store.set_acl_for_node(node_ref, acl.clone())?;
                Ok(acl)
            }
        }
    }

    /// The node's effective inherited entries, rewritten as local
    /// content for a fresh defining ACL
    ///
    /// Positions are bumped by the contributing level's depth so new
    /// local entries at position 0 still evaluate first. CHILDREN
    /// entries become ALL: they applied to this node through descent
    /// and must keep applying once they are its own content. The
    /// global ACL is never materialised; it applies regardless.
    fn materialised_inheritance(
        &self,
        node_ref: &NodeRef,
    ) -> PalisadeResult<Vec<AccessControlEntry>> {
        let mut visited_acls = HashSet::new();
        let levels = self.resolve_chain(node_ref, &mut visited_acls)?;
        let mut materialised = Vec::new();
        for (depth, level) in levels.into_iter().enumerate() {
            let bump = i32::try_from(depth).unwrap_or(i32::MAX).saturating_add(1);
            for mut entry in level.entries {
                if entry.ace_type() == AceType::Children {
                    entry.set_ace_type(AceType::All);
                }
                entry.set_position(Some(
                    entry.position().map_or(bump, |p| p.saturating_add(bump)),
                ));
                materialised.push(entry);
            }
        }
        Ok(materialised)
    }

    /// Resolve the chain of entry-contributing levels, most specific
    /// first, ending with the global ACL when one is configured
    fn resolve_levels(&self, node_ref: &NodeRef) -> PalisadeResult<Vec<Level>> {
        let mut visited_acls: HashSet<String> = HashSet::new();
        let mut levels = self.resolve_chain(node_ref, &mut visited_acls)?;

        if let Some(global) = self.store.global_acl()? {
            if visited_acls.insert(global.properties().acl_id.clone()) {
                let inherits = global.properties().inherits;
                levels.push(Level {
                    node: node_ref.clone(),
                    inherits,
                    entries: applicable(global.entries(), 0),
                });
            }
        }

        Ok(levels)
    }

    /// Walk the node's inheritance chain, without the global ACL
    fn resolve_chain(
        &self,
        node_ref: &NodeRef,
        visited_acls: &mut HashSet<String>,
    ) -> PalisadeResult<Vec<Level>> {
        let mut levels = Vec::new();
        let mut visited_nodes: HashSet<NodeRef> = HashSet::new();
        let mut current = Some(node_ref.clone());
        let mut distance = 0usize;

        while let Some(node) = current.take() {
            if !visited_nodes.insert(node.clone()) {
                return Err(PalisadeError::integrity(format!(
                    "inheritance cycle through node {node}"
                )));
            }
            if distance > self.config.max_acl_depth {
                return Err(PalisadeError::integrity(format!(
                    "ACL chain from {node_ref} exceeds depth bound {}",
                    self.config.max_acl_depth
                )));
            }

            // Nodes with no ACL of their own inherit implicitly
            let mut ascend = true;
            if let Some(acl) = self.store.acl_for_node(&node)? {
                acl.validate()?;
                let properties = acl.properties().clone();
                ascend = properties.inherits && properties.acl_type.ascends_on_inherit();

                if visited_acls.insert(properties.acl_id.clone()) {
                    let entries = self.level_entries(&acl, distance, visited_acls)?;
                    levels.push(Level {
                        node: node.clone(),
                        inherits: properties.inherits,
                        entries,
                    });
                }
            }

            if !ascend {
                break;
            }
            current = self.hierarchy.primary_parent(&node)?;
            distance += 1;
        }

        Ok(levels)
    }

    /// The entries an ACL contributes at a given chain distance
    ///
    /// SHARED content is pulled from the defining ACL it points at
    /// and filtered as inherited; LAYERED content is the overlay's
    /// own entries followed by its base's. A dangling pointer in
    /// either case is corrupt state and errors out.
    fn level_entries(
        &self,
        acl: &AccessControlList,
        distance: usize,
        visited_acls: &mut HashSet<String>,
    ) -> PalisadeResult<Vec<AccessControlEntry>> {
        let properties = acl.properties();
        let mut entries = applicable(acl.entries(), distance);
        match properties.acl_type {
            AclType::Shared => {
                let defining_id = self.linked_acl_id(properties)?;
                let defining = self.store.acl_by_id(&defining_id)?.ok_or_else(|| {
                    PalisadeError::integrity(format!(
                        "shared ACL {} points at missing ACL {defining_id}",
                        properties.acl_id
                    ))
                })?;
                visited_acls.insert(defining_id);
                // Reused defining content is ancestor content: only
                // descendant-applicable entries carry over
                entries.extend(applicable(defining.entries(), distance.max(1)));
            }
            AclType::Layered => {
                let base_id = self.linked_acl_id(properties)?;
                let base = self.store.acl_by_id(&base_id)?.ok_or_else(|| {
                    PalisadeError::integrity(format!(
                        "layered ACL {} overlays missing ACL {base_id}",
                        properties.acl_id
                    ))
                })?;
                visited_acls.insert(base_id);
                entries.extend(applicable(base.entries(), distance));
            }
            _ => {}
        }
        Ok(entries)
    }

    fn linked_acl_id(&self, properties: &AccessControlListProperties) -> PalisadeResult<String> {
        properties.inherits_from.clone().ok_or_else(|| {
            PalisadeError::integrity(format!(
                "{:?} ACL {} has no inherits_from pointer",
                properties.acl_type, properties.acl_id
            ))
        })
    }

    /// Run the ordered first-match walk over the resolved levels
    fn decide(
        &self,
        node_ref: &NodeRef,
        permission: &PermissionReference,
        user_name: &str,
        levels: &[Level],
    ) -> PalisadeResult<Option<Decision>> {
        let authorizations = self.authorizations(node_ref, permission, user_name)?;
        let classes = self.hierarchy.node_classes(node_ref)?;
        let node_properties = self.hierarchy.node_properties(node_ref)?;

        for level in levels {
            for entry in &level.entries {
                if !entry.covers_permission(permission) {
                    continue;
                }
                if !authority_matches(entry, &authorizations) {
                    continue;
                }
                if let Some(context) = entry.context() {
                    if !context.matches(&classes, &node_properties) {
                        continue;
                    }
                }
                return Ok(Some(Decision {
                    status: entry.access_status(),
                    level_node: level.node.clone(),
                    level_inherits: level.inherits,
                    entry: entry.clone(),
                }));
            }
        }
        Ok(None)
    }

    /// The full authority set for this check: the static closure plus
    /// every granted dynamic authority that applies to the permission
    fn authorizations(
        &self,
        node_ref: &NodeRef,
        permission: &PermissionReference,
        user_name: &str,
    ) -> PalisadeResult<BTreeSet<String>> {
        let mut authorizations = self.authorities.authorities_for_user(user_name)?;
        for dynamic in &self.dynamic_authorities {
            if !dynamic.applies_to(permission) {
                continue;
            }
            if dynamic.has_authority(node_ref, user_name)? {
                authorizations.insert(dynamic.authority().to_string());
            }
        }
        Ok(authorizations)
    }
}

/// Filter entries by where they apply relative to the contributing
/// node: distance 0 is the node itself, anything further is a
/// descendant check
fn applicable(entries: &[AccessControlEntry], distance: usize) -> Vec<AccessControlEntry> {
    entries
        .iter()
        .filter(|e| {
            if distance == 0 {
                e.ace_type().applies_to_node()
            } else {
                e.ace_type().applies_to_descendants()
            }
        })
        .cloned()
        .collect()
}

fn authority_matches(entry: &AccessControlEntry, authorizations: &BTreeSet<String>) -> bool {
    match entry.authority() {
        None => true,
        Some(authority) => authorizations.contains(authority),
    }
}
