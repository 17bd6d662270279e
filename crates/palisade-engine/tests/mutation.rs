//! Permission mutation paths: local writes, bulk replacement,
//! versioning, shared-ACL privatisation, and the global ACL

use std::sync::Arc;

use palisade_acl::{
    AccessControlEntry, AccessControlList, AccessControlListProperties, AceType, AclType,
    NodePermissionEntry,
};
use palisade_core::{AccessStatus, NodeRef, PermissionModel, PermissionReference, StoreRef};
use palisade_engine::collaborators::{AclStore, AuthorityResolver, NodeHierarchy};
use palisade_engine::memory::MemoryRepository;
use palisade_engine::PermissionService;

fn store_ref() -> StoreRef {
    StoreRef::new("workspace", "SpacesStore")
}

fn service(repo: &Arc<MemoryRepository>) -> PermissionService {
    let _ = tracing_subscriber::fmt::try_init();
    PermissionService::new(
        Arc::clone(repo) as Arc<dyn NodeHierarchy + Send + Sync>,
        Arc::clone(repo) as Arc<dyn AuthorityResolver + Send + Sync>,
        Arc::clone(repo) as Arc<dyn AclStore + Send + Sync>,
    )
}

fn read() -> Arc<PermissionReference> {
    PermissionModel::named("Read")
}

fn write() -> Arc<PermissionReference> {
    PermissionModel::named("Write")
}

#[test]
fn set_then_delete_permission_round_trips() {
    let repo = Arc::new(MemoryRepository::new());
    let svc = service(&repo);
    let node = NodeRef::random(store_ref());
    repo.add_node(node.clone(), None);

    svc.set_permission(&node, "alice", read(), true).unwrap();
    assert_eq!(
        svc.has_permission(&node, &read(), "alice").unwrap(),
        AccessStatus::Allowed
    );

    svc.delete_permission(&node, "alice", &read()).unwrap();
    assert_eq!(
        svc.has_permission(&node, &read(), "alice").unwrap(),
        AccessStatus::Denied
    );
}

#[test]
fn local_deny_write_preserves_ordering_invariant() {
    let repo = Arc::new(MemoryRepository::new());
    let svc = service(&repo);
    let node = NodeRef::random(store_ref());
    repo.add_node(node.clone(), None);

    svc.set_permission(&node, "alice", read(), true).unwrap();
    svc.set_permission(&node, "alice", read(), false).unwrap();

    // Both entries sit at position 0; the deny must evaluate first
    assert_eq!(
        svc.has_permission(&node, &read(), "alice").unwrap(),
        AccessStatus::Denied
    );

    let acl = repo.acl_for_node(&node).unwrap().unwrap();
    assert_eq!(acl.entries()[0].access_status(), AccessStatus::Denied);
    assert_eq!(acl.entries()[1].access_status(), AccessStatus::Allowed);
}

#[test]
fn versioned_acl_write_creates_successor_version() {
    let repo = Arc::new(MemoryRepository::new());
    let svc = service(&repo);
    let node = NodeRef::random(store_ref());
    repo.add_node(node.clone(), None);

    let mut properties = AccessControlListProperties::new(0, "acl-versioned", AclType::Defining);
    properties.versioned = true;
    repo.set_acl_for_node(&node, AccessControlList::new(properties))
        .unwrap();

    svc.set_permission(&node, "alice", read(), true).unwrap();

    let versions = repo.acl_versions("acl-versioned");
    assert_eq!(versions.len(), 2);
    assert_eq!(versions[0].properties().acl_version, 1);
    assert!(!versions[0].properties().is_latest);
    assert_eq!(versions[1].properties().acl_version, 2);
    assert!(versions[1].properties().is_latest);
    // The logical identity never changes across versions
    assert_eq!(versions[1].properties().acl_id, "acl-versioned");
}

#[test]
fn unversioned_acl_write_mutates_in_place() {
    let repo = Arc::new(MemoryRepository::new());
    let svc = service(&repo);
    let node = NodeRef::random(store_ref());
    repo.add_node(node.clone(), None);

    svc.set_permission(&node, "alice", read(), true).unwrap();
    svc.set_permission(&node, "bob", read(), true).unwrap();

    let acl = repo.acl_for_node(&node).unwrap().unwrap();
    assert_eq!(acl.properties().acl_version, 1);
    assert_eq!(acl.entries().len(), 2);
}

#[test]
fn bulk_set_replaces_local_state() {
    let repo = Arc::new(MemoryRepository::new());
    let svc = service(&repo);
    let node = NodeRef::random(store_ref());
    repo.add_node(node.clone(), None);

    svc.set_permission(&node, "alice", read(), true).unwrap();

    let replacement = NodePermissionEntry {
        node_ref: node.clone(),
        inherit_permissions: false,
        entries: vec![AccessControlEntry::allowed(read(), "bob", 0)],
    };
    svc.set_node_permissions(&replacement).unwrap();

    assert_eq!(
        svc.has_permission(&node, &read(), "alice").unwrap(),
        AccessStatus::Denied
    );
    assert_eq!(
        svc.has_permission(&node, &read(), "bob").unwrap(),
        AccessStatus::Allowed
    );
    let acl = repo.acl_for_node(&node).unwrap().unwrap();
    assert!(!acl.properties().inherits);
}

#[test]
fn delete_permissions_clears_all_local_entries() {
    let repo = Arc::new(MemoryRepository::new());
    let svc = service(&repo);
    let node = NodeRef::random(store_ref());
    repo.add_node(node.clone(), None);

    svc.set_permission(&node, "alice", read(), true).unwrap();
    svc.set_permission(&node, "bob", read(), true).unwrap();
    svc.delete_permissions(&node).unwrap();

    let acl = repo.acl_for_node(&node).unwrap().unwrap();
    assert!(acl.entries().is_empty());
}

#[test]
fn writing_to_shared_acl_privatises_without_losing_inherited_content() {
    let repo = Arc::new(MemoryRepository::new());
    let svc = service(&repo);
    let parent = NodeRef::random(store_ref());
    let child = NodeRef::random(store_ref());
    let sibling = NodeRef::random(store_ref());
    repo.add_node(parent.clone(), None);
    repo.add_node(child.clone(), Some(parent.clone()));
    repo.add_node(sibling.clone(), Some(parent.clone()));

    let mut parent_acl = AccessControlList::new(AccessControlListProperties::new(
        0,
        "acl-shared-parent",
        AclType::Defining,
    ));
    parent_acl.insert_entry(AccessControlEntry::allowed(read(), "alice", 0));
    repo.set_acl_for_node(&parent, parent_acl).unwrap();

    for n in [&child, &sibling] {
        let mut props = AccessControlListProperties::new(0, "acl-shared-child", AclType::Shared);
        props.inherits_from = Some("acl-shared-parent".to_string());
        repo.set_acl_for_node(n, AccessControlList::new(props))
            .unwrap();
    }

    svc.set_permission(&child, "bob", read(), true).unwrap();

    // The child now has its own defining ACL with the inherited grant
    let child_acl = repo.acl_for_node(&child).unwrap().unwrap();
    assert_eq!(child_acl.properties().acl_type, AclType::Defining);
    assert_eq!(
        svc.has_permission(&child, &read(), "alice").unwrap(),
        AccessStatus::Allowed
    );
    assert_eq!(
        svc.has_permission(&child, &read(), "bob").unwrap(),
        AccessStatus::Allowed
    );

    // The sibling still reads through the untouched shared content
    assert_eq!(
        svc.has_permission(&sibling, &read(), "bob").unwrap(),
        AccessStatus::Denied
    );
    assert_eq!(
        svc.has_permission(&sibling, &read(), "alice").unwrap(),
        AccessStatus::Allowed
    );
}

#[test]
fn local_write_on_implicitly_inheriting_child_keeps_ancestor_grant() {
    let repo = Arc::new(MemoryRepository::new());
    let svc = service(&repo);
    let parent = NodeRef::random(store_ref());
    let child = NodeRef::random(store_ref());
    repo.add_node(parent.clone(), None);
    repo.add_node(child.clone(), Some(parent.clone()));

    let mut parent_acl = AccessControlList::new(AccessControlListProperties::new(
        0,
        "acl-implicit-parent",
        AclType::Defining,
    ));
    parent_acl.insert_entry(AccessControlEntry::allowed(read(), "alice", 0));
    repo.set_acl_for_node(&parent, parent_acl).unwrap();

    // The child has no ACL of its own yet; it inherits implicitly
    assert_eq!(
        svc.has_permission(&child, &read(), "alice").unwrap(),
        AccessStatus::Allowed
    );

    // An unrelated local grant must not sever that inheritance
    svc.set_permission(&child, "bob", write(), true).unwrap();

    let child_acl = repo.acl_for_node(&child).unwrap().unwrap();
    assert_eq!(child_acl.properties().acl_type, AclType::Defining);
    assert!(child_acl.properties().inherits);
    assert_eq!(
        svc.has_permission(&child, &read(), "alice").unwrap(),
        AccessStatus::Allowed
    );
    assert_eq!(
        svc.has_permission(&child, &write(), "bob").unwrap(),
        AccessStatus::Allowed
    );
}

#[test]
fn privatisation_keeps_children_scoped_inherited_entry_applicable() {
    let repo = Arc::new(MemoryRepository::new());
    let svc = service(&repo);
    let parent = NodeRef::random(store_ref());
    let child = NodeRef::random(store_ref());
    repo.add_node(parent.clone(), None);
    repo.add_node(child.clone(), Some(parent.clone()));

    let mut entry = AccessControlEntry::allowed(read(), "alice", 0);
    entry.set_ace_type(AceType::Children);
    let mut parent_acl = AccessControlList::new(AccessControlListProperties::new(
        0,
        "acl-children-parent",
        AclType::Defining,
    ));
    parent_acl.insert_entry(entry);
    repo.set_acl_for_node(&parent, parent_acl).unwrap();

    let mut props = AccessControlListProperties::new(0, "acl-children-child", AclType::Shared);
    props.inherits_from = Some("acl-children-parent".to_string());
    repo.set_acl_for_node(&child, AccessControlList::new(props))
        .unwrap();

    // Children-scoped: applies below the parent, not at it
    assert_eq!(
        svc.has_permission(&parent, &read(), "alice").unwrap(),
        AccessStatus::Denied
    );
    assert_eq!(
        svc.has_permission(&child, &read(), "alice").unwrap(),
        AccessStatus::Allowed
    );

    // Privatising the shared ACL must not strip the grant
    svc.set_permission(&child, "bob", write(), true).unwrap();
    assert_eq!(
        svc.has_permission(&child, &read(), "alice").unwrap(),
        AccessStatus::Allowed
    );

    // The copied entry is local content now and applies at the node
    let child_acl = repo.acl_for_node(&child).unwrap().unwrap();
    let copied = child_acl
        .entries()
        .iter()
        .find(|e| e.authority() == Some("alice"))
        .expect("inherited entry was materialised");
    assert_eq!(copied.ace_type(), AceType::All);
}

#[test]
fn global_acl_applies_when_chain_says_nothing() {
    let repo = Arc::new(MemoryRepository::new());
    let svc = service(&repo);
    let node = NodeRef::random(store_ref());
    repo.add_node(node.clone(), None);

    let mut global = AccessControlList::new(AccessControlListProperties::new(
        0,
        "acl-global",
        AclType::Global,
    ));
    global.insert_entry(AccessControlEntry::allowed(read(), "GROUP_EVERYONE", 0));
    repo.set_global_acl(global);

    assert_eq!(
        svc.has_permission(&node, &read(), "alice").unwrap(),
        AccessStatus::Allowed
    );

    // A local deny still beats the global grant
    svc.set_permission(&node, "alice", read(), false).unwrap();
    assert_eq!(
        svc.has_permission(&node, &read(), "alice").unwrap(),
        AccessStatus::Denied
    );
}
