//! Palisade Engine - permission evaluation over the ACL model
//!
//! The engine answers "what access does this user have to this
//! permission on this node". It resolves the node's ACL, walks the
//! inheritance chain when the ACL type calls for it, folds in
//! dynamically computed authorities, and takes the first decisive
//! entry in comparator order. Denied entries sort before allowed ones
//! at the same position, so a single ordered pass implements
//! deny-wins.
//!
//! Storage, node hierarchy, and authority membership are external
//! collaborators behind traits; in-memory implementations live in
//! [`memory`] for tests and embedders.
//!
//! Evaluation is synchronous and side-effect-free. Mutations go
//! through the [`AclStore`](collaborators::AclStore) under the
//! caller's transaction; concurrent version conflicts are the
//! caller's retry concern, never retried here.

#![forbid(unsafe_code)]

/// Engine defaults and limits
pub mod config;

/// Collaborator traits supplied by the surrounding repository
pub mod collaborators;

/// In-memory collaborators for tests and embedders
pub mod memory;

/// Dynamically computed authorities
pub mod dynamic;

/// The permission service itself
pub mod service;

/// Cut-off bookkeeping for permission-filtered bulk results
pub mod cutoff;

pub use config::EngineConfig;
pub use cutoff::{filter_with_cut_off, PermissionCheckCollection, PermissionCheckedCollection};
pub use dynamic::{DynamicAuthority, OwnerDynamicAuthority, ROLE_OWNER};
pub use service::PermissionService;
