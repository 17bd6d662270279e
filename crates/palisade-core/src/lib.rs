//! Palisade Core - foundational types for the ACL model
//!
//! This crate provides the small value types the rest of Palisade is
//! built on: qualified names, store-scoped node references, authority
//! classification, permission references with interning, and the
//! unified error type shared by all crates.

#![forbid(unsafe_code)]

/// Unified error handling
pub mod errors;

/// Qualified names and node references
pub mod identifiers;

/// Authority strings and their classification
pub mod authority;

/// Permission references, access status, and the interning model
pub mod permission;

pub use authority::{AuthorityType, GROUP_PREFIX, GUEST_AUTHORITY, PERMISSIONS_EVERYONE, ROLE_PREFIX};
pub use errors::{PalisadeError, PalisadeResult};
pub use identifiers::{NodeRef, QName, StoreRef};
pub use permission::{AccessStatus, PermissionModel, PermissionReference};
