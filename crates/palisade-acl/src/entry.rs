//! A single access-control entry and its total order
//!
//! The comparator here is load-bearing: an [`AccessControlList`]
//! keeps its entries sorted by it, and the engine evaluates entries
//! in that order taking the first match. Deny-before-allow within a
//! position is what makes single-pass deny-wins evaluation correct.
//!
//! [`AccessControlList`]: crate::list::AccessControlList

use std::cmp::Ordering;
use std::sync::Arc;

use palisade_core::{AccessStatus, AuthorityType, PermissionReference};
use serde::{Deserialize, Serialize};

use crate::context::AccessControlEntryContext;
use crate::types::AceType;

/// One (permission, authority, allow/deny) rule within an ACL
///
/// A `None` permission applies to all permissions; a `None` authority
/// applies to all authorities. The authority type is derived from the
/// authority string on assignment and cannot be set independently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessControlEntry {
    permission: Option<Arc<PermissionReference>>,
    authority: Option<String>,
    authority_type: AuthorityType,
    access_status: AccessStatus,
    ace_type: AceType,
    position: Option<i32>,
    context: Option<AccessControlEntryContext>,
}

impl AccessControlEntry {
    /// Create an entry granting or denying `permission` to `authority`
    pub fn new(
        permission: Option<Arc<PermissionReference>>,
        authority: Option<impl Into<String>>,
        access_status: AccessStatus,
        ace_type: AceType,
    ) -> Self {
        let authority = authority.map(Into::into);
        let authority_type = AuthorityType::from_authority(authority.as_deref());
        Self {
            permission,
            authority,
            authority_type,
            access_status,
            ace_type,
            position: None,
            context: None,
        }
    }

    /// Convenience: an allow entry at a position
    pub fn allowed(
        permission: Arc<PermissionReference>,
        authority: impl Into<String>,
        position: i32,
    ) -> Self {
        let mut ace = Self::new(
            Some(permission),
            Some(authority),
            AccessStatus::Allowed,
            AceType::All,
        );
        ace.position = Some(position);
        ace
    }

    /// Convenience: a deny entry at a position
    pub fn denied(
        permission: Arc<PermissionReference>,
        authority: impl Into<String>,
        position: i32,
    ) -> Self {
        let mut ace = Self::new(
            Some(permission),
            Some(authority),
            AccessStatus::Denied,
            AceType::All,
        );
        ace.position = Some(position);
        ace
    }

    /// The permission this entry covers, `None` for all permissions
    pub fn permission(&self) -> Option<&Arc<PermissionReference>> {
        self.permission.as_ref()
    }

    /// The authority this entry covers, `None` for all authorities
    pub fn authority(&self) -> Option<&str> {
        self.authority.as_deref()
    }

    /// The derived type of the authority
    pub fn authority_type(&self) -> AuthorityType {
        self.authority_type
    }

    /// Allow or deny
    pub fn access_status(&self) -> AccessStatus {
        self.access_status
    }

    /// Where the entry applies relative to its node
    pub fn ace_type(&self) -> AceType {
        self.ace_type
    }

    /// Evaluation position, lower evaluated first
    pub fn position(&self) -> Option<i32> {
        self.position
    }

    /// Optional applicability context
    pub fn context(&self) -> Option<&AccessControlEntryContext> {
        self.context.as_ref()
    }

    /// Replace the authority, re-deriving the authority type
    pub fn set_authority(&mut self, authority: Option<impl Into<String>>) {
        self.authority = authority.map(Into::into);
        self.authority_type = AuthorityType::from_authority(self.authority.as_deref());
    }

    /// Set the evaluation position
    pub fn set_position(&mut self, position: Option<i32>) {
        self.position = position;
    }

    /// Set where the entry applies relative to its node
    pub fn set_ace_type(&mut self, ace_type: AceType) {
        self.ace_type = ace_type;
    }

    /// Attach an applicability context
    pub fn set_context(&mut self, context: Option<AccessControlEntryContext>) {
        self.context = context;
    }

    /// Whether this entry covers `permission` (exactly or via the
    /// wildcard permission on either side)
    pub fn covers_permission(&self, permission: &PermissionReference) -> bool {
        match &self.permission {
            None => true,
            Some(own) => own.as_ref() == permission || own.is_all(),
        }
    }

    fn deny_rank(&self) -> u8 {
        match self.access_status {
            AccessStatus::Denied => 0,
            AccessStatus::Allowed => 1,
            AccessStatus::Undetermined => 2,
        }
    }

    fn sort_key(&self) -> (i32, u8, u8, Option<&str>, Option<&str>) {
        (
            // Entries with no position sort ahead of positioned ones
            self.position.unwrap_or(i32::MIN),
            self.deny_rank(),
            self.authority_type.precedence(),
            self.authority.as_deref(),
            self.permission.as_ref().map(|p| p.name()),
        )
    }
}

impl Ord for AccessControlEntry {
    /// Position ascending, then denied before allowed, then authority
    /// type (most specific first). The trailing authority-string and
    /// permission-name keys only make the order total; evaluation
    /// never depends on them.
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl PartialOrd for AccessControlEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
