//! Authority strings and their classification
//!
//! An authority is a user name, a group, a role, or one of the
//! well-known principals. The type of an authority is derived from
//! the string itself, never stored independently, so the two can
//! never disagree.

use serde::{Deserialize, Serialize};

/// Prefix identifying group authorities
pub const GROUP_PREFIX: &str = "GROUP_";

/// Prefix identifying role authorities
pub const ROLE_PREFIX: &str = "ROLE_";

/// The well-known everyone group
pub const PERMISSIONS_EVERYONE: &str = "GROUP_EVERYONE";

/// The well-known guest authority
pub const GUEST_AUTHORITY: &str = "guest";

/// Classification of an authority string
///
/// The precedence rank orders evaluation so that more specific
/// authority types are considered before broader ones when ACE
/// positions otherwise tie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthorityType {
    /// A plain user name
    User,
    /// The guest principal
    Guest,
    /// A `ROLE_`-prefixed authority, including dynamic roles
    Role,
    /// A `GROUP_`-prefixed authority
    Group,
    /// The everyone group
    Everyone,
    /// No authority given: the entry applies to all authorities
    Wildcard,
}

impl AuthorityType {
    /// Derive the type of an authority from its string form
    ///
    /// `None` (no authority at all) classifies as [`Wildcard`](Self::Wildcard).
    pub fn from_authority(authority: Option<&str>) -> Self {
        match authority {
            None => Self::Wildcard,
            Some("") => Self::Wildcard,
            Some(PERMISSIONS_EVERYONE) => Self::Everyone,
            Some(GUEST_AUTHORITY) => Self::Guest,
            Some(s) if s.starts_with(GROUP_PREFIX) => Self::Group,
            Some(s) if s.starts_with(ROLE_PREFIX) => Self::Role,
            Some(_) => Self::User,
        }
    }

    /// Evaluation precedence, most specific first
    pub fn precedence(self) -> u8 {
        match self {
            Self::User => 0,
            Self::Guest => 1,
            Self::Role => 2,
            Self::Group => 3,
            Self::Everyone => 4,
            Self::Wildcard => 5,
        }
    }
}
