//! Persisted type codes for ACLs and entries
//!
//! Both enums round-trip through small stable integers: the codes are
//! the contract between this model and its storage collaborator and
//! must never change. Decoding an unknown code is a fatal integrity
//! error, not a default.

use palisade_core::{PalisadeError, PalisadeResult};
use serde::{Deserialize, Serialize};

/// Where an entry applies relative to the node carrying it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AceType {
    /// The node and all of its descendants
    All,
    /// The node only
    Object,
    /// Descendants only
    Children,
}

impl AceType {
    /// Stable persisted code
    pub fn id(self) -> i32 {
        match self {
            Self::All => 0,
            Self::Object => 1,
            Self::Children => 2,
        }
    }

    /// Decode a persisted code
    pub fn from_id(id: i32) -> PalisadeResult<Self> {
        match id {
            0 => Ok(Self::All),
            1 => Ok(Self::Object),
            2 => Ok(Self::Children),
            other => Err(PalisadeError::integrity(format!(
                "unknown ACE type code: {other}"
            ))),
        }
    }

    /// Whether an entry of this type applies directly on its own node
    pub fn applies_to_node(self) -> bool {
        matches!(self, Self::All | Self::Object)
    }

    /// Whether an entry of this type applies on descendants
    pub fn applies_to_descendants(self) -> bool {
        matches!(self, Self::All | Self::Children)
    }
}

/// Provenance and inheritance semantics of an ACL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AclType {
    /// Legacy: resolved by walking the primary-parent chain
    Old,
    /// Owned by exactly one node, never reused
    Defining,
    /// A defining ACL's content reused by descendants via a pointer
    Shared,
    /// Standalone, no inheritance context
    Fixed,
    /// Singleton applied repository-wide
    Global,
    /// Overlays another ACL
    Layered,
}

impl AclType {
    /// Stable persisted code
    pub fn id(self) -> i32 {
        match self {
            Self::Old => 0,
            Self::Defining => 1,
            Self::Shared => 2,
            Self::Fixed => 3,
            Self::Global => 4,
            Self::Layered => 5,
        }
    }

    /// Decode a persisted code
    pub fn from_id(id: i32) -> PalisadeResult<Self> {
        match id {
            0 => Ok(Self::Old),
            1 => Ok(Self::Defining),
            2 => Ok(Self::Shared),
            3 => Ok(Self::Fixed),
            4 => Ok(Self::Global),
            5 => Ok(Self::Layered),
            other => Err(PalisadeError::integrity(format!(
                "unknown ACL type code: {other}"
            ))),
        }
    }

    /// Whether resolution may ascend the primary-parent chain from an
    /// ACL of this type when inheritance is enabled
    pub fn ascends_on_inherit(self) -> bool {
        matches!(self, Self::Old | Self::Shared)
    }
}
