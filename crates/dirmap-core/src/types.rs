//! Identifier model and account-type classification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// `sAMAccountType` code for a normal user account.
pub const SAM_NORMAL_ACCOUNT: u32 = 0x3000_0000;

/// `sAMAccountType` code for a workstation or server trust account.
pub const SAM_WORKSTATION_TRUST: u32 = 0x3000_0001;

/// `sAMAccountType` code for an interdomain trust account.
pub const SAM_INTERDOMAIN_TRUST: u32 = 0x3000_0002;

/// `sAMAccountType` code for a security-enabled global group.
pub const SAM_SECURITY_GLOBAL_GROUP: u32 = 0x1000_0000;

/// `sAMAccountType` code for a security-enabled local group.
pub const SAM_SECURITY_LOCAL_GROUP: u32 = 0x2000_0000;

/// Mask isolating the principal-category nibble of a `sAMAccountType` code.
const SAM_CATEGORY_MASK: u32 = 0xF000_0000;

/// The kind of unix-style identifier a directory principal maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdKind {
    /// User-like principals: normal accounts and trust accounts.
    Account,
    /// Security-enabled groups.
    Group,
}

/// A local unix-style identifier with its kind tag.
///
/// The kind determines which account-type clauses apply when the identifier
/// is resolved against the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnixId {
    /// A user id.
    Account(u32),
    /// A group id.
    Group(u32),
}

impl UnixId {
    /// Build an identifier from a kind and a raw value.
    pub fn new(kind: IdKind, value: u32) -> Self {
        match kind {
            IdKind::Account => UnixId::Account(value),
            IdKind::Group => UnixId::Group(value),
        }
    }

    /// The kind tag.
    pub fn kind(&self) -> IdKind {
        match self {
            UnixId::Account(_) => IdKind::Account,
            UnixId::Group(_) => IdKind::Group,
        }
    }

    /// The raw numeric value.
    pub fn value(&self) -> u32 {
        match self {
            UnixId::Account(v) | UnixId::Group(v) => *v,
        }
    }
}

impl fmt::Display for UnixId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnixId::Account(v) => write!(f, "uid={v}"),
            UnixId::Group(v) => write!(f, "gid={v}"),
        }
    }
}

/// Resolution state of a mapping request.
///
/// Starts `Unknown`; after a non-erroring engine call every request is
/// either `Mapped` or `Unmapped`, never `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MappingStatus {
    /// Not yet attempted, or attempt aborted.
    #[default]
    Unknown,
    /// Both sides of the mapping are populated and consistent.
    Mapped,
    /// The request could not be resolved.
    Unmapped,
}

/// Classify a directory account-type code by its category nibble.
///
/// Returns `None` for categories outside user accounts, trust accounts,
/// and security groups; such results are skipped, not errors.
pub fn classify_type_code(code: u32) -> Option<IdKind> {
    match code & SAM_CATEGORY_MASK {
        SAM_SECURITY_GLOBAL_GROUP | SAM_SECURITY_LOCAL_GROUP => Some(IdKind::Group),
        SAM_NORMAL_ACCOUNT => Some(IdKind::Account),
        _ => None,
    }
}
