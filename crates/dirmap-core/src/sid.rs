//! Security identifiers for directory principals.
//!
//! A security identifier is the directory's globally unique reference to a
//! principal: one revision octet, a 48-bit identifier authority, and up to
//! fifteen 32-bit sub-authorities. The textual form is `S-1-5-21-…`; the
//! wire form is the packed binary value stored in `objectSid`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Maximum number of sub-authorities a security identifier may carry.
pub const MAX_SUB_AUTHORITIES: usize = 15;

/// Largest representable identifier authority (48 bits).
const MAX_AUTHORITY: u64 = (1 << 48) - 1;

/// Error produced when parsing or constructing a security identifier.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SidError {
    /// The value does not follow the `S-R-A-s1-s2-…` form.
    #[error("malformed security identifier: {0}")]
    Malformed(String),

    /// More sub-authorities than the format allows.
    #[error("{0} sub-authorities exceeds the maximum of {MAX_SUB_AUTHORITIES}")]
    TooManySubAuthorities(usize),
}

/// A directory principal's security identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SecurityIdentifier {
    revision: u8,
    authority: u64,
    sub_authorities: Vec<u32>,
}

impl SecurityIdentifier {
    /// Build an identifier from its parts.
    pub fn new(
        revision: u8,
        authority: u64,
        sub_authorities: Vec<u32>,
    ) -> Result<Self, SidError> {
        if authority > MAX_AUTHORITY {
            return Err(SidError::Malformed(format!(
                "identifier authority {authority} exceeds 48 bits"
            )));
        }
        if sub_authorities.len() > MAX_SUB_AUTHORITIES {
            return Err(SidError::TooManySubAuthorities(sub_authorities.len()));
        }
        Ok(Self {
            revision,
            authority,
            sub_authorities,
        })
    }

    /// The revision octet.
    pub fn revision(&self) -> u8 {
        self.revision
    }

    /// The 48-bit identifier authority.
    pub fn authority(&self) -> u64 {
        self.authority
    }

    /// The sub-authority chain.
    pub fn sub_authorities(&self) -> &[u32] {
        &self.sub_authorities
    }

    /// Encode into the packed wire form stored in `objectSid`.
    ///
    /// Layout: revision, sub-authority count, the authority as six
    /// big-endian octets, then each sub-authority as a little-endian u32.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(8 + 4 * self.sub_authorities.len());
        out.push(self.revision);
        out.push(self.sub_authorities.len() as u8);
        out.extend_from_slice(&self.authority.to_be_bytes()[2..]);
        for sub in &self.sub_authorities {
            out.extend_from_slice(&sub.to_le_bytes());
        }
        out
    }

    /// Decode the packed wire form; `None` when the octets are not a
    /// well-formed identifier.
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 8 {
            return None;
        }
        let revision = data[0];
        let count = data[1] as usize;
        if count > MAX_SUB_AUTHORITIES || data.len() != 8 + 4 * count {
            return None;
        }
        let mut authority_bytes = [0u8; 8];
        authority_bytes[2..].copy_from_slice(&data[2..8]);
        let authority = u64::from_be_bytes(authority_bytes);
        let sub_authorities = data[8..]
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        Some(Self {
            revision,
            authority,
            sub_authorities,
        })
    }

    /// Encode for use as an equality value in a search filter: every octet
    /// of the wire form as an RFC 4515 `\xx` escape.
    pub fn ldap_encoded(&self) -> String {
        let bytes = self.to_bytes();
        let mut out = String::with_capacity(bytes.len() * 3);
        for b in bytes {
            out.push('\\');
            out.push_str(&format!("{b:02x}"));
        }
        out
    }
}

impl fmt::Display for SecurityIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S-{}", self.revision)?;
        if self.authority < (1 << 32) {
            write!(f, "-{}", self.authority)?;
        } else {
            write!(f, "-0x{:012X}", self.authority)?;
        }
        for sub in &self.sub_authorities {
            write!(f, "-{sub}")?;
        }
        Ok(())
    }
}

impl FromStr for SecurityIdentifier {
    type Err = SidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('-');
        match parts.next() {
            Some("S") | Some("s") => {}
            _ => return Err(SidError::Malformed(s.to_string())),
        }
        let revision = parts
            .next()
            .and_then(|p| p.parse::<u8>().ok())
            .ok_or_else(|| SidError::Malformed(s.to_string()))?;
        let authority_part = parts.next().ok_or_else(|| SidError::Malformed(s.to_string()))?;
        let parsed = if let Some(hex) = authority_part
            .strip_prefix("0x")
            .or_else(|| authority_part.strip_prefix("0X"))
        {
            u64::from_str_radix(hex, 16).ok()
        } else {
            authority_part.parse::<u64>().ok()
        };
        let authority = parsed
            .filter(|a| *a <= MAX_AUTHORITY)
            .ok_or_else(|| SidError::Malformed(s.to_string()))?;
        let mut sub_authorities = Vec::new();
        for part in parts {
            if sub_authorities.len() == MAX_SUB_AUTHORITIES {
                return Err(SidError::TooManySubAuthorities(sub_authorities.len() + 1));
            }
            let sub = part
                .parse::<u32>()
                .map_err(|_| SidError::Malformed(s.to_string()))?;
            sub_authorities.push(sub);
        }
        Ok(Self {
            revision,
            authority,
            sub_authorities,
        })
    }
}

impl TryFrom<String> for SecurityIdentifier {
    type Error = SidError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<SecurityIdentifier> for String {
    fn from(sid: SecurityIdentifier) -> Self {
        sid.to_string()
    }
}
