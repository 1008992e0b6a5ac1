//! Identity tiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TypeError;

/// The verified trust level of an address.
///
/// Ordered: `Unverified < Linked < Primary < Oracle`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IdentityTier {
    /// No verification (the zero value for unseen addresses).
    #[default]
    Unverified,
    /// Secondary account linked to a Primary identity.
    Linked,
    /// Verified unique human.
    Primary,
    /// High-weight verifier.
    Oracle,
}

impl IdentityTier {
    /// Only Primary and Oracle identities may vouch.
    pub fn can_vote(&self) -> bool {
        matches!(self, Self::Primary | Self::Oracle)
    }

    /// Primary-or-above.
    pub fn is_primary(&self) -> bool {
        *self >= Self::Primary
    }

    pub fn code(&self) -> u8 {
        match self {
            Self::Unverified => 0,
            Self::Linked => 1,
            Self::Primary => 2,
            Self::Oracle => 3,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Unverified => "unverified",
            Self::Linked => "linked",
            Self::Primary => "primary",
            Self::Oracle => "oracle",
        }
    }
}

impl TryFrom<u8> for IdentityTier {
    type Error = TypeError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Unverified),
            1 => Ok(Self::Linked),
            2 => Ok(Self::Primary),
            3 => Ok(Self::Oracle),
            other => Err(TypeError::UnknownTier(other.to_string())),
        }
    }
}

impl FromStr for IdentityTier {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "unverified" => Ok(Self::Unverified),
            "linked" => Ok(Self::Linked),
            "primary" => Ok(Self::Primary),
            "oracle" => Ok(Self::Oracle),
            _ => Err(TypeError::UnknownTier(s.to_string())),
        }
    }
}

impl fmt::Display for IdentityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
