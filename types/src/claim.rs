//! Claim types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TypeError;

/// Monotonically assigned claim identifier.
pub type ClaimId = u64;

/// What a claim asks the community to decide.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ClaimType {
    /// Link the claimant to an existing Primary identity on some platform.
    LinkToPrimary,
    /// Verify the claimant as a unique Primary identity.
    NewPrimary,
    /// Flag a target address as a Sybil duplicate.
    DuplicateFlag,
}

impl ClaimType {
    pub const ALL: [ClaimType; 3] = [Self::LinkToPrimary, Self::NewPrimary, Self::DuplicateFlag];

    pub fn code(&self) -> u8 {
        match self {
            Self::LinkToPrimary => 0,
            Self::NewPrimary => 1,
            Self::DuplicateFlag => 2,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::LinkToPrimary => "link_to_primary",
            Self::NewPrimary => "new_primary",
            Self::DuplicateFlag => "duplicate_flag",
        }
    }
}

impl TryFrom<u8> for ClaimType {
    type Error = TypeError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::LinkToPrimary),
            1 => Ok(Self::NewPrimary),
            2 => Ok(Self::DuplicateFlag),
            other => Err(TypeError::UnknownClaimType(other.to_string())),
        }
    }
}

impl FromStr for ClaimType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "link" | "link_to_primary" => Ok(Self::LinkToPrimary),
            "primary" | "new_primary" => Ok(Self::NewPrimary),
            "duplicate" | "duplicate_flag" => Ok(Self::DuplicateFlag),
            _ => Err(TypeError::UnknownClaimType(s.to_string())),
        }
    }
}

impl fmt::Display for ClaimType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_decode() {
        for ty in ClaimType::ALL {
            assert_eq!(ClaimType::try_from(ty.code()).unwrap(), ty);
        }
        assert!(matches!(ClaimType::try_from(3), Err(TypeError::UnknownClaimType(_))));
    }

    #[test]
    fn names_parse() {
        assert_eq!("link".parse::<ClaimType>().unwrap(), ClaimType::LinkToPrimary);
        assert_eq!("New-Primary".parse::<ClaimType>().unwrap(), ClaimType::NewPrimary);
        assert_eq!("duplicate_flag".parse::<ClaimType>().unwrap(), ClaimType::DuplicateFlag);
        assert!("sybil".parse::<ClaimType>().is_err());
    }
}
