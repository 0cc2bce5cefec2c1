// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! A single static NAT 1:1 configuration entry: `EXTERNAL` or `EXTERNAL/LOCAL`

use crate::errors::SyntaxError;
use crate::family::{canonical, validate_ip};
use std::fmt::Display;
use std::net::IpAddr;
use std::str::FromStr;

/// Separator between the external and the local address in a configuration entry
pub const MAPPING_SEPARATOR: char = '/';

/// One parsed mapping entry. Addresses are held in canonical form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NatMapping {
    /// All local addresses of the family of `external` are mapped to `external`
    MapAll { external: IpAddr },
    /// `local` is mapped to `external`; both belong to the same family
    Pair { external: IpAddr, local: IpAddr },
}

impl NatMapping {
    #[must_use]
    pub fn map_all(external: IpAddr) -> Self {
        NatMapping::MapAll {
            external: canonical(external),
        }
    }

    /// Builds a local-to-external mapping.
    ///
    /// # Errors
    ///
    /// Returns [`SyntaxError::FamilyMismatch`] if the two addresses are not of the same IP version.
    pub fn pair(external: IpAddr, local: IpAddr) -> Result<Self, SyntaxError> {
        let (external, local) = (canonical(external), canonical(local));
        if external.is_ipv4() != local.is_ipv4() {
            return Err(SyntaxError::FamilyMismatch { external, local });
        }
        Ok(NatMapping::Pair { external, local })
    }

    /// The external address of the entry
    #[must_use]
    pub fn external(&self) -> IpAddr {
        match self {
            NatMapping::MapAll { external } | NatMapping::Pair { external, .. } => *external,
        }
    }

    /// The local address of the entry, `None` if it maps all local addresses
    #[must_use]
    pub fn local(&self) -> Option<IpAddr> {
        match self {
            NatMapping::MapAll { .. } => None,
            NatMapping::Pair { local, .. } => Some(*local),
        }
    }
}

impl FromStr for NatMapping {
    type Err = SyntaxError;

    fn from_str(entry: &str) -> Result<Self, Self::Err> {
        let tokens: Vec<&str> = entry.split(MAPPING_SEPARATOR).collect();
        match tokens.as_slice() {
            [external] => Ok(NatMapping::map_all(validate_ip(external)?)),
            [external, local] => {
                let external = validate_ip(external)?;
                let local = validate_ip(local)?;
                NatMapping::pair(external, local)
            }
            _ => Err(SyntaxError::TokenCount(tokens.len())),
        }
    }
}

impl Display for NatMapping {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NatMapping::MapAll { external } => write!(f, "{external}"),
            NatMapping::Pair { external, local } => {
                write!(f, "{external}{MAPPING_SEPARATOR}{local}")
            }
        }
    }
}
