// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Errors returned when building or querying an [`ExternalIpMapper`].
//!
//! [`ExternalIpMapper`]: crate::ExternalIpMapper

use crate::candidate::CandidateType;
use std::net::IpAddr;

/// Reasons why a single mapping entry, or an address, is syntactically invalid.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    #[error("'{0}' is not a valid IP address")]
    InvalidAddress(String),
    #[error("expected 1 or 2 '/'-separated addresses, found {0}")]
    TokenCount(usize),
    #[error("external address {external} and local address {local} are not of the same IP version")]
    FamilyMismatch { external: IpAddr, local: IpAddr },
}

/// Reasons why a mapping entry cannot be installed in a table.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConflictError {
    #[error("{family} external address {existing} already maps all local addresses")]
    MapAllAlreadySet { family: &'static str, existing: IpAddr },
    #[error("{family} local addresses are already mapped individually ({count} entries)")]
    PairsAlreadySet { family: &'static str, count: usize },
    #[error("local address {0} is already mapped")]
    DuplicateLocal(IpAddr),
}

/// The error type for the mapper.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MapperError {
    #[error("Invalid NAT 1:1 mapping: {0}")]
    InvalidMappingSyntax(SyntaxError),
    #[error("Conflicting NAT 1:1 mapping: {0}")]
    ConflictingMapping(ConflictError),
    #[error("Unsupported NAT 1:1 candidate type: {0}")]
    UnsupportedCandidateType(CandidateType),
    #[error("External mapped address not found for {0}")]
    MappingNotFound(IpAddr),
    /// A configuration entry failed; wraps the reason together with the entry position and text.
    #[error("Bad mapping entry #{index} '{entry}': {source}")]
    Entry {
        index: usize,
        entry: String,
        #[source]
        source: Box<MapperError>,
    },
}

impl MapperError {
    /// Wraps `self` with the position and text of the configuration entry that caused it.
    #[must_use]
    pub(crate) fn at_entry(self, index: usize, entry: &str) -> Self {
        MapperError::Entry {
            index,
            entry: entry.to_owned(),
            source: Box::new(self),
        }
    }

    /// Strips any entry context and returns the underlying error.
    #[must_use]
    pub fn root(&self) -> &MapperError {
        match self {
            MapperError::Entry { source, .. } => source.root(),
            other => other,
        }
    }

    /// True if the root cause is a syntax error.
    #[must_use]
    pub fn is_syntax(&self) -> bool {
        matches!(self.root(), MapperError::InvalidMappingSyntax(_))
    }

    /// True if the root cause is a conflict between entries.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self.root(), MapperError::ConflictingMapping(_))
    }

    /// True if the root cause is a failed lookup.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self.root(), MapperError::MappingNotFound(_))
    }
}

impl From<SyntaxError> for MapperError {
    fn from(e: SyntaxError) -> Self {
        MapperError::InvalidMappingSyntax(e)
    }
}

impl From<ConflictError> for MapperError {
    fn from(e: ConflictError) -> Self {
        MapperError::ConflictingMapping(e)
    }
}
