// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Per-address-family table of static NAT 1:1 mappings

use crate::errors::{ConflictError, MapperError};
use crate::family::AddressFamily;
use std::collections::HashMap;
use tracing::debug;

/// The static NAT mappings for one address family.
///
/// A table either maps all local addresses of its family to a single external address, or maps
/// individual local addresses to external addresses. It never does both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingTable<A: AddressFamily> {
    map_all: Option<A>,
    pairs: HashMap<A, A>,
}

impl<A: AddressFamily> MappingTable<A> {
    /// Creates a new empty [`MappingTable`]
    #[must_use]
    pub fn new() -> Self {
        Self {
            map_all: None,
            pairs: HashMap::new(),
        }
    }

    /// Sets the external address for all local addresses of the family.
    ///
    /// # Errors
    ///
    /// Returns an error if an external address for all local addresses is already set, or if
    /// individual local addresses are already mapped.
    pub fn set_map_all(&mut self, external: A) -> Result<(), ConflictError> {
        if let Some(existing) = self.map_all {
            return Err(ConflictError::MapAllAlreadySet {
                family: A::NAME,
                existing: existing.into(),
            });
        }
        if !self.pairs.is_empty() {
            return Err(ConflictError::PairsAlreadySet {
                family: A::NAME,
                count: self.pairs.len(),
            });
        }
        debug!("{} map-all external address: {external}", A::NAME);
        self.map_all = Some(external);
        Ok(())
    }

    /// Maps a single local address to an external address.
    ///
    /// # Errors
    ///
    /// Returns an error if an external address for all local addresses is already set, or if
    /// `local` is already mapped.
    pub fn add_pair(&mut self, local: A, external: A) -> Result<(), ConflictError> {
        if let Some(existing) = self.map_all {
            return Err(ConflictError::MapAllAlreadySet {
                family: A::NAME,
                existing: existing.into(),
            });
        }
        if self.pairs.contains_key(&local) {
            return Err(ConflictError::DuplicateLocal(local.into()));
        }
        debug!("{} mapping: {local} -> {external}", A::NAME);
        self.pairs.insert(local, external);
        Ok(())
    }

    /// Looks up the external address for `local`.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::MappingNotFound`] if the table neither maps all addresses nor has an
    /// entry for `local`.
    pub fn resolve(&self, local: &A) -> Result<A, MapperError> {
        self.map_all
            .or_else(|| self.pairs.get(local).copied())
            .ok_or_else(|| MapperError::MappingNotFound((*local).into()))
    }

    /// The external address used for all local addresses, if any
    #[must_use]
    pub fn map_all(&self) -> Option<A> {
        self.map_all
    }

    /// Iterates over the individual (local, external) mappings
    pub fn pairs(&self) -> impl Iterator<Item = (&A, &A)> {
        self.pairs.iter()
    }

    /// Number of entries, counting a map-all address as one
    #[must_use]
    pub fn len(&self) -> usize {
        usize::from(self.map_all.is_some()) + self.pairs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<A: AddressFamily> Default for MappingTable<A> {
    fn default() -> Self {
        Self::new()
    }
}
