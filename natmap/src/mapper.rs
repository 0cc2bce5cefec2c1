// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! External address resolution for ICE candidates behind a static NAT 1:1

use crate::candidate::CandidateType;
use crate::errors::{MapperError, SyntaxError};
use crate::family::{canonical, validate_ip};
use crate::mapping::NatMapping;
use crate::table::MappingTable;
use static_assertions::assert_impl_all;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use tracing::{debug, trace};

/// Maps local interface addresses to the external addresses to advertise in ICE candidates.
///
/// An [`ExternalIpMapper`] is built once from the configured mappings and is read-only
/// afterwards. It holds one [`MappingTable`] per address family; lookups never fall back from
/// one family to the other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalIpMapper {
    ipv4: MappingTable<Ipv4Addr>,
    ipv6: MappingTable<Ipv6Addr>,
    candidate_type: CandidateType,
}

// Queried concurrently by candidate gathering, without locking
assert_impl_all!(ExternalIpMapper: Send, Sync);

/// What to advertise for a local address, as computed by [`ExternalIpMapper::advertise`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Advertisement {
    /// Address to advertise in the candidate
    pub address: IpAddr,
    /// Type of the advertised candidate
    pub candidate_type: CandidateType,
    /// Related address for server-reflexive candidates: the local address the mapping applies to
    pub related_address: Option<IpAddr>,
}

/// Resolves the candidate type requested for the mappings.
fn mapped_candidate_type(candidate_type: CandidateType) -> Result<CandidateType, MapperError> {
    match candidate_type {
        CandidateType::Unspecified | CandidateType::Host => Ok(CandidateType::Host),
        CandidateType::ServerReflexive => Ok(CandidateType::ServerReflexive),
        other => Err(MapperError::UnsupportedCandidateType(other)),
    }
}

impl ExternalIpMapper {
    fn empty(candidate_type: CandidateType) -> Result<Self, MapperError> {
        Ok(Self {
            ipv4: MappingTable::new(),
            ipv6: MappingTable::new(),
            candidate_type: mapped_candidate_type(candidate_type)?,
        })
    }

    /// Builds a mapper from configuration entries, each of the form `EXTERNAL` or
    /// `EXTERNAL/LOCAL`.
    ///
    /// Entries are processed in order. An entry with a single address maps all local addresses
    /// of its family; an entry with two addresses maps the local address only.
    /// [`CandidateType::Unspecified`] stands for [`CandidateType::Host`].
    ///
    /// # Returns
    ///
    /// Returns `Ok(None)` if `mappings` is empty: no mapping is configured, local addresses are
    /// to be advertised unchanged.
    ///
    /// # Errors
    ///
    /// - [`MapperError::UnsupportedCandidateType`] if `candidate_type` is neither host nor
    ///   server-reflexive.
    /// - For the first invalid entry, a [`MapperError::Entry`] wrapping
    ///   [`MapperError::InvalidMappingSyntax`] (bad address, wrong number of addresses, mixed IP
    ///   versions) or [`MapperError::ConflictingMapping`] (map-all and individual mappings for the
    ///   same family, duplicate map-all, duplicate local address).
    pub fn new<S: AsRef<str>>(
        candidate_type: CandidateType,
        mappings: &[S],
    ) -> Result<Option<Self>, MapperError> {
        if mappings.is_empty() {
            debug!("No NAT 1:1 mapping configured");
            return Ok(None);
        }
        let mut mapper = Self::empty(candidate_type)?;
        for (index, entry) in mappings.iter().enumerate() {
            let entry = entry.as_ref();
            entry
                .parse::<NatMapping>()
                .map_err(MapperError::from)
                .and_then(|mapping| mapper.install(&mapping))
                .map_err(|e| e.at_entry(index, entry))?;
        }
        debug!(
            "NAT 1:1 mapper ready: {} IPv4 and {} IPv6 entries, candidate type {}",
            mapper.ipv4.len(),
            mapper.ipv6.len(),
            mapper.candidate_type
        );
        Ok(Some(mapper))
    }

    /// Same as [`ExternalIpMapper::new`], from entries that have already been parsed.
    ///
    /// # Errors
    ///
    /// Same as [`ExternalIpMapper::new`], except that parsing errors cannot occur.
    pub fn from_mappings<I>(
        candidate_type: CandidateType,
        mappings: I,
    ) -> Result<Option<Self>, MapperError>
    where
        I: IntoIterator<Item = NatMapping>,
    {
        let mut mappings = mappings.into_iter().peekable();
        if mappings.peek().is_none() {
            debug!("No NAT 1:1 mapping configured");
            return Ok(None);
        }
        let mut mapper = Self::empty(candidate_type)?;
        for (index, mapping) in mappings.enumerate() {
            mapper
                .install(&mapping)
                .map_err(|e| e.at_entry(index, &mapping.to_string()))?;
        }
        Ok(Some(mapper))
    }

    fn install(&mut self, mapping: &NatMapping) -> Result<(), MapperError> {
        match *mapping {
            NatMapping::MapAll {
                external: IpAddr::V4(external),
            } => self.ipv4.set_map_all(external)?,
            NatMapping::MapAll {
                external: IpAddr::V6(external),
            } => self.ipv6.set_map_all(external)?,
            NatMapping::Pair {
                external: IpAddr::V4(external),
                local: IpAddr::V4(local),
            } => self.ipv4.add_pair(local, external)?,
            NatMapping::Pair {
                external: IpAddr::V6(external),
                local: IpAddr::V6(local),
            } => self.ipv6.add_pair(local, external)?,
            NatMapping::Pair { external, local } => {
                return Err(SyntaxError::FamilyMismatch { external, local }.into());
            }
        }
        Ok(())
    }

    /// The type of the candidates advertised with mapped addresses: host or server-reflexive.
    #[must_use]
    pub fn candidate_type(&self) -> CandidateType {
        self.candidate_type
    }

    #[must_use]
    pub fn ipv4_table(&self) -> &MappingTable<Ipv4Addr> {
        &self.ipv4
    }

    #[must_use]
    pub fn ipv6_table(&self) -> &MappingTable<Ipv6Addr> {
        &self.ipv6
    }

    /// Finds the external address for a local address given as text.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::InvalidMappingSyntax`] if `local` is not a valid IP address, or
    /// [`MapperError::MappingNotFound`] if no mapping applies to it.
    pub fn find_external_ip(&self, local: &str) -> Result<IpAddr, MapperError> {
        self.find_external_addr(validate_ip(local)?)
    }

    /// Finds the external address for a local address.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::MappingNotFound`] if the table for the family of `local` neither
    /// maps all addresses nor has an entry for `local`.
    pub fn find_external_addr(&self, local: IpAddr) -> Result<IpAddr, MapperError> {
        let external = match canonical(local) {
            IpAddr::V4(local) => self.ipv4.resolve(&local).map(IpAddr::V4),
            IpAddr::V6(local) => self.ipv6.resolve(&local).map(IpAddr::V6),
        };
        match &external {
            Ok(ext) => trace!("Local address {local} maps to {ext}"),
            Err(e) => trace!("{e}"),
        }
        external
    }

    /// Computes the candidate to advertise for a local address.
    ///
    /// With host candidates, the external address replaces the local one. With server-reflexive
    /// candidates, the external address is advertised and the local address is the related
    /// address.
    ///
    /// # Errors
    ///
    /// Same as [`ExternalIpMapper::find_external_addr`]. Callers should skip the candidate
    /// rather than stop gathering.
    pub fn advertise(&self, local: IpAddr) -> Result<Advertisement, MapperError> {
        let address = self.find_external_addr(local)?;
        let related_address = match self.candidate_type {
            CandidateType::ServerReflexive => Some(canonical(local)),
            _ => None,
        };
        Ok(Advertisement {
            address,
            candidate_type: self.candidate_type,
            related_address,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ConflictError;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;
    use tracing_test::traced_test;

    fn ip(s: &str) -> IpAddr {
        IpAddr::from_str(s).expect("Invalid IP address")
    }

    fn build(mappings: &[&str]) -> ExternalIpMapper {
        ExternalIpMapper::new(CandidateType::Host, mappings)
            .expect("Failed to build mapper")
            .expect("Mapper should be configured")
    }

    fn build_err(mappings: &[&str]) -> MapperError {
        ExternalIpMapper::new(CandidateType::Host, mappings)
            .expect_err("Mapper should be rejected")
    }

    #[test]
    fn test_empty_config() {
        let none: &[&str] = &[];
        assert_eq!(ExternalIpMapper::new(CandidateType::Host, none), Ok(None));
        assert_eq!(
            ExternalIpMapper::new(CandidateType::ServerReflexive, none),
            Ok(None)
        );
        // Nothing to map, so the candidate type is not checked
        assert_eq!(ExternalIpMapper::new(CandidateType::Relay, none), Ok(None));
        assert_eq!(
            ExternalIpMapper::from_mappings(CandidateType::Host, []),
            Ok(None)
        );
    }

    #[test]
    fn test_candidate_types() {
        let mapper = ExternalIpMapper::new(CandidateType::Unspecified, &["1.2.3.4"])
            .unwrap()
            .unwrap();
        assert_eq!(mapper.candidate_type(), CandidateType::Host);
        assert_eq!(mapper, build(&["1.2.3.4"]));

        let mapper = ExternalIpMapper::new(CandidateType::ServerReflexive, &["1.2.3.4"])
            .unwrap()
            .unwrap();
        assert_eq!(mapper.candidate_type(), CandidateType::ServerReflexive);

        for unsupported in [CandidateType::PeerReflexive, CandidateType::Relay] {
            assert_eq!(
                ExternalIpMapper::new(unsupported, &["1.2.3.4"]),
                Err(MapperError::UnsupportedCandidateType(unsupported))
            );
        }
    }

    #[test]
    fn test_map_all_ipv4() {
        let mapper = build(&["1.2.3.4"]);
        assert_eq!(mapper.find_external_ip("10.0.0.1"), Ok(ip("1.2.3.4")));
        assert_eq!(mapper.find_external_ip("192.168.0.7"), Ok(ip("1.2.3.4")));
        // No IPv6 entry
        assert_eq!(
            mapper.find_external_ip("::1"),
            Err(MapperError::MappingNotFound(ip("::1")))
        );
    }

    #[test]
    fn test_map_all_both_families() {
        let mapper = build(&["2001:db8::1", "1.2.3.4"]);
        assert_eq!(mapper.find_external_ip("10.0.0.1"), Ok(ip("1.2.3.4")));
        assert_eq!(mapper.find_external_ip("fd00::5"), Ok(ip("2001:db8::1")));
        assert_eq!(mapper.ipv4_table().map_all(), Some(Ipv4Addr::new(1, 2, 3, 4)));
        assert_eq!(mapper.ipv6_table().len(), 1);
    }

    #[test]
    fn test_pairs() {
        let mapper = build(&["1.2.3.4/10.0.0.1", "1.2.3.5/10.0.0.2"]);
        assert_eq!(mapper.find_external_ip("10.0.0.1"), Ok(ip("1.2.3.4")));
        assert_eq!(mapper.find_external_ip("10.0.0.2"), Ok(ip("1.2.3.5")));
        assert_eq!(
            mapper.find_external_ip("10.0.0.3"),
            Err(MapperError::MappingNotFound(ip("10.0.0.3")))
        );
        assert_eq!(
            mapper.find_external_ip("fd00::1"),
            Err(MapperError::MappingNotFound(ip("fd00::1")))
        );
    }

    #[test]
    fn test_pairs_ipv6_with_map_all_ipv4() {
        // Each family has its own table: map-all for IPv4 and pairs for IPv6 can coexist
        let mapper = build(&["1.2.3.4", "2001:db8::1/fd00::1", "2001:db8::2/fd00::2"]);
        assert_eq!(mapper.find_external_ip("10.9.8.7"), Ok(ip("1.2.3.4")));
        assert_eq!(mapper.find_external_ip("fd00::2"), Ok(ip("2001:db8::2")));
        assert!(mapper.find_external_ip("fd00::3").unwrap_err().is_not_found());
    }

    #[test]
    fn test_textual_forms() {
        let mapper = build(&["2001:db8::1/FD00:0000:0000:0000:0000:0000:0000:0001"]);
        assert_eq!(mapper.find_external_ip("fd00::1"), Ok(ip("2001:db8::1")));
        assert_eq!(mapper.find_external_ip("fd00:0::0:1"), Ok(ip("2001:db8::1")));
        assert_eq!(
            mapper.find_external_ip("fd00:0:0:0:0:0:0:0001"),
            Ok(ip("2001:db8::1"))
        );

        // Duplicate local address written differently
        let err = build_err(&["2001:db8::1/fd00::1", "2001:db8::2/fd00:0::01"]);
        assert_eq!(
            err.root(),
            &MapperError::ConflictingMapping(ConflictError::DuplicateLocal(ip("fd00::1")))
        );

        // IPv4-mapped IPv6 addresses resolve against the IPv4 table
        let mapper = build(&["1.2.3.4/10.0.0.1"]);
        assert_eq!(mapper.find_external_ip("::ffff:10.0.0.1"), Ok(ip("1.2.3.4")));
        assert_eq!(
            mapper.find_external_addr(ip("::ffff:10.0.0.1")),
            Ok(ip("1.2.3.4"))
        );
    }

    #[test]
    fn test_conflicts() {
        for mappings in [
            ["1.2.3.4", "1.2.3.5/10.0.0.1"],
            ["1.2.3.5/10.0.0.1", "1.2.3.4"],
            ["1.2.3.4", "1.2.3.5"],
            ["1.2.3.4/10.0.0.1", "1.2.3.5/10.0.0.1"],
            ["2001:db8::1", "2001:db8::2/fd00::1"],
            ["2001:db8::2/fd00::1", "2001:db8::1"],
            ["2001:db8::1/fd00::1", "2001:db8::2/fd00::1"],
        ] {
            let err = build_err(&mappings);
            assert!(err.is_conflict(), "{mappings:?} gave {err}");
            assert!(matches!(err, MapperError::Entry { index: 1, .. }));
        }
    }

    #[test]
    fn test_syntax_errors() {
        for mappings in [
            vec!["1.2.3.4/10.0.0.1/10.0.0.2"],
            vec!["1.2.3.4/fd00::1"],
            vec!["2001:db8::1/10.0.0.1"],
            vec!["not-an-ip"],
            vec![""],
            vec!["1.2.3.4/"],
            vec!["1.2.3.4", "1.2.3.x/10.0.0.1"],
        ] {
            let err = build_err(&mappings);
            assert!(err.is_syntax(), "{mappings:?} gave {err}");
        }
    }

    #[test]
    fn test_first_error_wins() {
        // The conflict on entry #1 is reported, not the syntax error on entry #2
        let err = build_err(&["1.2.3.4", "1.2.3.5/10.0.0.1", "bogus"]);
        assert_eq!(
            err,
            MapperError::Entry {
                index: 1,
                entry: "1.2.3.5/10.0.0.1".to_owned(),
                source: Box::new(MapperError::ConflictingMapping(
                    ConflictError::MapAllAlreadySet {
                        family: "IPv4",
                        existing: ip("1.2.3.4"),
                    }
                )),
            }
        );
    }

    #[test]
    fn test_lookup_syntax_error() {
        let mapper = build(&["1.2.3.4"]);
        for bad in ["", "10.0.0", "10.0.0.1/32", "localhost", " 10.0.0.1"] {
            assert_eq!(
                mapper.find_external_ip(bad),
                Err(MapperError::InvalidMappingSyntax(SyntaxError::InvalidAddress(
                    bad.to_owned()
                )))
            );
        }
    }

    #[test]
    fn test_from_mappings() {
        let mappings = [
            NatMapping::map_all(ip("1.2.3.4")),
            NatMapping::pair(ip("2001:db8::1"), ip("fd00::1")).unwrap(),
        ];
        let mapper = ExternalIpMapper::from_mappings(CandidateType::Host, mappings)
            .unwrap()
            .unwrap();
        assert_eq!(mapper, build(&["1.2.3.4", "2001:db8::1/fd00::1"]));

        // Hand-built entries mixing families are rejected as well
        let mixed = NatMapping::Pair {
            external: ip("1.2.3.4"),
            local: ip("fd00::1"),
        };
        let err = ExternalIpMapper::from_mappings(CandidateType::Host, [mixed]).unwrap_err();
        assert!(err.is_syntax());
    }

    #[test]
    fn test_advertise() {
        let mapper = build(&["1.2.3.4/10.0.0.1"]);
        assert_eq!(
            mapper.advertise(ip("10.0.0.1")),
            Ok(Advertisement {
                address: ip("1.2.3.4"),
                candidate_type: CandidateType::Host,
                related_address: None,
            })
        );
        assert!(mapper.advertise(ip("10.0.0.2")).is_err());

        let mapper = ExternalIpMapper::new(CandidateType::ServerReflexive, &["1.2.3.4"])
            .unwrap()
            .unwrap();
        assert_eq!(
            mapper.advertise(ip("10.0.0.2")),
            Ok(Advertisement {
                address: ip("1.2.3.4"),
                candidate_type: CandidateType::ServerReflexive,
                related_address: Some(ip("10.0.0.2")),
            })
        );
    }

    #[test]
    fn test_concurrent_lookups() {
        let mapper = build(&["1.2.3.4/10.0.0.1", "2001:db8::1"]);
        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..100 {
                        assert_eq!(mapper.find_external_ip("10.0.0.1"), Ok(ip("1.2.3.4")));
                        assert_eq!(mapper.find_external_ip("fd00::9"), Ok(ip("2001:db8::1")));
                    }
                });
            }
        });
    }

    #[test]
    #[traced_test]
    fn test_logs() {
        let mapper = build(&["1.2.3.4/10.0.0.1"]);
        assert!(logs_contain("IPv4 mapping: 10.0.0.1 -> 1.2.3.4"));
        assert!(logs_contain("NAT 1:1 mapper ready: 1 IPv4 and 0 IPv6 entries"));
        let _ = mapper.find_external_ip("10.0.0.2");
        assert!(logs_contain("External mapped address not found for 10.0.0.2"));
    }

    #[test]
    fn test_map_all_resolves_any_local() {
        bolero::check!()
            .with_generator((
                bolero::generator::produce::<Ipv4Addr>(),
                bolero::generator::produce::<Ipv6Addr>(),
                bolero::generator::produce::<Ipv4Addr>(),
            ))
            .for_each(|(ext4, ext6, local)| {
                // An IPv4-mapped address would be a second IPv4 map-all entry
                if ext6.to_ipv4_mapped().is_some() {
                    return;
                }
                let mapper = build(&[ext4.to_string().as_str(), ext6.to_string().as_str()]);
                let external = mapper.find_external_addr(IpAddr::V4(*local)).unwrap();
                assert_eq!(external, IpAddr::V4(*ext4));
            });
    }

    #[test]
    fn test_pair_resolves_exact_local_only() {
        bolero::check!()
            .with_generator((
                bolero::generator::produce::<Ipv6Addr>(),
                bolero::generator::produce::<Ipv6Addr>(),
                bolero::generator::produce::<Ipv6Addr>(),
            ))
            .for_each(|(ext, local, other)| {
                let (ext, local, other) = (
                    canonical(IpAddr::V6(*ext)),
                    canonical(IpAddr::V6(*local)),
                    canonical(IpAddr::V6(*other)),
                );
                // IPv4-mapped addresses are IPv4: skip mixed families
                if ext.is_ipv4() != local.is_ipv4() {
                    return;
                }
                let mapper = build(&[format!("{ext}/{local}").as_str()]);
                assert_eq!(mapper.find_external_addr(local), Ok(ext));
                if other != local {
                    let err = mapper.find_external_addr(other).unwrap_err();
                    assert!(err.is_not_found());
                }
            });
    }
}
