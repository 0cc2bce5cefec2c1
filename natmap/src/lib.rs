// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

#![deny(clippy::all, clippy::pedantic)]
#![deny(rustdoc::all)]

//! Static NAT 1:1 address mapping for ICE candidates
//!
//! Hosts behind a static NAT (for example, a cloud instance with a fixed public IP) cannot learn
//! their external address from their interfaces. This package lets operators configure it, as a
//! list of entries of the form `EXTERNAL` (all local addresses of the same IP version map to
//! `EXTERNAL`) or `EXTERNAL/LOCAL` (`LOCAL` maps to `EXTERNAL`). The resulting
//! [`ExternalIpMapper`] tells the candidate gatherer which address to advertise for each local
//! address.
//!
//! # Example
//!
//! ```
//! use ice_natmap::{CandidateType, ExternalIpMapper};
//! use std::net::IpAddr;
//!
//! let mapper = ExternalIpMapper::new(
//!     CandidateType::Host,
//!     &["203.0.113.10/10.0.0.1", "203.0.113.11/10.0.0.2"],
//! )
//! .expect("Invalid mappings")
//! .expect("No mapping configured");
//!
//! let external = mapper.find_external_ip("10.0.0.2").unwrap();
//! assert_eq!(external, "203.0.113.11".parse::<IpAddr>().unwrap());
//! assert!(mapper.find_external_ip("10.0.0.3").is_err());
//! ```
//!
//! # Limitations
//!
//! - For a given IP version, either all local addresses are mapped to one external address, or
//!   local addresses are mapped one by one. Mixing both is rejected, as is mapping the same local
//!   address twice.
//! - Only literal addresses are accepted, no host names, prefixes or zone identifiers.
//! - Mappings are static: changing them means building a new [`ExternalIpMapper`].

mod candidate;
pub mod errors;
pub mod family;
mod mapper;
mod mapping;
pub mod table;

pub use candidate::CandidateType;
pub use errors::MapperError;
pub use mapper::{Advertisement, ExternalIpMapper};
pub use mapping::{MAPPING_SEPARATOR, NatMapping};
