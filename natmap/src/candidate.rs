// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! ICE candidate types

use strum::{Display, EnumString};

/// The type of an ICE candidate.
///
/// The textual form is the short name used in SDP (`host`, `srflx`, `prflx`, `relay`). Long names
/// (`server-reflexive`, `peer-reflexive`) are also accepted when parsing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString)]
pub enum CandidateType {
    /// No type requested; treated as [`CandidateType::Host`] by the mapper.
    #[default]
    #[strum(to_string = "unspecified")]
    Unspecified,
    /// Address directly bound on a local interface
    #[strum(to_string = "host")]
    Host,
    /// Address observed from outside a NAT
    #[strum(to_string = "srflx", serialize = "server-reflexive")]
    ServerReflexive,
    /// Address learnt from a peer during connectivity checks
    #[strum(to_string = "prflx", serialize = "peer-reflexive")]
    PeerReflexive,
    /// Address allocated on a TURN relay
    #[strum(to_string = "relay")]
    Relay,
}
