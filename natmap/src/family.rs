// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! IP address validation and address family classification

use crate::errors::SyntaxError;
use std::fmt::{Debug, Display};
use std::hash::Hash;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

mod private {
    pub trait Sealed {}
    impl Sealed for std::net::Ipv4Addr {}
    impl Sealed for std::net::Ipv6Addr {}
}

/// An IP address type for a single address family.
///
/// Only implemented for [`Ipv4Addr`] and [`Ipv6Addr`].
pub trait AddressFamily:
    private::Sealed + Copy + Eq + Hash + Debug + Display + Into<IpAddr> + Send + Sync + 'static
{
    /// Human-readable family name, for logs and errors
    const NAME: &'static str;
}

impl AddressFamily for Ipv4Addr {
    const NAME: &'static str = "IPv4";
}

impl AddressFamily for Ipv6Addr {
    const NAME: &'static str = "IPv6";
}

/// Returns the canonical form of an address.
///
/// IPv4-mapped IPv6 addresses (`::ffff:a.b.c.d`) belong to the IPv4 family.
#[must_use]
pub fn canonical(addr: IpAddr) -> IpAddr {
    addr.to_canonical()
}

/// Parses a literal IP address and returns it in canonical form.
///
/// The family of the address is given by the [`IpAddr`] variant. Two textual forms of the same
/// address produce equal values. No name resolution is attempted.
///
/// # Errors
///
/// Returns [`SyntaxError::InvalidAddress`] if `text` is not a valid IPv4 or IPv6 literal.
pub fn validate_ip(text: &str) -> Result<IpAddr, SyntaxError> {
    IpAddr::from_str(text)
        .map(canonical)
        .map_err(|_| SyntaxError::InvalidAddress(text.to_owned()))
}

/// Name of the family of `addr`
#[must_use]
pub fn family_name(addr: &IpAddr) -> &'static str {
    match addr {
        IpAddr::V4(_) => Ipv4Addr::NAME,
        IpAddr::V6(_) => Ipv6Addr::NAME,
    }
}
