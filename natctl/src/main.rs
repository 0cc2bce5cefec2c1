// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

#![deny(clippy::all, clippy::pedantic)]
#![deny(rustdoc::all)]
#![allow(rustdoc::missing_crate_level_docs)]

mod args;

use crate::args::{CmdArgs, Parser};
use color_eyre::eyre::{Result, WrapErr, eyre};
use natmap::family::validate_ip;
use natmap::{CandidateType, ExternalIpMapper, MapperError};
use std::fmt::Write;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

fn init_logging(filter: Option<&str>) -> Result<()> {
    let filter = match filter {
        Some(filter) => EnvFilter::try_new(filter).wrap_err("Invalid tracing filter")?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

/// Describes the candidate advertised for `local`.
///
/// Without a mapper, local addresses are advertised unchanged as host candidates.
fn describe(mapper: Option<&ExternalIpMapper>, local: &str) -> Result<String, MapperError> {
    let local = validate_ip(local)?;
    let Some(mapper) = mapper else {
        return Ok(format!("{local} -> {local} ({})", CandidateType::Host));
    };
    let adv = mapper.advertise(local)?;
    let mut out = format!("{local} -> {} ({}", adv.address, adv.candidate_type);
    if let Some(related) = adv.related_address {
        let _ = write!(out, ", related {related}");
    }
    out.push(')');
    Ok(out)
}

/// Dumps the mapping tables, one entry per line, sorted by local address.
fn dump_tables(mapper: &ExternalIpMapper) -> String {
    let mut out = format!("candidate type: {}\n", mapper.candidate_type());
    if let Some(external) = mapper.ipv4_table().map_all() {
        let _ = writeln!(out, "IPv4 * -> {external}");
    }
    let mut pairs: Vec<_> = mapper.ipv4_table().pairs().collect();
    pairs.sort();
    for (local, external) in pairs {
        let _ = writeln!(out, "IPv4 {local} -> {external}");
    }
    if let Some(external) = mapper.ipv6_table().map_all() {
        let _ = writeln!(out, "IPv6 * -> {external}");
    }
    let mut pairs: Vec<_> = mapper.ipv6_table().pairs().collect();
    pairs.sort();
    for (local, external) in pairs {
        let _ = writeln!(out, "IPv6 {local} -> {external}");
    }
    out
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = CmdArgs::parse();
    init_logging(args.log_level())?;

    let mapper = ExternalIpMapper::new(args.candidate_type(), args.mappings())
        .wrap_err("Invalid NAT 1:1 configuration")?;
    match &mapper {
        Some(_) => debug!("Loaded {} mapping entries", args.mappings().len()),
        None => info!("No NAT 1:1 mapping configured, local addresses are advertised unchanged"),
    }

    if args.show()
        && let Some(mapper) = &mapper
    {
        print!("{}", dump_tables(mapper));
    }

    let mut failed = 0;
    for local in args.addresses() {
        match describe(mapper.as_ref(), local) {
            Ok(line) => println!("{line}"),
            Err(e) => {
                warn!("Skipping {local}: {e}");
                failed += 1;
            }
        }
    }
    if failed > 0 {
        return Err(eyre!("{failed} address(es) could not be mapped"));
    }
    Ok(())
}
