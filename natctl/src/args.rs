// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

pub use clap::Parser;
use natmap::CandidateType;
use std::str::FromStr;

#[derive(Parser, Debug)]
#[command(name = "natctl")]
#[command(version)]
#[command(
    about = "Resolve the addresses advertised in ICE candidates behind a static NAT 1:1",
    long_about = None
)]
pub struct CmdArgs {
    #[arg(
        long,
        value_name = "host|srflx",
        default_value_t = CandidateType::Unspecified,
        value_parser = CandidateType::from_str,
        help = "type of the candidates advertised with mapped addresses"
    )]
    candidate_type: CandidateType,

    #[arg(
        long = "mapping",
        value_name = "EXTERNAL[/LOCAL]",
        help = "static NAT 1:1 mapping, may be repeated; order matters"
    )]
    mappings: Vec<String>,

    #[arg(long, value_name = "filter", help = "tracing filter, overrides RUST_LOG")]
    log_level: Option<String>,

    #[arg(long, help = "print the mapping tables")]
    show: bool,

    #[arg(value_name = "LOCAL_ADDRESS", help = "local addresses to resolve")]
    addresses: Vec<String>,
}

impl CmdArgs {
    pub fn candidate_type(&self) -> CandidateType {
        self.candidate_type
    }
    pub fn mappings(&self) -> &[String] {
        &self.mappings
    }
    pub fn log_level(&self) -> Option<&str> {
        self.log_level.as_deref()
    }
    pub fn show(&self) -> bool {
        self.show
    }
    pub fn addresses(&self) -> &[String] {
        &self.addresses
    }
}
