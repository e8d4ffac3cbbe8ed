//! ### 24 - DNS
//!
//! DNS service requires the user to define and activate a connection profile,
//! either PSD or CSD.
pub mod types;

use atat::atat_derive::AtatCmd;
use types::ResolutionType;

use super::{HelperCommand, NoResponse};
use crate::config::Config;
use crate::response::ResponseParser;

/// 24.1 Resolve name / IP number through DNS +UDNSRN
///
/// Translates a domain name to an IP address or an IP address to a domain name
/// by using an available DNS. The reply is `+UDNSRN: "<resolved>"`, see
/// [`CommandEchoString::ipv4_address`](crate::response::CommandEchoString::ipv4_address).
#[derive(Clone, AtatCmd)]
#[at_cmd("+UDNSRN", NoResponse, timeout_ms = 120000)]
pub struct ResolveHostname<'a> {
    #[at_arg(position = 0)]
    pub resolution_type: ResolutionType,
    #[at_arg(position = 1, len = 128)]
    pub host: &'a str,
}

impl<'a> ResolveHostname<'a> {
    pub fn domain(host: &'a str) -> Self {
        Self {
            resolution_type: ResolutionType::DomainToIp,
            host,
        }
    }
}

impl HelperCommand for ResolveHostname<'_> {
    fn parser(&self, _config: &Config) -> ResponseParser {
        ResponseParser::command_echo()
    }
}
