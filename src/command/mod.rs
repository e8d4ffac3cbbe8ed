//! AT commands issued by the helper\
//! Following the [u-blox cellular modules AT commands manual](https://www.u-blox.com/sites/default/files/u-blox-CEL_ATCommands_%28UBX-13002752%29.pdf)
//!
//! Only request encoding is derived. Responses arrive as raw chunks and are
//! decoded by the [`ResponseParser`] each command selects through
//! [`HelperCommand`].

pub mod dns;
pub mod general;
pub mod network_service;
pub mod positioning;

use atat::atat_derive::AtatResp;
use atat::AtatCmd;
use embassy_time::Duration;

use crate::config::Config;
use crate::response::ResponseParser;

/// Placeholder response type. The information text of every helper command
/// is decoded by a [`ResponseParser`] instead.
#[derive(Clone, AtatResp)]
pub struct NoResponse;

/// An AT command together with the parser that decodes its reply.
pub trait HelperCommand: AtatCmd {
    /// A fresh parser of the variant this command's reply needs.
    fn parser(&self, config: &Config) -> ResponseParser;

    fn timeout(&self) -> Duration {
        Duration::from_millis(u64::from(Self::MAX_TIMEOUT_MS))
    }
}

#[cfg(test)]
pub(crate) fn encode<C: AtatCmd>(cmd: &C) -> heapless::String<64> {
    let mut buf = [0u8; 64];
    let len = cmd.write(&mut buf);
    let mut s = heapless::String::new();
    s.push_str(core::str::from_utf8(&buf[..len]).unwrap()).unwrap();
    s
}
