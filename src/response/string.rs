use core::ops::Deref;

use heapless::String;
use no_std_net::Ipv4Addr;
use serde::Serialize;

use super::Accumulate;
use crate::error::MalformedChunk;
use crate::tokenizer::{self, Line};

/// Longest string a response can accumulate. Anything beyond is dropped.
pub const MAX_STRING_LEN: usize = 256;

const MAX_COMMAND_LEN: usize = 16;

fn append<const N: usize>(dst: &mut String<N>, src: &str) {
    for c in src.chars() {
        if dst.push(c).is_err() {
            warn!("Response longer than {} bytes, truncating", N);
            break;
        }
    }
}

/// Information text without a command echo, e.g. the reply to `AT+CGMI`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PlainString {
    string: String<MAX_STRING_LEN>,
}

impl PlainString {
    pub fn as_str(&self) -> &str {
        &self.string
    }
}

impl Deref for PlainString {
    type Target = str;

    fn deref(&self) -> &str {
        self.as_str()
    }
}

impl Accumulate for PlainString {
    fn data(&mut self, line: &Line<'_>) -> Result<(), MalformedChunk> {
        append(&mut self.string, line.as_str());
        Ok(())
    }

    fn clear(&mut self) {
        self.string.clear();
    }
}

/// Information text of the form `+<CMD>: <value>`, e.g. `+CCID: 8901...`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CommandEchoString {
    command: String<MAX_COMMAND_LEN>,
    string: String<MAX_STRING_LEN>,
}

impl CommandEchoString {
    /// Command label without `+` and `:`, e.g. `CCID`.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Everything that followed the `+<CMD>:` prefix.
    pub fn as_str(&self) -> &str {
        &self.string
    }

    /// The first double quoted part of the value.
    ///
    /// `+UDOPN: 9,"AT&T"` gives `AT&T`.
    pub fn double_quoted_part(&self) -> Option<&str> {
        self.quoted_part(0)
    }

    /// The `n`th double quoted part of the value, counting from zero.
    pub fn quoted_part(&self, n: usize) -> Option<&str> {
        tokenizer::quoted(&self.string).nth(n)
    }

    /// Decode a `+UDNSRN` style reply carrying a dotted quad.
    pub fn ipv4_address(&self) -> Option<Ipv4Addr> {
        self.double_quoted_part()
            .unwrap_or(self.as_str())
            .trim()
            .parse()
            .ok()
    }
}

impl Accumulate for CommandEchoString {
    fn data(&mut self, line: &Line<'_>) -> Result<(), MalformedChunk> {
        let label = line.label().ok_or(MalformedChunk("missing +CMD: prefix"))?;

        if self.command.is_empty() {
            append(&mut self.command, label);
        } else if self.command != label {
            return Err(MalformedChunk("unexpected command label"));
        }

        append(&mut self.string, line.body());
        Ok(())
    }

    fn clear(&mut self) {
        self.command.clear();
        self.string.clear();
    }
}
