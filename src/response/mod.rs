//! Incremental decoding of modem responses.
//!
//! A [`ResponseParser`] is bound to one issued command. The transport feeds it
//! every chunk of modem output together with its [`ChunkKind`], and the parser
//! accumulates a typed [`ParsedPayload`] until the final result code makes its
//! [`ResponseStatus`] terminal.

mod environment;
mod location;
mod signal;
mod string;

pub use location::LocationFix;
pub use signal::{csq_to_rssi, RssiQual};
pub use string::{CommandEchoString, PlainString, MAX_STRING_LEN};

use crate::cell::EnvironmentSample;
use crate::error::{MalformedChunk, ModemError};
use crate::tokenizer::{self, Line};

/// How the transport classified a chunk of modem output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChunkKind {
    /// Information text belonging to the issued command
    Data,
    /// The final result code: `OK`, `ERROR`, `+CME ERROR: <n>`, ...
    Final,
    /// An unsolicited result code interleaved with the response
    Unsolicited,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ResponseStatus {
    Ok,
    Error,
    #[default]
    Pending,
    Timeout,
}

impl ResponseStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Per-variant accumulation behind [`ResponseParser::feed`].
pub(crate) trait Accumulate {
    /// Consume one line of a data chunk.
    fn data(&mut self, line: &Line<'_>) -> Result<(), MalformedChunk>;

    /// Offer one line of an unsolicited chunk. Returns `Ok(false)` when the
    /// notification does not belong to this response.
    fn unsolicited(&mut self, _line: &Line<'_>) -> Result<bool, MalformedChunk> {
        Ok(false)
    }

    /// Whether everything the command produces has arrived. Only consulted
    /// after the final `OK`.
    fn is_complete(&self) -> bool {
        true
    }

    /// Post-process after the last chunk.
    fn finish(&mut self) {}

    fn clear(&mut self);
}

/// Result of one operation. The variant is chosen by the caller when the
/// command is issued, never inferred from the response text.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParsedPayload {
    PlainString(PlainString),
    CommandEchoString(CommandEchoString),
    RssiQual(RssiQual),
    CellEnvironment(EnvironmentSample),
    Location(LocationFix),
}

impl ParsedPayload {
    pub fn as_plain_string(&self) -> Option<&PlainString> {
        match self {
            Self::PlainString(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_command_echo(&self) -> Option<&CommandEchoString> {
        match self {
            Self::CommandEchoString(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_rssi_qual(&self) -> Option<&RssiQual> {
        match self {
            Self::RssiQual(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_environment(&self) -> Option<&EnvironmentSample> {
        match self {
            Self::CellEnvironment(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_location(&self) -> Option<&LocationFix> {
        match self {
            Self::Location(l) => Some(l),
            _ => None,
        }
    }

    fn accumulator(&mut self) -> &mut dyn Accumulate {
        match self {
            Self::PlainString(s) => s,
            Self::CommandEchoString(s) => s,
            Self::RssiQual(r) => r,
            Self::CellEnvironment(e) => e,
            Self::Location(l) => l,
        }
    }

    fn is_complete(&self) -> bool {
        match self {
            Self::PlainString(s) => s.is_complete(),
            Self::CommandEchoString(s) => s.is_complete(),
            Self::RssiQual(r) => r.is_complete(),
            Self::CellEnvironment(e) => Accumulate::is_complete(e),
            Self::Location(l) => l.is_complete(),
        }
    }
}

/// Decoder for the response to one command.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseParser {
    payload: ParsedPayload,
    status: ResponseStatus,
    modem_error: Option<ModemError>,
    final_ok: bool,
    debug: bool,
}

impl ResponseParser {
    pub fn new(payload: ParsedPayload) -> Self {
        Self {
            payload,
            status: ResponseStatus::Pending,
            modem_error: None,
            final_ok: false,
            debug: false,
        }
    }

    pub fn plain_string() -> Self {
        Self::new(ParsedPayload::PlainString(PlainString::default()))
    }

    pub fn command_echo() -> Self {
        Self::new(ParsedPayload::CommandEchoString(CommandEchoString::default()))
    }

    pub fn rssi_qual() -> Self {
        Self::new(ParsedPayload::RssiQual(RssiQual::default()))
    }

    pub fn cell_environment(neighbor_capacity: usize) -> Self {
        Self::new(ParsedPayload::CellEnvironment(EnvironmentSample::new(
            neighbor_capacity,
        )))
    }

    pub fn location() -> Self {
        Self::new(ParsedPayload::Location(LocationFix::default()))
    }

    pub fn with_debug(mut self, enable: bool) -> Self {
        self.debug = enable;
        self
    }

    /// Toggle the diagnostic trace of every chunk fed to this parser. Has no
    /// effect on the decoded result.
    pub fn set_debug(&mut self, enable: bool) {
        self.debug = enable;
    }

    pub fn status(&self) -> ResponseStatus {
        self.status
    }

    pub fn modem_error(&self) -> Option<ModemError> {
        self.modem_error
    }

    /// The decoded payload, once the status is terminal.
    pub fn result(&self) -> Option<&ParsedPayload> {
        self.status.is_terminal().then_some(&self.payload)
    }

    pub(crate) fn into_payload(self) -> ParsedPayload {
        self.payload
    }

    /// Forget everything accumulated so far, keeping the variant and the
    /// debug setting.
    pub fn reset(&mut self) {
        self.payload.accumulator().clear();
        self.status = ResponseStatus::Pending;
        self.modem_error = None;
        self.final_ok = false;
    }

    pub(crate) fn expire(&mut self) {
        self.reset();
        self.status = ResponseStatus::Timeout;
    }

    pub fn feed(&mut self, kind: ChunkKind, bytes: &[u8]) -> ResponseStatus {
        self.debug_trace(kind, bytes);

        if self.status.is_terminal() {
            return self.status;
        }

        let Ok(text) = core::str::from_utf8(bytes) else {
            self.malformed(MalformedChunk("not UTF-8"));
            return self.status;
        };

        match kind {
            ChunkKind::Final => self.final_result(text),
            ChunkKind::Data => {
                for line in tokenizer::lines(text) {
                    if let Err(e) = self.payload.accumulator().data(&line) {
                        self.malformed(e);
                    }
                }
            }
            ChunkKind::Unsolicited => {
                for line in tokenizer::lines(text) {
                    match self.payload.accumulator().unsolicited(&line) {
                        Ok(true) => {}
                        Ok(false) => trace!("Ignoring unsolicited {}", line.as_str()),
                        Err(e) => self.malformed(e),
                    }
                }
            }
        }

        if self.final_ok && self.payload.is_complete() {
            self.payload.accumulator().finish();
            self.status = ResponseStatus::Ok;
        }

        self.status
    }

    fn final_result(&mut self, text: &str) {
        let Some(line) = tokenizer::lines(text).last() else {
            self.malformed(MalformedChunk("empty final result"));
            return;
        };

        if line.as_str() == "OK" {
            self.final_ok = true;
        } else if let Some(e) = ModemError::from_line(line.as_str()) {
            self.modem_error = Some(e);
            self.status = ResponseStatus::Error;
        } else {
            self.malformed(MalformedChunk("unknown final result"));
        }
    }

    fn malformed(&self, e: MalformedChunk) {
        if self.debug {
            debug!("Malformed chunk: {}", e.0);
        }
    }

    fn debug_trace(&self, kind: ChunkKind, bytes: &[u8]) {
        if !self.debug {
            return;
        }
        match core::str::from_utf8(bytes) {
            Ok(text) => debug!("{:?} {}", kind, text.trim()),
            Err(_) => debug!("{:?} {:?}", kind, bytes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_string_accumulates_until_ok() {
        let mut parser = ResponseParser::plain_string();
        assert_eq!(
            parser.feed(ChunkKind::Data, b"\r\nu-blox\r\n"),
            ResponseStatus::Pending
        );
        assert!(parser.result().is_none());
        assert_eq!(parser.feed(ChunkKind::Final, b"OK\r\n"), ResponseStatus::Ok);

        let payload = parser.result().unwrap();
        assert_eq!(payload.as_plain_string().unwrap().as_str(), "u-blox");
    }

    #[test]
    fn modem_error_is_terminal() {
        let mut parser = ResponseParser::plain_string();
        parser.feed(ChunkKind::Data, b"partial");
        assert_eq!(
            parser.feed(ChunkKind::Final, b"+CME ERROR: 10\r\n"),
            ResponseStatus::Error
        );
        assert_eq!(parser.modem_error(), Some(ModemError::Cme(10)));

        // Nothing changes after the final result
        assert_eq!(parser.feed(ChunkKind::Final, b"OK"), ResponseStatus::Error);
        assert_eq!(
            parser.result().unwrap().as_plain_string().unwrap().as_str(),
            "partial"
        );
    }

    #[test]
    fn malformed_data_is_not_an_error() {
        let mut parser = ResponseParser::rssi_qual().with_debug(true);
        parser.feed(ChunkKind::Data, b"+CSQ: 19,99");
        assert_eq!(
            parser.feed(ChunkKind::Data, b"+CSQ: garbage"),
            ResponseStatus::Pending
        );
        assert_eq!(parser.feed(ChunkKind::Data, &[0xff, 0xfe]), ResponseStatus::Pending);
        assert_eq!(parser.feed(ChunkKind::Final, b"OK"), ResponseStatus::Ok);

        let rssi = parser.result().unwrap().as_rssi_qual().unwrap();
        assert_eq!(rssi.rssi, -75);
        assert_eq!(rssi.qual, 99);
    }

    #[test]
    fn unknown_final_result_keeps_waiting() {
        let mut parser = ResponseParser::plain_string();
        assert_eq!(
            parser.feed(ChunkKind::Final, b"WHATEVER"),
            ResponseStatus::Pending
        );
    }

    #[test]
    fn unsolicited_does_not_touch_state() {
        let mut parser = ResponseParser::plain_string();
        parser.feed(ChunkKind::Data, b"SARA-G350");
        parser.feed(ChunkKind::Unsolicited, b"+CREG: 1");
        parser.feed(ChunkKind::Final, b"OK");
        assert_eq!(
            parser.result().unwrap().as_plain_string().unwrap().as_str(),
            "SARA-G350"
        );
    }

    #[test]
    fn debug_hook_does_not_change_outcome() {
        let chunks: [(ChunkKind, &[u8]); 3] = [
            (ChunkKind::Data, b"+CSQ: 12,3"),
            (ChunkKind::Unsolicited, b"+UUPSDD: 0"),
            (ChunkKind::Final, b"OK"),
        ];

        let mut quiet = ResponseParser::rssi_qual();
        let mut verbose = ResponseParser::rssi_qual();
        verbose.set_debug(true);
        for (kind, bytes) in chunks {
            assert_eq!(quiet.feed(kind, bytes), verbose.feed(kind, bytes));
        }
        assert_eq!(quiet.result(), verbose.result());
    }

    #[test]
    fn reset_keeps_variant() {
        let mut parser = ResponseParser::cell_environment(2);
        parser.feed(ChunkKind::Data, b"+CGED: Service-Cell: MCC:310, MNC:410");
        parser.feed(ChunkKind::Final, b"ERROR");
        parser.reset();

        assert_eq!(parser.status(), ResponseStatus::Pending);
        assert_eq!(parser.modem_error(), None);
        assert_eq!(parser, ResponseParser::cell_environment(2));
    }

    #[test]
    fn expire_discards_partial_state() {
        let mut parser = ResponseParser::plain_string();
        parser.feed(ChunkKind::Data, b"half a");
        parser.expire();
        assert_eq!(parser.status(), ResponseStatus::Timeout);
        assert_eq!(
            parser.result().unwrap().as_plain_string().unwrap().as_str(),
            ""
        );
    }
}
