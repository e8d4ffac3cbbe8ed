//! ### 4 - General Commands
//!
//! Identification queries. All of them answer with bare information text,
//! except `+CCID` which echoes its command name.

use atat::atat_derive::AtatCmd;

use super::{HelperCommand, NoResponse};
use crate::config::Config;
use crate::response::ResponseParser;

/// 4.1 Manufacturer identification +CGMI
///
/// Text string identifying the manufacturer.
#[derive(Clone, AtatCmd)]
#[at_cmd("+CGMI", NoResponse, timeout_ms = 10000)]
pub struct GetManufacturer;

/// 4.3 Model identification +CGMM
///
/// Text string identifying the model identification.
#[derive(Clone, AtatCmd)]
#[at_cmd("+CGMM", NoResponse, timeout_ms = 10000)]
pub struct GetModel;

/// 4.5 Firmware version identification +CGMR
#[derive(Clone, AtatCmd)]
#[at_cmd("+CGMR", NoResponse, timeout_ms = 10000)]
pub struct GetFirmwareVersion;

/// 4.7 IMEI identification +CGSN
///
/// Returns the International Mobile Equipment Identity (IMEI) of the MT.
#[derive(Clone, AtatCmd)]
#[at_cmd("+CGSN", NoResponse, timeout_ms = 10000)]
pub struct GetImei;

/// 4.8 International mobile subscriber identification +CIMI
///
/// Requires a SIM. Fails with `+CME ERROR: SIM not inserted` otherwise.
#[derive(Clone, AtatCmd)]
#[at_cmd("+CIMI", NoResponse, timeout_ms = 10000)]
pub struct GetImsi;

/// 4.9 Identification information I0
///
/// The type number of the module, e.g. `SARA-G350-00S-00`.
#[derive(Clone, AtatCmd)]
#[at_cmd("I0", NoResponse, value_sep = false, timeout_ms = 10000)]
pub struct GetOrderingCode;

/// 4.12 Card identification +CCID
///
/// Returns the ICCID (Integrated Circuit Card ID) of the SIM-card. ICCID is a
/// serial number identifying the SIM.
#[derive(Clone, AtatCmd)]
#[at_cmd("+CCID", NoResponse, timeout_ms = 10000)]
pub struct GetIccid;

macro_rules! plain_string {
    ($($cmd:ty),*) => {
        $(
            impl HelperCommand for $cmd {
                fn parser(&self, _config: &Config) -> ResponseParser {
                    ResponseParser::plain_string()
                }
            }
        )*
    };
}

plain_string!(
    GetManufacturer,
    GetModel,
    GetFirmwareVersion,
    GetImei,
    GetImsi,
    GetOrderingCode
);

impl HelperCommand for GetIccid {
    fn parser(&self, _config: &Config) -> ResponseParser {
        ResponseParser::command_echo()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::encode;
    use crate::response::{ChunkKind, ResponseStatus};
    use embassy_time::Duration;

    #[test]
    fn encodes_identification_queries() {
        assert_eq!(encode(&GetManufacturer).as_str(), "AT+CGMI\r\n");
        assert_eq!(encode(&GetModel).as_str(), "AT+CGMM\r\n");
        assert_eq!(encode(&GetFirmwareVersion).as_str(), "AT+CGMR\r\n");
        assert_eq!(encode(&GetImei).as_str(), "AT+CGSN\r\n");
        assert_eq!(encode(&GetImsi).as_str(), "AT+CIMI\r\n");
        assert_eq!(encode(&GetOrderingCode).as_str(), "ATI0\r\n");
        assert_eq!(encode(&GetIccid).as_str(), "AT+CCID\r\n");
    }

    #[test]
    fn iccid_keeps_echo() {
        let mut parser = GetIccid.parser(&Config::default());
        parser.feed(ChunkKind::Data, b"+CCID: 8939104520000206255\r\n");
        assert_eq!(parser.feed(ChunkKind::Final, b"OK"), ResponseStatus::Ok);
        let ccid = parser.result().unwrap().as_command_echo().unwrap();
        assert_eq!(ccid.as_str(), "8939104520000206255");
    }

    #[test]
    fn identification_uses_plain_strings() {
        let parser = GetImei.parser(&Config::default());
        assert_eq!(parser, ResponseParser::plain_string());
        assert_eq!(GetImei.timeout(), Duration::from_secs(10));
    }
}
