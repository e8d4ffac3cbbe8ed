//! ### 7 - Network service
pub mod types;

use atat::atat_derive::AtatCmd;
use types::{EnvironmentMode, OperatorNameFormat};

use super::{HelperCommand, NoResponse};
use crate::config::Config;
use crate::response::ResponseParser;

/// 7.2 Signal quality +CSQ
///
/// Returns the received signal strength indication (<rssi>) and the channel
/// bit error rate (<qual>) from the MT.
///
/// **NOTES:**
/// - SARA-G3 / LEON-G1 always report <qual> as 99.
#[derive(Clone, AtatCmd)]
#[at_cmd("+CSQ", NoResponse, timeout_ms = 10000)]
pub struct GetSignalQuality;

/// 7.6 Display operator name +UDOPN
///
/// Reads the name of the registered network operator in the requested
/// format. The reply is `+UDOPN: <type>,"<name>"`.
#[derive(Clone, AtatCmd)]
#[at_cmd("+UDOPN", NoResponse, timeout_ms = 10000)]
pub struct GetOperatorName {
    #[at_arg(position = 0)]
    pub format: OperatorNameFormat,
}

/// 7.21 Cell environment description +CGED
///
/// One shot dump of the radio environment as multiline information text.
/// The serving cell is listed first, followed by `Neighbour Cell <n>:`
/// sections in mode 5.
#[derive(Clone, AtatCmd)]
#[at_cmd("+CGED", NoResponse, timeout_ms = 10000)]
pub struct GetCellEnvironment {
    #[at_arg(position = 0)]
    pub mode: EnvironmentMode,
}

impl HelperCommand for GetSignalQuality {
    fn parser(&self, _config: &Config) -> ResponseParser {
        ResponseParser::rssi_qual()
    }
}

impl HelperCommand for GetOperatorName {
    fn parser(&self, _config: &Config) -> ResponseParser {
        ResponseParser::command_echo()
    }
}

impl HelperCommand for GetCellEnvironment {
    fn parser(&self, config: &Config) -> ResponseParser {
        let capacity = match self.mode {
            EnvironmentMode::ServingCell => 0,
            EnvironmentMode::ServingCellAndNeighbors => config.neighbor_capacity,
        };
        ResponseParser::cell_environment(capacity)
    }
}
