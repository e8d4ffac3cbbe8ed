//! ### 28 - Positioning
pub mod types;

use atat::atat_derive::AtatCmd;
use embassy_time::Duration;
use types::{LocationMode, LocationResponseType, LocationSensor};

use super::{HelperCommand, NoResponse};
use crate::config::Config;
use crate::response::ResponseParser;

/// Time allowed for the `+UULOC` URC on top of the module side timeout.
const URC_GRACE: Duration = Duration::from_secs(5);

/// 28.5 Ask for localization information +ULOC
///
/// The module answers `OK` right away and reports the fix later with the
/// `+UULOC` URC, or an error URC if no fix was found within `timeout`.
#[derive(Clone, AtatCmd)]
#[at_cmd("+ULOC", NoResponse, timeout_ms = 10000)]
pub struct GetLocation {
    #[at_arg(position = 0)]
    pub mode: LocationMode,
    #[at_arg(position = 1)]
    pub sensor: LocationSensor,
    #[at_arg(position = 2)]
    pub response_type: LocationResponseType,
    /// Seconds the module may spend on the fix, 1-999
    #[at_arg(position = 3)]
    pub timeout: u16,
    /// Target accuracy in metres
    #[at_arg(position = 4)]
    pub accuracy: u32,
}

impl GetLocation {
    /// Single shot CellLocate® fix with the standard response type.
    pub fn cell_locate(timeout: Duration) -> Self {
        let secs = timeout.as_secs().clamp(1, 999) as u16;
        Self {
            mode: LocationMode::SingleShot,
            sensor: LocationSensor::CellLocate,
            response_type: LocationResponseType::Standard,
            timeout: secs,
            accuracy: 1,
        }
    }
}

impl HelperCommand for GetLocation {
    fn parser(&self, _config: &Config) -> ResponseParser {
        ResponseParser::location()
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.timeout)) + URC_GRACE
    }
}
