use serde::Serialize;

use super::Accumulate;
use crate::cell::rssi_to_bars;
use crate::error::MalformedChunk;
use crate::tokenizer::{dec, Line};

/// `<rssi>` index meaning "not known or not detectable".
pub const CSQ_NOT_KNOWN: u8 = 99;

/// Map a `+CSQ` `<rssi>` index onto dBm.
///
/// - 0: -113 dBm or less
/// - 1: -111 dBm
/// - 2..30: -109 to -53 dBm in 2 dBm steps
/// - 31: -51 dBm or greater
/// - 99: not known
pub fn csq_to_rssi(index: u8) -> Option<i32> {
    (index <= 31).then(|| -113 + 2 * i32::from(index))
}

/// Reply to `AT+CSQ`.
///
/// 2G modules never report `<qual>` and always give 99 for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RssiQual {
    /// RSSI in dBm, or [`RssiQual::RSSI_UNKNOWN`]
    pub rssi: i32,
    /// Raw `<qual>` index, 0-7, or 99 when not known
    pub qual: i32,
}

impl Default for RssiQual {
    fn default() -> Self {
        Self {
            rssi: Self::RSSI_UNKNOWN,
            qual: 0,
        }
    }
}

impl RssiQual {
    /// Real readings are always negative.
    pub const RSSI_UNKNOWN: i32 = 0;
    pub const QUAL_UNKNOWN: i32 = 99;

    pub fn rssi_dbm(&self) -> Option<i32> {
        (self.rssi != Self::RSSI_UNKNOWN).then_some(self.rssi)
    }

    pub fn bars(&self) -> u8 {
        self.rssi_dbm().map_or(0, rssi_to_bars)
    }
}

impl Accumulate for RssiQual {
    fn data(&mut self, line: &Line<'_>) -> Result<(), MalformedChunk> {
        if line.label().is_some_and(|l| l != "CSQ") {
            return Err(MalformedChunk("unexpected command label"));
        }

        let index: u8 = line
            .field(0)
            .and_then(dec)
            .ok_or(MalformedChunk("<rssi>"))?;
        let qual: i32 = line
            .field(1)
            .and_then(dec)
            .ok_or(MalformedChunk("<qual>"))?;

        self.rssi = csq_to_rssi(index).unwrap_or(Self::RSSI_UNKNOWN);
        self.qual = if index == CSQ_NOT_KNOWN {
            Self::QUAL_UNKNOWN
        } else {
            qual
        };
        Ok(())
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}
