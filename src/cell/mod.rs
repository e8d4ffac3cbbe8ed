//! Serving and neighbour cell data reported by `AT+CGED`.

pub mod decode;
mod sample;

use core::fmt;
use serde::Serialize;

pub use decode::{rssi_to_bars, Band};
pub use sample::{Cursor, EnvironmentSample, MAX_NEIGHBOR_CELLS};

use crate::error::MalformedChunk;
use crate::tokenizer::{dec, hex, unquote};

/// Characteristics of one cell, serving or neighbour.
///
/// Fields that were never reported, or do not apply to the cell's radio
/// access technology, hold their `*_NOT_AVAILABLE` value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CellObservation {
    /// Mobile Country Code, 0-999
    pub mcc: u16,
    /// Mobile Network Code, 0-999
    pub mnc: u16,
    /// Location Area Code, 0h-FFFFh
    pub lac: u16,
    /// Cell Identity: 0h-FFFFh for 2G cells, 0h-FFFFFFFh for 3G cells
    pub ci: u32,
    /// Base Station Identity Code, 0h-3Fh [2G]
    pub bsic: u8,
    /// Absolute Radio Frequency Channel Number [2G]. Bit 15 is the PCS 1900
    /// band indicator, see [`decode::gsm_channel`].
    pub arfcn: u16,
    /// Received signal level, 0-63 [2G]
    pub rxlev: u8,
    /// The cell is UMTS (3G) rather than GSM (2G)
    pub is_umts: bool,
    /// Downlink frequency, 0-16383 [3G]
    pub dlf: u16,
    /// Uplink frequency, 0-16383 [3G]
    pub ulf: u16,
    /// Received signal code power level, 0-91 [3G]
    pub rscp_level: u8,
    /// Filled in when the sample is finalized
    pub summary: Option<CellSummary>,
}

/// Decoded view of a [`CellObservation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CellSummary {
    pub valid: bool,
    pub band: Band,
    pub channel: Option<u16>,
    pub rssi: Option<i32>,
    pub bars: u8,
}

impl Default for CellObservation {
    fn default() -> Self {
        Self {
            mcc: Self::MCC_NOT_AVAILABLE,
            mnc: Self::MNC_NOT_AVAILABLE,
            lac: Self::LAC_NOT_AVAILABLE,
            ci: 0,
            bsic: Self::BSIC_NOT_AVAILABLE,
            arfcn: Self::ARFCN_NOT_AVAILABLE,
            rxlev: Self::RXLEV_NOT_AVAILABLE,
            is_umts: false,
            dlf: Self::FREQUENCY_NOT_AVAILABLE,
            ulf: Self::FREQUENCY_NOT_AVAILABLE,
            rscp_level: Self::RSCP_LEVEL_NOT_AVAILABLE,
            summary: None,
        }
    }
}

impl CellObservation {
    pub const MCC_NOT_AVAILABLE: u16 = u16::MAX;
    pub const MNC_NOT_AVAILABLE: u16 = u16::MAX;
    pub const LAC_NOT_AVAILABLE: u16 = u16::MAX;
    pub const BSIC_NOT_AVAILABLE: u8 = u8::MAX;
    pub const ARFCN_NOT_AVAILABLE: u16 = u16::MAX;
    pub const RXLEV_NOT_AVAILABLE: u8 = u8::MAX;
    pub const FREQUENCY_NOT_AVAILABLE: u16 = u16::MAX;
    pub const RSCP_LEVEL_NOT_AVAILABLE: u8 = u8::MAX;

    /// A cell is valid when MCC and MNC are in range and, unless `ignore_ci`
    /// is set, the cell identity is non-zero. Some firmware omits `CI` for the
    /// serving cell.
    pub fn is_valid(&self, ignore_ci: bool) -> bool {
        self.mcc <= 999 && self.mnc <= 999 && (ignore_ci || self.ci != 0)
    }

    pub fn band(&self) -> Band {
        if self.is_umts {
            decode::umts_band(self.dlf)
        } else {
            decode::gsm_band(self.arfcn)
        }
    }

    /// Channel number with any band indicator removed: ARFCN for 2G cells,
    /// downlink UARFCN for 3G cells.
    pub fn channel(&self) -> Option<u16> {
        if self.is_umts {
            (self.dlf != Self::FREQUENCY_NOT_AVAILABLE).then_some(self.dlf)
        } else {
            (self.arfcn != Self::ARFCN_NOT_AVAILABLE).then(|| decode::gsm_channel(self.arfcn).0)
        }
    }

    /// Approximate RSSI in dBm.
    pub fn rssi(&self) -> Option<i32> {
        if self.is_umts {
            decode::rscp_to_rssi(self.rscp_level)
        } else {
            decode::rxlev_to_rssi(self.rxlev)
        }
    }

    /// Signal bars, 0 when no signal level was reported.
    pub fn bars(&self) -> u8 {
        self.rssi().map_or(0, rssi_to_bars)
    }

    pub fn summarize(&self) -> CellSummary {
        CellSummary {
            valid: self.is_valid(false),
            band: self.band(),
            channel: self.channel(),
            rssi: self.rssi(),
            bars: self.bars(),
        }
    }

    /// Apply one `key:value` pair. Unknown keys are ignored; a known key with
    /// an unparsable value leaves the field untouched.
    pub fn assign(&mut self, key: &str, value: &str) -> Result<(), MalformedChunk> {
        let key = key.trim();
        let is = |name: &str| key.eq_ignore_ascii_case(name);

        if is("RAT") {
            let rat = unquote(value);
            self.is_umts = rat
                .as_bytes()
                .windows(4)
                .any(|w| w.eq_ignore_ascii_case(b"UMTS"));
        } else if is("MCC") {
            self.mcc = dec(value).ok_or(MalformedChunk("MCC"))?;
        } else if is("MNC") {
            self.mnc = dec(value).ok_or(MalformedChunk("MNC"))?;
        } else if is("LAC") {
            self.lac = narrow(hex(value)).ok_or(MalformedChunk("LAC"))?;
        } else if is("CI") {
            self.ci = hex(value).ok_or(MalformedChunk("CI"))?;
        } else if is("BSIC") {
            self.bsic = narrow(hex(value)).ok_or(MalformedChunk("BSIC"))?;
        } else if is("Arfcn") {
            // Documented as hex, but the modules report it in decimal
            self.arfcn = dec(value).ok_or(MalformedChunk("Arfcn"))?;
        } else if is("RxLev") || is("RxLevServ") {
            self.rxlev = dec(value).ok_or(MalformedChunk("RxLev"))?;
        } else if is("DLF") {
            self.dlf = dec(value).ok_or(MalformedChunk("DLF"))?;
        } else if is("ULF") {
            self.ulf = dec(value).ok_or(MalformedChunk("ULF"))?;
        } else if is("RSCP LEV") || is("RSCP_LEV") {
            self.rscp_level = dec(value).ok_or(MalformedChunk("RSCP LEV"))?;
        }

        Ok(())
    }
}

fn narrow<T: TryFrom<u32>>(value: Option<u32>) -> Option<T> {
    value.and_then(|v| T::try_from(v).ok())
}

impl fmt::Display for CellObservation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "mcc={},mnc={},lac={:x},ci={:x}",
            self.mcc, self.mnc, self.lac, self.ci
        )?;
        if self.is_umts {
            write!(
                f,
                ",dlf={},ulf={},rscpLev={}",
                self.dlf, self.ulf, self.rscp_level
            )
        } else {
            write!(
                f,
                ",bsic={:x},arfcn={},rxlev={}",
                self.bsic, self.arfcn, self.rxlev
            )
        }
    }
}
