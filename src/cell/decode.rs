//! Conversions from raw `+CGED` radio parameters into bands and signal
//! strength.

use core::fmt;
use serde::Serialize;

/// Set in `<arfcn>` when a DCS channel number actually belongs to PCS 1900.
pub const ARFCN_BAND_INDICATOR: u16 = 0x8000;

/// Highest value of a 2G `<RxLev>`, per 3GPP TS 05.08.
pub const RXLEV_MAX: u8 = 63;

/// Highest value of a 3G `<RSCP LEV>`, per 3GPP TS 25.133.
pub const RSCP_LEV_MAX: u8 = 91;

const RXLEV_OFFSET_DBM: i32 = -111;
const RSCP_OFFSET_DBM: i32 = -121;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Band {
    Gsm850,
    Gsm900,
    Dcs1800,
    Pcs1900,
    Umts850,
    Umts900,
    Umts1700,
    Umts1800,
    Umts1900,
    Umts2100,
    #[default]
    Unknown,
}

impl Band {
    /// Nominal band frequency in MHz.
    pub fn mhz(&self) -> Option<u16> {
        match self {
            Self::Gsm850 | Self::Umts850 => Some(850),
            Self::Gsm900 | Self::Umts900 => Some(900),
            Self::Umts1700 => Some(1700),
            Self::Dcs1800 | Self::Umts1800 => Some(1800),
            Self::Pcs1900 | Self::Umts1900 => Some(1900),
            Self::Umts2100 => Some(2100),
            Self::Unknown => None,
        }
    }

    pub fn is_umts(&self) -> bool {
        matches!(
            self,
            Self::Umts850
                | Self::Umts900
                | Self::Umts1700
                | Self::Umts1800
                | Self::Umts1900
                | Self::Umts2100
        )
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Gsm850 => "GSM 850",
            Self::Gsm900 => "GSM 900",
            Self::Dcs1800 => "DCS 1800",
            Self::Pcs1900 => "PCS 1900",
            Self::Umts850 => "UMTS 850",
            Self::Umts900 => "UMTS 900",
            Self::Umts1700 => "UMTS 1700",
            Self::Umts1800 => "UMTS 1800",
            Self::Umts1900 => "UMTS 1900",
            Self::Umts2100 => "UMTS 2100",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Split a raw `<arfcn>` into its channel number and band indicator.
///
/// `33485` (`0x82CD`) is channel `0x2CD` (717) with the indicator set.
pub fn gsm_channel(arfcn: u16) -> (u16, bool) {
    (
        arfcn & !ARFCN_BAND_INDICATOR,
        arfcn & ARFCN_BAND_INDICATOR != 0,
    )
}

/// Classify a 2G cell by its raw `<arfcn>`.
pub fn gsm_band(arfcn: u16) -> Band {
    match gsm_channel(arfcn) {
        (512..=810, true) => Band::Pcs1900,
        (_, true) => Band::Unknown,
        // P-GSM, plus channel 0 and 975-1023 of E-GSM
        (0..=124, false) | (975..=1023, false) => Band::Gsm900,
        (128..=251, false) => Band::Gsm850,
        (512..=885, false) => Band::Dcs1800,
        _ => Band::Unknown,
    }
}

/// Classify a 3G cell by its downlink UARFCN.
pub fn umts_band(dlf: u16) -> Band {
    match dlf {
        10562..=10838 => Band::Umts2100,
        9662..=9938 => Band::Umts1900,
        1162..=1513 => Band::Umts1800,
        1537..=1738 => Band::Umts1700,
        4357..=4458 => Band::Umts850,
        2937..=3088 => Band::Umts900,
        _ => Band::Unknown,
    }
}

/// Approximate RSSI of a 2G cell, `rxlev - 111` dBm.
pub fn rxlev_to_rssi(rxlev: u8) -> Option<i32> {
    (rxlev <= RXLEV_MAX).then(|| i32::from(rxlev) + RXLEV_OFFSET_DBM)
}

/// Approximate RSSI of a 3G cell from its RSCP level, `rscp - 121` dBm.
pub fn rscp_to_rssi(rscp_level: u8) -> Option<i32> {
    (rscp_level <= RSCP_LEV_MAX).then(|| i32::from(rscp_level) + RSCP_OFFSET_DBM)
}

/// Map an RSSI in dBm onto 0-5 bars.
pub fn rssi_to_bars(rssi: i32) -> u8 {
    match rssi {
        i32::MIN..=-104 => 0,
        -103..=-92 => 1,
        -91..=-80 => 2,
        -79..=-68 => 3,
        -67..=-58 => 4,
        _ => 5,
    }
}
