//! Argument types used by Network service Commands
use atat::atat_derive::AtatEnum;

/// Name format requested from `+UDOPN`
#[derive(Debug, Clone, Copy, PartialEq, Eq, AtatEnum)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OperatorNameFormat {
    /// • 0: numeric format of MCC/MNC network
    Numeric = 0,
    /// • 1: short name in ROM
    ShortRom = 1,
    /// • 2: long name in ROM
    LongRom = 2,
    /// • 3: short network operator name (CPHS)
    ShortCphs = 3,
    /// • 4: long network operator name (CPHS)
    LongCphs = 4,
    /// • 5: short NITZ name
    ShortNitz = 5,
    /// • 6: full NITZ name
    LongNitz = 6,
    /// • 7: service provider name
    ServiceProvider = 7,
    /// • 8: EONS short operator name
    ShortEons = 8,
    /// • 9 (default): EONS long operator name
    LongEons = 9,
    /// • 11: short network operator name
    ShortNetworkOperator = 11,
    /// • 12: long network operator name
    LongNetworkOperator = 12,
}

impl Default for OperatorNameFormat {
    fn default() -> Self {
        Self::LongEons
    }
}

/// `+CGED` reporting mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, AtatEnum)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EnvironmentMode {
    /// • 3: one shot dump of the serving cell
    ServingCell = 3,
    /// • 5: one shot dump of the serving cell and its neighbours
    ServingCellAndNeighbors = 5,
}
