use atat::atat_derive::AtatEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, AtatEnum)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LocationMode {
    /// • 2: single shot position
    SingleShot = 2,
}

/// Which technology produces the fix
#[derive(Debug, Clone, Copy, PartialEq, Eq, AtatEnum)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LocationSensor {
    /// • 0: use the last fix in the internal database
    LastFix = 0,
    /// • 1: GNSS only
    Gnss = 1,
    /// • 2: CellLocate® only
    CellLocate = 2,
    /// • 3: hybrid, GNSS and CellLocate®
    Hybrid = 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, AtatEnum)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LocationResponseType {
    /// • 0: `+UULOC: <date>,<time>,<lat>,<long>,<alt>,<uncertainty>`
    Standard = 0,
    /// • 1: detailed, adds speed, direction and satellite data
    Detailed = 1,
}
