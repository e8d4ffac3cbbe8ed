use core::fmt;

/// Error token reported by the modem in place of a final `OK`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ModemError {
    /// Plain `ERROR`
    Error,
    /// `+CME ERROR: <n>`, mobile termination error
    Cme(u16),
    /// `+CMS ERROR: <n>`, message service error
    Cms(u16),
    NoCarrier,
    Busy,
    NoAnswer,
    NoDialtone,
}

impl ModemError {
    /// Recognise a final error line. Returns `None` for anything that is not
    /// one of the modem's error tokens, including `OK`.
    pub fn from_line(line: &str) -> Option<Self> {
        let line = line.trim();

        if let Some(code) = line.strip_prefix("+CME ERROR:") {
            // Verbose result codes (AT+CMEE=2) carry text instead of a number
            return Some(code.trim().parse().map_or(Self::Error, Self::Cme));
        }
        if let Some(code) = line.strip_prefix("+CMS ERROR:") {
            return Some(code.trim().parse().map_or(Self::Error, Self::Cms));
        }

        match line {
            "ERROR" => Some(Self::Error),
            "NO CARRIER" => Some(Self::NoCarrier),
            "BUSY" => Some(Self::Busy),
            "NO ANSWER" => Some(Self::NoAnswer),
            "NO DIALTONE" => Some(Self::NoDialtone),
            _ => None,
        }
    }
}

impl fmt::Display for ModemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => f.write_str("ERROR"),
            Self::Cme(code) => write!(f, "+CME ERROR: {}", code),
            Self::Cms(code) => write!(f, "+CMS ERROR: {}", code),
            Self::NoCarrier => f.write_str("NO CARRIER"),
            Self::Busy => f.write_str("BUSY"),
            Self::NoAnswer => f.write_str("NO ANSWER"),
            Self::NoDialtone => f.write_str("NO DIALTONE"),
        }
    }
}

/// A data line did not have the shape the active parser expects. Never
/// fatal: the named field keeps its previous value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MalformedChunk(pub &'static str);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    /// An operation is already awaiting its response on this dispatcher
    Busy,
    /// No final result arrived before the operation deadline
    Timeout,
    /// The modem rejected the command
    Modem(ModemError),
    /// The command did not fit in the supplied output buffer
    Encode,
}

impl From<ModemError> for Error {
    fn from(e: ModemError) -> Self {
        Self::Modem(e)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Busy => f.write_str("an operation is already in flight"),
            Self::Timeout => f.write_str("timed out waiting for the final result"),
            Self::Modem(e) => write!(f, "modem reported {}", e),
            Self::Encode => f.write_str("command does not fit the output buffer"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_final_error_tokens() {
        assert_eq!(ModemError::from_line("ERROR"), Some(ModemError::Error));
        assert_eq!(ModemError::from_line("ERROR\r\n"), Some(ModemError::Error));
        assert_eq!(
            ModemError::from_line("+CME ERROR: 10"),
            Some(ModemError::Cme(10))
        );
        assert_eq!(
            ModemError::from_line("+CMS ERROR: 500"),
            Some(ModemError::Cms(500))
        );
        assert_eq!(
            ModemError::from_line("+CME ERROR: SIM not inserted"),
            Some(ModemError::Error)
        );
        assert_eq!(
            ModemError::from_line("NO CARRIER"),
            Some(ModemError::NoCarrier)
        );
    }

    #[test]
    fn ok_is_not_an_error() {
        assert_eq!(ModemError::from_line("OK"), None);
        assert_eq!(ModemError::from_line("+CSQ: 19,99"), None);
    }
}
