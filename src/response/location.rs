use core::fmt;

use serde::Serialize;

use super::Accumulate;
use crate::error::MalformedChunk;
use crate::tokenizer::{dec, Line};

const LOCATION_URC: &str = "UULOC";

/// Position reported by `+UULOC`.
///
/// `valid` only says that a complete fix line was decoded, not that the
/// position is plausible.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LocationFix {
    pub valid: bool,
    /// Degrees, positive north
    pub lat: f64,
    /// Degrees, positive east
    pub lon: f64,
    /// Metres above sea level
    pub alt: i32,
    /// Radius of the 50% confidence circle, in metres
    pub uncertainty: i32,
}

impl LocationFix {
    /// Decode `[<date>,<time>,]<lat>,<long>,<alt>,<uncertainty>[,...]`.
    fn parse(line: &Line<'_>) -> Result<Self, MalformedChunk> {
        let mut fields = line.fields();

        let mut lat = fields.next().ok_or(MalformedChunk("<lat>"))?;
        if lat.contains('/') {
            // Skip <date> and <time>
            fields.next();
            lat = fields.next().ok_or(MalformedChunk("<lat>"))?;
        }

        let lat = dec(lat).ok_or(MalformedChunk("<lat>"))?;
        let lon = fields
            .next()
            .and_then(dec)
            .ok_or(MalformedChunk("<long>"))?;
        let alt = fields
            .next()
            .and_then(dec)
            .ok_or(MalformedChunk("<alt>"))?;
        let uncertainty = fields
            .next()
            .and_then(dec)
            .ok_or(MalformedChunk("<uncertainty>"))?;

        Ok(Self {
            valid: true,
            lat,
            lon,
            alt,
            uncertainty,
        })
    }
}

impl Accumulate for LocationFix {
    fn data(&mut self, line: &Line<'_>) -> Result<(), MalformedChunk> {
        if line.label().is_some_and(|l| l != LOCATION_URC) {
            return Err(MalformedChunk("unexpected command label"));
        }
        *self = Self::parse(line)?;
        Ok(())
    }

    /// The fix normally arrives as a URC some time after the final `OK`.
    fn unsolicited(&mut self, line: &Line<'_>) -> Result<bool, MalformedChunk> {
        if line.label() != Some(LOCATION_URC) {
            return Ok(false);
        }
        *self = Self::parse(line)?;
        Ok(true)
    }

    fn is_complete(&self) -> bool {
        self.valid
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

impl fmt::Display for LocationFix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.6},{:.6},{},{}",
            self.lat, self.lon, self.alt, self.uncertainty
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::{ChunkKind, ResponseParser, ResponseStatus};

    const FIX: &[u8] =
        b"+UULOC: 27/09/2016,18:26:11.000,44.8123456,-73.1234567,30,19,0,0,0,2,0,0,0\r\n";

    fn fix_of(parser: &ResponseParser) -> LocationFix {
        *parser.result().unwrap().as_location().unwrap()
    }

    #[test]
    fn waits_for_urc_after_ok() {
        let mut parser = ResponseParser::location();
        assert_eq!(parser.feed(ChunkKind::Final, b"OK"), ResponseStatus::Pending);
        assert_eq!(
            parser.feed(ChunkKind::Unsolicited, b"+CREG: 5"),
            ResponseStatus::Pending
        );
        assert_eq!(parser.feed(ChunkKind::Unsolicited, FIX), ResponseStatus::Ok);

        let fix = fix_of(&parser);
        assert!(fix.valid);
        assert!((fix.lat - 44.8123456).abs() < 1e-9);
        assert!((fix.lon + 73.1234567).abs() < 1e-9);
        assert_eq!(fix.alt, 30);
        assert_eq!(fix.uncertainty, 19);
    }

    #[test]
    fn accepts_fix_before_ok() {
        let mut parser = ResponseParser::location();
        assert_eq!(parser.feed(ChunkKind::Data, FIX), ResponseStatus::Pending);
        assert_eq!(parser.feed(ChunkKind::Final, b"OK"), ResponseStatus::Ok);
        assert!(fix_of(&parser).valid);
    }

    #[test]
    fn fields_without_date() {
        let line = Line::new("+UULOC: 0.0,0.0,0,0");
        let fix = LocationFix::parse(&line).unwrap();
        // An all-zero fix is still a reported fix
        assert!(fix.valid);
        assert_eq!(fix.uncertainty, 0);
    }

    #[test]
    fn incomplete_fix_is_ignored() {
        let mut parser = ResponseParser::location();
        parser.feed(ChunkKind::Final, b"OK");
        assert_eq!(
            parser.feed(ChunkKind::Unsolicited, b"+UULOC: 27/09/2016,18:26:11.000,44.8"),
            ResponseStatus::Pending
        );
        assert_eq!(parser.feed(ChunkKind::Unsolicited, FIX), ResponseStatus::Ok);
    }

    #[test]
    fn error_ends_without_fix() {
        let mut parser = ResponseParser::location();
        assert_eq!(
            parser.feed(ChunkKind::Final, b"+CME ERROR: 3"),
            ResponseStatus::Error
        );
        assert!(!fix_of(&parser).valid);
    }

    #[test]
    fn displays_coordinates() {
        let fix = LocationFix::parse(&Line::new(core::str::from_utf8(FIX).unwrap())).unwrap();
        let mut s = heapless::String::<64>::new();
        core::fmt::write(&mut s, format_args!("{}", fix)).unwrap();
        assert_eq!(s.as_str(), "44.812346,-73.123457,30,19");
    }
}
