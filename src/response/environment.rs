use super::Accumulate;
use crate::cell::{Cursor, EnvironmentSample};
use crate::error::MalformedChunk;
use crate::tokenizer::Line;

const SERVICE_MARKERS: [&str; 2] = ["Service-Cell", "Service Cell"];
const NEIGHBOR_MARKERS: [&str; 3] = ["Neighbour Cell", "Neighbor Cell", "Cell #"];

fn strip_marker<'a>(field: &'a str, markers: &[&str]) -> Option<&'a str> {
    markers.iter().find_map(|marker| {
        let head = field.get(..marker.len())?;
        head.eq_ignore_ascii_case(marker)
            .then(|| field[marker.len()..].split_once(':').map_or("", |(_, rest)| rest))
    })
}

impl EnvironmentSample {
    /// Handle one comma separated field of `+CGED` output. Returns the
    /// `key:value` pair left over once any cell marker has been consumed.
    fn marker<'a>(&mut self, field: &'a str) -> &'a str {
        if let Some(rest) = strip_marker(field, &SERVICE_MARKERS) {
            self.select_service();
            return rest.trim();
        }

        if let Some(rest) = strip_marker(field, &NEIGHBOR_MARKERS) {
            let before = self.cursor();
            let is_umts = self.service().is_umts;
            match self.advance_cursor() {
                Cursor::Overflow if before != Cursor::Overflow => {
                    warn!(
                        "More than {} neighbour cells reported, dropping the rest",
                        self.capacity()
                    );
                }
                Cursor::Neighbor(_) => {
                    if let Some(cell) = self.current() {
                        cell.is_umts = is_umts;
                    }
                }
                _ => {}
            }
            return rest.trim();
        }

        field
    }
}

impl Accumulate for EnvironmentSample {
    fn data(&mut self, line: &Line<'_>) -> Result<(), MalformedChunk> {
        if line.label().is_some_and(|l| l != "CGED") {
            return Err(MalformedChunk("unexpected command label"));
        }

        let mut result = Ok(());
        for field in line.fields() {
            let pair = self.marker(field);
            if pair.is_empty() {
                continue;
            }

            let Some((key, value)) = pair.split_once([':', '=']) else {
                result = Err(MalformedChunk("field without key"));
                continue;
            };

            // Past capacity the fields are read but go nowhere
            let Some(cell) = self.current() else {
                continue;
            };
            if let Err(e) = cell.assign(key, value) {
                result = Err(e);
            }
        }
        result
    }

    fn finish(&mut self) {
        self.finalize();
    }

    fn clear(&mut self) {
        EnvironmentSample::clear(self);
    }
}
