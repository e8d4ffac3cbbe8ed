use heapless::Vec;
use serde::Serialize;

use super::CellObservation;

/// Upper bound on the neighbour capacity of an [`EnvironmentSample`].
pub const MAX_NEIGHBOR_CELLS: usize = 16;

/// Which observation the next `key:value` pairs are written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Cursor {
    #[default]
    Service,
    Neighbor(usize),
    /// More neighbours were announced than the sample can hold
    Overflow,
}

/// One serving cell plus a bounded list of neighbour cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EnvironmentSample {
    service: CellObservation,
    neighbors: Vec<CellObservation, MAX_NEIGHBOR_CELLS>,
    #[serde(skip)]
    capacity: usize,
    #[serde(skip)]
    cursor: Cursor,
}

impl EnvironmentSample {
    /// `capacity` is clamped to [`MAX_NEIGHBOR_CELLS`] and fixed for the
    /// lifetime of the sample.
    pub fn new(capacity: usize) -> Self {
        Self {
            service: CellObservation::default(),
            neighbors: Vec::new(),
            capacity: capacity.min(MAX_NEIGHBOR_CELLS),
            cursor: Cursor::Service,
        }
    }

    pub fn clear(&mut self) {
        self.service = CellObservation::default();
        self.neighbors.clear();
        self.cursor = Cursor::Service;
    }

    /// Point the cursor back at the serving cell.
    pub fn select_service(&mut self) {
        self.cursor = Cursor::Service;
    }

    /// Open a new neighbour slot after the populated ones. Past the capacity
    /// the cursor parks on [`Cursor::Overflow`] and further fields are
    /// dropped.
    ///
    /// A neighbour marker that follows a repeated service block appends, it
    /// never reuses a slot that already holds a neighbour.
    pub fn advance_cursor(&mut self) -> Cursor {
        if self.cursor == Cursor::Overflow {
            return Cursor::Overflow;
        }

        let next = self.neighbors.len();
        self.cursor = if next < self.capacity && self.neighbors.push(CellObservation::default()).is_ok()
        {
            Cursor::Neighbor(next)
        } else {
            Cursor::Overflow
        };

        self.cursor
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// The observation at the cursor, or `None` once it has overflowed.
    pub fn current(&mut self) -> Option<&mut CellObservation> {
        match self.cursor {
            Cursor::Service => Some(&mut self.service),
            Cursor::Neighbor(i) => self.neighbors.get_mut(i),
            Cursor::Overflow => None,
        }
    }

    pub fn service(&self) -> &CellObservation {
        &self.service
    }

    pub fn neighbors(&self) -> &[CellObservation] {
        &self.neighbors
    }

    /// Number of neighbour slots actually populated.
    pub fn neighbor_count(&self) -> usize {
        self.neighbors.len()
    }

    /// Number of populated neighbours that pass [`CellObservation::is_valid`].
    pub fn valid_neighbor_count(&self) -> usize {
        self.neighbors.iter().filter(|n| n.is_valid(false)).count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Decode every populated observation.
    pub fn finalize(&mut self) {
        self.service.summary = Some(self.service.summarize());
        for neighbor in self.neighbors.iter_mut() {
            neighbor.summary = Some(neighbor.summarize());
        }
    }
}
