use embassy_time::Duration;

use crate::cell::MAX_NEIGHBOR_CELLS;

/// Runtime settings of a [`Dispatcher`](crate::dispatcher::Dispatcher).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Used for commands that do not carry their own timeout
    pub default_timeout: Duration,
    /// Neighbour slots of every environment scan, at most
    /// [`MAX_NEIGHBOR_CELLS`]
    pub neighbor_capacity: usize,
    /// Trace every chunk fed to a parser
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
    pub const DEFAULT_NEIGHBOR_CAPACITY: usize = 8;

    pub const fn new() -> Self {
        Self {
            default_timeout: Self::DEFAULT_TIMEOUT,
            neighbor_capacity: Self::DEFAULT_NEIGHBOR_CAPACITY,
            debug: false,
        }
    }

    pub const fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub const fn with_neighbor_capacity(mut self, capacity: usize) -> Self {
        self.neighbor_capacity = if capacity > MAX_NEIGHBOR_CELLS {
            MAX_NEIGHBOR_CELLS
        } else {
            capacity
        };
        self
    }

    pub const fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_clamps_capacity() {
        let config = Config::new()
            .with_neighbor_capacity(64)
            .with_default_timeout(Duration::from_millis(250))
            .with_debug(true);

        assert_eq!(config.neighbor_capacity, MAX_NEIGHBOR_CELLS);
        assert_eq!(config.default_timeout, Duration::from_millis(250));
        assert!(config.debug);
        assert_eq!(Config::default().neighbor_capacity, 8);
    }
}
