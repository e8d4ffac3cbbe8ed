#![cfg_attr(not(test), no_std)]

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod cell;
pub mod command;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod response;
pub mod tokenizer;

#[cfg(test)]
mod test_helpers;

pub use cell::{Band, CellObservation, CellSummary, EnvironmentSample};
pub use config::Config;
pub use dispatcher::{Completion, Delivery, Dispatcher, OperationHandle, SessionState};
pub use error::{Error, ModemError};
pub use response::{
    ChunkKind, CommandEchoString, LocationFix, ParsedPayload, PlainString, ResponseParser,
    ResponseStatus, RssiQual,
};
