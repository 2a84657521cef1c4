use core::result;

use thiserror::Error;

pub type Result<T> = result::Result<T, Error>;

/// An Error that can occur in this crate
///
/// Controller failures are only ever reported through a
/// [`Completion`](crate::Completion), which hands the same outcome to every
/// clone, hence `Clone`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Connection to curtain controller lost: {0}")]
    ConnectionLost(String),

    #[error("Curtain device fault: {0}")]
    DeviceFault(String),

    #[error("{0} is not a valid curtain state")]
    InvalidState(String),

    #[error("{0} is not a valid command")]
    InvalidCommand(String),

    #[error("Signal handler error: {0}")]
    SignalHandler(String),
}
