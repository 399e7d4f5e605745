use std::error;
use std::fmt;

use super::comm::Op;

/// Result type of the construction entry points.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building a suffix array.
///
/// Everything except `InvalidInput` is fatal for the whole process group.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Error {
    /// Bad arguments, detected before any communication.
    InvalidInput(String),

    /// A working buffer could not be reserved.
    AllocationFailure { bytes: usize },

    /// Peers disagreed about a collective (operation, payload type or size).
    CollectiveMismatch { rank: usize, op: Op, detail: String },

    /// A peer went away in the middle of a collective, or this process panicked.
    Aborted { rank: usize, peer: usize },
}

impl Error {
    pub(crate) fn invalid<S: Into<String>>(msg: S) -> Self {
        Error::InvalidInput(msg.into())
    }

    pub(crate) fn mismatch<S: Into<String>>(rank: usize, op: Op, detail: S) -> Self {
        Error::CollectiveMismatch {
            rank,
            op,
            detail: detail.into(),
        }
    }

    /// Test if the error is fatal for the whole process group.
    pub fn is_fatal(&self) -> bool {
        match self {
            Error::InvalidInput(_) => false,
            _ => true,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::InvalidInput(msg) => write!(f, "invalid input: {}", msg),
            Error::AllocationFailure { bytes } => write!(f, "failed to allocate {} bytes", bytes),
            Error::CollectiveMismatch { rank, op, detail } => {
                write!(f, "process {}: mismatched {:?}: {}", rank, op, detail)
            }
            Error::Aborted { rank, peer } if rank == peer => write!(f, "process {} aborted", rank),
            Error::Aborted { rank, peer } => write!(f, "process {}: peer {} aborted", rank, peer),
        }
    }
}

impl error::Error for Error {}
