use thiserror::Error;

/// Errors reported by the containers in this crate.
///
/// Precondition violations panic through the infallible entry points; the
/// `try_*` entry points return them instead. Soft violations and duplicate
/// keys are logged as warnings by the infallible entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// A container was requested with a capacity of zero.
    #[error("capacity must be greater than zero")]
    ZeroCapacity,

    /// An array was requested from an empty source sequence.
    #[error("cannot build an array from an empty sequence")]
    EmptySource,

    /// An index past the logical length was accessed.
    #[error("index {index} out of bounds for length {len}")]
    OutOfBounds {
        /// The requested index.
        index: usize,
        /// The logical length at the time of access.
        len: usize,
    },

    /// `truncate` was asked to grow the array.
    #[error("truncate only shrinks: length is {len}, requested {requested}")]
    ShrinkOnly {
        /// The logical length at the time of the call.
        len: usize,
        /// The requested length.
        requested: usize,
    },

    /// A key whose fingerprint is already present was inserted.
    #[error("duplicate key with fingerprint {fingerprint:#018x}")]
    DuplicateKey {
        /// The fingerprint shared with the existing entry.
        fingerprint: u64,
    },
}

/// Result alias defaulting to this crate's [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;
