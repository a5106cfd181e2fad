#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

/// A zero-terminated byte string built on `DynArray<u8>`.
///
/// This module provides `ByteString`, whose contents can always be viewed as
/// a C string, with in-place and copying concatenation.
pub mod byte_string;

/// Cache-line size configuration used to size container buffers.
pub mod cache_line;

/// A growable array whose buffer is sized in whole cache lines.
pub mod dyn_array;

/// Error type shared by the containers.
pub mod error;

/// The string hash and 63-bit fingerprints used by `FingerprintMap`.
pub mod fingerprint;

/// An open-addressing map keyed by string fingerprints.
///
/// This module provides `FingerprintMap`, which stores values under the
/// 63-bit fingerprint of a byte-string key and resolves collisions with
/// linear probing.
pub mod fingerprint_map;

pub use byte_string::ByteString;
pub use cache_line::CacheLine;
pub use dyn_array::DynArray;
pub use error::Error;
pub use fingerprint::Fingerprint;
pub use fingerprint_map::FingerprintMap;
