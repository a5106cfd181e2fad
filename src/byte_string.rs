use core::ffi::CStr;
use core::fmt::Debug;
use core::fmt::Display;
use core::fmt::Write;
use core::hash::Hash;
use core::hash::Hasher;
use core::ops::Add;
use core::slice;

use crate::cache_line::CacheLine;
use crate::dyn_array::DynArray;

/// A growable byte string that always keeps a zero terminator after its
/// contents.
///
/// The bytes live in a [`DynArray<u8>`] holding `len() + 1` elements, the
/// last of which is always `0`. This makes [`ByteString::as_c_str`] free and
/// lets the string be handed to anything expecting a conventional
/// zero-terminated view.
///
/// Concatenation with [`ByteString::appended`] (or `&a + &b`) builds a new
/// string and leaves both operands untouched; [`ByteString::push`] and
/// [`ByteString::push_bytes`] append in place.
///
/// ## Example
///
/// ```rust
/// use cacheline_collections::ByteString;
///
/// let hello = ByteString::from("Hello, ");
/// let greeting = hello.appended("World!");
///
/// assert_eq!(greeting, "Hello, World!");
/// assert_eq!(hello, "Hello, ");
/// assert_eq!(greeting.as_bytes_with_nul().last(), Some(&0));
/// ```
#[derive(Clone)]
pub struct ByteString {
    // Never empty: the last element is the terminator.
    bytes: DynArray<u8>,
}

impl ByteString {
    /// Creates an empty string.
    pub fn new() -> Self {
        Self::from_bytes(&[])
    }

    /// Creates a string holding a copy of `bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self::from_bytes_in(bytes, CacheLine::default())
    }

    /// Creates a string holding a copy of `bytes`, sizing its buffer with
    /// `cache_line`.
    pub fn from_bytes_in(bytes: &[u8], cache_line: CacheLine) -> Self {
        let mut storage = DynArray::with_capacity_in(bytes.len() + 1, cache_line);
        storage.extend(bytes.iter().copied());
        storage.push(0);
        Self { bytes: storage }
    }

    /// Returns the number of visible bytes, excluding the terminator.
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len() - 1
    }

    /// Returns `true` if the string has no visible bytes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns how many visible bytes fit before the buffer must grow.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.bytes.capacity() - 1
    }

    /// Appends a single byte.
    pub fn push(&mut self, byte: u8) {
        let end = self.len();
        self.bytes[end] = byte;
        self.bytes.push(0);
    }

    /// Appends `bytes` in place.
    pub fn push_bytes(&mut self, bytes: &[u8]) {
        let end = self.len();
        self.bytes.truncate(end);
        self.bytes.extend(bytes.iter().copied());
        self.bytes.push(0);
    }

    /// Returns a new string holding `self` followed by `other`.
    ///
    /// The result is allocated once, sized for both operands and the
    /// terminator. Neither operand is modified.
    pub fn appended(&self, other: impl AsRef<[u8]>) -> ByteString {
        let other = other.as_ref();
        let mut bytes =
            DynArray::with_capacity_in(self.len() + other.len() + 1, self.bytes.cache_line());
        bytes.extend(self.as_bytes().iter().copied());
        bytes.extend(other.iter().copied());
        bytes.push(0);
        ByteString { bytes }
    }

    /// Returns the visible bytes, without the terminator.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes.as_slice()[..self.len()]
    }

    /// Returns the visible bytes followed by the terminator.
    #[inline]
    pub fn as_bytes_with_nul(&self) -> &[u8] {
        self.bytes.as_slice()
    }

    /// Returns the contents as a C string.
    ///
    /// If the contents contain an interior zero byte, the C string ends
    /// there, as any consumer of the terminated view would see it.
    pub fn as_c_str(&self) -> &CStr {
        CStr::from_bytes_until_nul(self.bytes.as_slice()).unwrap_or_default()
    }

    /// Returns the contents as `str` if they are valid UTF-8.
    pub fn to_str(&self) -> Result<&str, core::str::Utf8Error> {
        core::str::from_utf8(self.as_bytes())
    }

    /// Returns an iterator over the visible bytes.
    pub fn iter(&self) -> slice::Iter<'_, u8> {
        self.as_bytes().iter()
    }
}

impl Default for ByteString {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&[u8]> for ByteString {
    fn from(bytes: &[u8]) -> Self {
        Self::from_bytes(bytes)
    }
}

impl From<&str> for ByteString {
    fn from(text: &str) -> Self {
        Self::from_bytes(text.as_bytes())
    }
}

impl AsRef<[u8]> for ByteString {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl Add<&ByteString> for &ByteString {
    type Output = ByteString;

    fn add(self, rhs: &ByteString) -> ByteString {
        self.appended(rhs)
    }
}

impl PartialEq for ByteString {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for ByteString {}

impl PartialEq<[u8]> for ByteString {
    fn eq(&self, other: &[u8]) -> bool {
        self.as_bytes() == other
    }
}

impl PartialEq<str> for ByteString {
    fn eq(&self, other: &str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl PartialEq<&str> for ByteString {
    fn eq(&self, other: &&str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Hash for ByteString {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_bytes().hash(state);
    }
}

impl Display for ByteString {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        for chunk in self.as_bytes().utf8_chunks() {
            f.write_str(chunk.valid())?;
            if !chunk.invalid().is_empty() {
                f.write_char(char::REPLACEMENT_CHARACTER)?;
            }
        }
        Ok(())
    }
}

impl Debug for ByteString {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "\"{}\"", self.as_bytes().escape_ascii())
    }
}

impl<'a> IntoIterator for &'a ByteString {
    type IntoIter = slice::Iter<'a, u8>;
    type Item = &'a u8;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
