use alloc::boxed::Box;
use core::fmt::Debug;
use core::mem::MaybeUninit;
use core::ops::Deref;
use core::ops::DerefMut;
use core::ops::Index;
use core::ops::IndexMut;
use core::ptr;
use core::slice;

use crate::cache_line::CacheLine;
use crate::cache_line::capacity_overflow;
use crate::error::Error;
use crate::error::Result;

#[cold]
#[inline(never)]
fn out_of_bounds(index: usize, len: usize) -> ! {
    panic!("{}", Error::OutOfBounds { index, len })
}

/// A contiguous, growable array whose buffer is sized in whole cache lines.
///
/// `DynArray<T>` owns a single buffer of `capacity` slots of which the first
/// `len` hold live values. The initial buffer is the smallest whole number of
/// cache lines that fits the requested capacity, and the buffer doubles
/// whenever a push finds it full, so `n` pushes cost `O(n)` in total.
///
/// Unlike `Vec`, an array always has a non-zero capacity and `truncate` only
/// ever shrinks; asking it to grow is logged and ignored.
///
/// ## Example
///
/// ```rust
/// use cacheline_collections::DynArray;
///
/// let mut array = DynArray::with_capacity(1);
/// for i in 0..16 {
///     array.push(i);
/// }
///
/// assert_eq!(array.len(), 16);
/// assert!(array.iter().copied().eq(0..16));
/// ```
pub struct DynArray<T> {
    storage: Box<[MaybeUninit<T>]>,
    len: usize,
    cache_line: CacheLine,
}

impl<T> DynArray<T> {
    /// Creates an empty array able to hold at least `min_capacity` elements,
    /// sized with the target's default [`CacheLine`].
    ///
    /// # Panics
    ///
    /// Panics if `min_capacity` is zero.
    pub fn with_capacity(min_capacity: usize) -> Self {
        Self::with_capacity_in(min_capacity, CacheLine::default())
    }

    /// Creates an empty array able to hold at least `min_capacity` elements,
    /// rounding the buffer up to whole lines of `cache_line`.
    ///
    /// # Panics
    ///
    /// Panics if `min_capacity` is zero.
    pub fn with_capacity_in(min_capacity: usize, cache_line: CacheLine) -> Self {
        match Self::try_with_capacity_in(min_capacity, cache_line) {
            Ok(array) => array,
            Err(err) => panic!("{err}"),
        }
    }

    /// Fallible version of [`DynArray::with_capacity`].
    pub fn try_with_capacity(min_capacity: usize) -> Result<Self> {
        Self::try_with_capacity_in(min_capacity, CacheLine::default())
    }

    /// Fallible version of [`DynArray::with_capacity_in`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cacheline_collections::CacheLine;
    /// use cacheline_collections::DynArray;
    /// use cacheline_collections::Error;
    ///
    /// let err = DynArray::<u8>::try_with_capacity_in(0, CacheLine::new(64));
    /// assert_eq!(err.err(), Some(Error::ZeroCapacity));
    /// ```
    pub fn try_with_capacity_in(min_capacity: usize, cache_line: CacheLine) -> Result<Self> {
        if min_capacity == 0 {
            return Err(Error::ZeroCapacity);
        }

        Ok(Self {
            storage: Box::new_uninit_slice(cache_line.slots_for::<T>(min_capacity)),
            len: 0,
            cache_line,
        })
    }

    /// Returns the number of live elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the array holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of slots in the current buffer.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Returns the cache line this array was sized with.
    #[inline]
    pub fn cache_line(&self) -> CacheLine {
        self.cache_line
    }

    /// Appends `value`, doubling the buffer first if it is full.
    #[inline]
    pub fn push(&mut self, value: T) {
        if self.len == self.capacity() {
            self.grow();
        }
        self.write_next(value);
    }

    #[inline(always)]
    fn write_next(&mut self, value: T) {
        debug_assert!(self.len < self.capacity());
        self.storage[self.len].write(value);
        self.len += 1;
    }

    #[cold]
    fn grow(&mut self) {
        let new_capacity = self
            .capacity()
            .max(1)
            .checked_mul(2)
            .unwrap_or_else(|| capacity_overflow());
        let mut storage = Box::new_uninit_slice(new_capacity);

        // SAFETY: The new buffer is larger than `len` and the two buffers are
        // distinct allocations. Values are moved bitwise; the old buffer holds
        // `MaybeUninit` slots, so releasing it does not drop the moved values.
        unsafe {
            ptr::copy_nonoverlapping(self.storage.as_ptr(), storage.as_mut_ptr(), self.len);
        }
        self.storage = storage;

        log::trace!("dyn array grown to {new_capacity} slots");
    }

    /// Returns the live elements as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: Slots `[0, len)` are initialized.
        unsafe { slice::from_raw_parts(self.storage.as_ptr().cast::<T>(), self.len) }
    }

    /// Returns the live elements as a mutable slice.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: Slots `[0, len)` are initialized.
        unsafe { slice::from_raw_parts_mut(self.storage.as_mut_ptr().cast::<T>(), self.len) }
    }

    /// Shortens the array to `new_len` elements, dropping the rest.
    ///
    /// Growing is not supported: if `new_len` is greater than the current
    /// length a warning is logged and the array is left unchanged.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cacheline_collections::DynArray;
    ///
    /// let mut array = DynArray::from_slice(&[1, 2, 3, 4]);
    /// array.truncate(2);
    /// assert_eq!(array.as_slice(), &[1, 2]);
    ///
    /// array.truncate(10);
    /// assert_eq!(array.len(), 2);
    /// ```
    pub fn truncate(&mut self, new_len: usize) {
        if let Err(err) = self.try_truncate(new_len) {
            log::warn!("{err}");
        }
    }

    /// Fallible version of [`DynArray::truncate`], returning
    /// [`Error::ShrinkOnly`] instead of logging.
    pub fn try_truncate(&mut self, new_len: usize) -> Result<()> {
        if new_len > self.len {
            return Err(Error::ShrinkOnly {
                len: self.len,
                requested: new_len,
            });
        }

        let old_len = self.len;
        self.len = new_len;
        // SAFETY: Slots `[new_len, old_len)` are initialized and, with `len`
        // already lowered, no longer reachable. If a destructor panics the
        // remaining values leak instead of being dropped twice.
        unsafe {
            let tail = ptr::slice_from_raw_parts_mut(
                self.storage.as_mut_ptr().add(new_len).cast::<T>(),
                old_len - new_len,
            );
            ptr::drop_in_place(tail);
        }

        Ok(())
    }

    /// Drops every element, keeping the buffer.
    pub fn clear(&mut self) {
        self.truncate(0);
    }
}

impl<T: Clone> DynArray<T> {
    /// Creates an array holding clones of `values`, in order.
    ///
    /// # Panics
    ///
    /// Panics if `values` is empty.
    pub fn from_slice(values: &[T]) -> Self {
        Self::from_slice_in(values, CacheLine::default())
    }

    /// Creates an array holding clones of `values`, in order, with the buffer
    /// rounded up to whole lines of `cache_line`.
    ///
    /// # Panics
    ///
    /// Panics if `values` is empty.
    pub fn from_slice_in(values: &[T], cache_line: CacheLine) -> Self {
        match Self::try_from_slice_in(values, cache_line) {
            Ok(array) => array,
            Err(err) => panic!("{err}"),
        }
    }

    /// Fallible version of [`DynArray::from_slice`].
    pub fn try_from_slice(values: &[T]) -> Result<Self> {
        Self::try_from_slice_in(values, CacheLine::default())
    }

    /// Fallible version of [`DynArray::from_slice_in`].
    pub fn try_from_slice_in(values: &[T], cache_line: CacheLine) -> Result<Self> {
        if values.is_empty() {
            return Err(Error::EmptySource);
        }

        let mut array = Self::try_with_capacity_in(values.len(), cache_line)?;
        for value in values {
            array.write_next(value.clone());
        }
        Ok(array)
    }
}

impl<T, const N: usize> From<[T; N]> for DynArray<T> {
    /// # Panics
    ///
    /// Panics if `N` is zero.
    fn from(values: [T; N]) -> Self {
        let mut array = Self::with_capacity(N);
        for value in values {
            array.write_next(value);
        }
        array
    }
}

impl<T> Drop for DynArray<T> {
    fn drop(&mut self) {
        // SAFETY: Slots `[0, len)` are initialized and dropped exactly once
        // here. The buffer itself is released by `Box`.
        unsafe { ptr::drop_in_place(self.as_mut_slice() as *mut [T]) }
    }
}

impl<T: Clone> Clone for DynArray<T> {
    fn clone(&self) -> Self {
        let mut array = Self {
            storage: Box::new_uninit_slice(self.capacity()),
            len: 0,
            cache_line: self.cache_line,
        };
        for value in self.as_slice() {
            array.write_next(value.clone());
        }
        array
    }

    fn clone_from(&mut self, source: &Self) {
        if self.capacity() < source.len {
            *self = source.clone();
            return;
        }

        self.clear();
        for value in source.as_slice() {
            self.write_next(value.clone());
        }
    }
}

impl<T: Debug> Debug for DynArray<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

impl<T: PartialEq> PartialEq for DynArray<T> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Eq> Eq for DynArray<T> {}

impl<T> Deref for DynArray<T> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T> DerefMut for DynArray<T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T> Index<usize> for DynArray<T> {
    type Output = T;

    #[inline]
    fn index(&self, index: usize) -> &T {
        match self.as_slice().get(index) {
            Some(value) => value,
            None => out_of_bounds(index, self.len),
        }
    }
}

impl<T> IndexMut<usize> for DynArray<T> {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut T {
        let len = self.len;
        match self.as_mut_slice().get_mut(index) {
            Some(value) => value,
            None => out_of_bounds(index, len),
        }
    }
}

impl<T> Extend<T> for DynArray<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.push(value);
        }
    }
}

impl<'a, T> IntoIterator for &'a DynArray<T> {
    type IntoIter = slice::Iter<'a, T>;
    type Item = &'a T;

    fn into_iter(self) -> Self::IntoIter {
        self.as_slice().iter()
    }
}

impl<'a, T> IntoIterator for &'a mut DynArray<T> {
    type IntoIter = slice::IterMut<'a, T>;
    type Item = &'a mut T;

    fn into_iter(self) -> Self::IntoIter {
        self.as_mut_slice().iter_mut()
    }
}
