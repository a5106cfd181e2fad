cfg_if::cfg_if! {
    if #[cfg(any(
        all(target_arch = "aarch64", target_vendor = "apple"),
        target_arch = "powerpc64",
    ))] {
        const TARGET_LINE_BYTES: usize = 128;
    } else if #[cfg(any(
        target_arch = "arm",
        target_arch = "mips",
        target_arch = "mips64",
    ))] {
        const TARGET_LINE_BYTES: usize = 32;
    } else {
        const TARGET_LINE_BYTES: usize = 64;
    }
}

/// Size of a CPU cache line in bytes, used to pick allocation granularity.
///
/// A value of zero means the size is unknown; containers then size their
/// buffers to exactly the requested element count.
///
/// The value is resolved once by the caller and passed into constructors such
/// as [`DynArray::with_capacity_in`](crate::DynArray::with_capacity_in).
/// Constructors that do not take one use [`CacheLine::default`], which is the
/// compile-time value for the target architecture.
///
/// # Examples
///
/// ```rust
/// use cacheline_collections::CacheLine;
/// use cacheline_collections::DynArray;
///
/// let line = CacheLine::new(64);
/// let array: DynArray<u32> = DynArray::with_capacity_in(1, line);
/// assert_eq!(array.capacity(), 16);
///
/// let exact: DynArray<u32> = DynArray::with_capacity_in(3, CacheLine::unknown());
/// assert_eq!(exact.capacity(), 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheLine {
    bytes: usize,
}

impl CacheLine {
    /// A cache line of `bytes` bytes. Zero marks the size as unknown.
    pub const fn new(bytes: usize) -> Self {
        Self { bytes }
    }

    /// A cache line of unknown size.
    pub const fn unknown() -> Self {
        Self { bytes: 0 }
    }

    /// The typical cache-line size of the compilation target.
    pub const fn for_target() -> Self {
        Self {
            bytes: TARGET_LINE_BYTES,
        }
    }

    /// Queries the running machine for its L1 data cache-line size, falling
    /// back to [`CacheLine::for_target`] when the platform does not report
    /// one.
    #[cfg(feature = "std")]
    pub fn detect() -> Self {
        match query_platform() {
            Some(bytes) if bytes > 0 => Self { bytes },
            _ => {
                log::debug!(
                    "cache line size not reported by platform, using {} bytes",
                    TARGET_LINE_BYTES
                );
                Self::for_target()
            }
        }
    }

    /// The size in bytes, zero if unknown.
    pub const fn bytes(self) -> usize {
        self.bytes
    }

    /// Returns `true` if the size is known.
    pub const fn is_known(self) -> bool {
        self.bytes != 0
    }

    /// Number of `T` slots to allocate so that at least `min_capacity`
    /// elements fit and the buffer spans a whole number of cache lines.
    ///
    /// Falls back to `min_capacity` when the line size is unknown or `T` is
    /// zero-sized.
    pub(crate) fn slots_for<T>(self, min_capacity: usize) -> usize {
        let elem = core::mem::size_of::<T>();
        if elem == 0 || self.bytes == 0 {
            return min_capacity;
        }

        let bytes = min_capacity
            .checked_mul(elem)
            .and_then(|bytes| bytes.div_ceil(self.bytes).checked_mul(self.bytes))
            .unwrap_or_else(|| capacity_overflow());
        bytes / elem
    }
}

impl Default for CacheLine {
    fn default() -> Self {
        Self::for_target()
    }
}

#[cold]
#[inline(never)]
pub(crate) fn capacity_overflow() -> ! {
    panic!("capacity overflow")
}

#[cfg(all(feature = "std", target_os = "linux"))]
fn query_platform() -> Option<usize> {
    std::fs::read_to_string("/sys/devices/system/cpu/cpu0/cache/index0/coherency_line_size")
        .ok()?
        .trim()
        .parse()
        .ok()
}

#[cfg(all(feature = "std", not(target_os = "linux")))]
fn query_platform() -> Option<usize> {
    None
}
