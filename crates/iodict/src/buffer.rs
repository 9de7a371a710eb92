//! A growable producer/consumer byte buffer.
//!
//! [`ByteBuffer`] owns one contiguous region and two cursors:
//!
//! ```text
//!  0            read             write          capacity
//!  |  consumed   |  unconsumed    |    free        |
//! ```
//!
//! Stores append at `write`, consumes advance `read`. The cursors always
//! satisfy `0 <= read <= write <= capacity`.
//!
//! When a store does not fit, the buffer first tries to slide the unconsumed
//! window down to offset 0 (compaction). Only when that is not enough does it
//! reallocate, and a reallocation copies forward just the unconsumed window.
//! Every read is bounds-checked: asking for more bytes than are unconsumed
//! fails with [`Error::Underflow`] and leaves the read cursor where it was.
use core::{fmt, ops::Index, ops::RangeBounds};
use std::{fs, io, path::Path};

use bstr::{BStr, BString, ByteSlice};
use log::{debug, trace};

use crate::{
    error::{Error, Result},
    options::BufferOptions,
};

#[derive(Clone, PartialEq, Eq)]
pub struct ByteBuffer {
    /// Always fully initialized; `data.len()` is the capacity.
    data: Vec<u8>,
    write: usize,
    read: usize,
    min_growth: usize,
}

impl Default for ByteBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ByteBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteBuffer")
            .field("capacity", &self.capacity())
            .field("read", &self.read)
            .field("write", &self.write)
            .field("unconsumed", &self.unconsumed().as_bstr())
            .finish()
    }
}

impl ByteBuffer {
    /// Creates an empty buffer with the default [`BufferOptions`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(BufferOptions::default())
    }

    /// Creates an empty buffer with room for `capacity` bytes.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_options(BufferOptions {
            initial_capacity: capacity,
            ..Default::default()
        })
    }

    #[must_use]
    pub fn with_options(options: BufferOptions) -> Self {
        Self {
            data: vec![0; options.initial_capacity],
            write: 0,
            read: 0,
            min_growth: options.min_growth,
        }
    }

    // --------------------------------------------------------------------
    // Cursor state
    // --------------------------------------------------------------------

    /// Allocated size of the underlying region.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Number of published bytes (the write cursor).
    #[must_use]
    pub fn len(&self) -> usize {
        self.write
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.write == 0
    }

    /// Number of consumed bytes (the read cursor).
    #[must_use]
    pub fn consumed(&self) -> usize {
        self.read
    }

    /// Number of published bytes not yet consumed.
    #[must_use]
    pub fn available(&self) -> usize {
        self.write - self.read
    }

    #[must_use]
    pub fn has_bytes_to_read(&self) -> bool {
        self.read < self.write
    }

    #[must_use]
    pub fn min_growth(&self) -> usize {
        self.min_growth
    }

    pub fn set_min_growth(&mut self, min_growth: usize) {
        self.min_growth = min_growth;
    }

    /// The published region `[0, write)`.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.write]
    }

    /// The unconsumed window `[read, write)`.
    #[must_use]
    pub fn unconsumed(&self) -> &[u8] {
        &self.data[self.read..self.write]
    }

    /// Rewinds both cursors to 0 once everything published has been consumed.
    pub fn recycle(&mut self) {
        if self.read == self.write {
            self.read = 0;
            self.write = 0;
        }
    }

    /// Discards all published data. The allocation is kept.
    pub fn reset(&mut self) {
        self.read = 0;
        self.write = 0;
    }

    /// Moves the read cursor back to 0 so the published data can be read again.
    pub fn clear_consumed(&mut self) {
        self.read = 0;
    }

    /// Drops published bytes beyond `len`. Consumed bytes are never dropped.
    pub fn truncate(&mut self, len: usize) {
        self.write = self.write.min(len.max(self.read));
    }

    /// Consumes `n` bytes without looking at them, then recycles.
    ///
    /// # Errors
    ///
    /// [`Error::Underflow`] if fewer than `n` bytes are unconsumed.
    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.check_available(n)?;
        self.read += n;
        self.recycle();
        Ok(())
    }

    /// Moves the read cursor back by up to `n` bytes and returns how far it
    /// actually moved.
    pub fn rewind(&mut self, n: usize) -> usize {
        let n = n.min(self.read);
        self.read -= n;
        n
    }

    // --------------------------------------------------------------------
    // Growth
    // --------------------------------------------------------------------

    /// Guarantees that `additional` bytes can be stored contiguously after the
    /// write cursor.
    ///
    /// Tries, in order: the current free space, compaction, and finally a
    /// reallocation that grows by at least `max(additional, capacity / 3,
    /// min_growth)`.
    ///
    /// # Errors
    ///
    /// [`Error::AllocationFailure`] if the allocator refuses the new block. The
    /// buffer is left untouched in that case.
    pub fn ensure_capacity(&mut self, additional: usize) -> Result<()> {
        if self.fits(additional) {
            return Ok(());
        }
        let window = self.available();
        let fits_compacted = window
            .checked_add(additional)
            .is_some_and(|end| end <= self.capacity());
        if fits_compacted && self.compact() {
            return Ok(());
        }

        let growth = additional.max(self.capacity() / 3).max(self.min_growth);
        let failure = Error::AllocationFailure {
            requested: additional,
        };
        let Some(new_capacity) = self
            .capacity()
            .checked_add(growth)
            .zip(window.checked_add(additional))
            .map(|(grown, needed)| grown.max(needed))
        else {
            return Err(failure);
        };

        let mut block = Vec::new();
        if block.try_reserve_exact(new_capacity).is_err() {
            debug!("byte buffer: failed to allocate {new_capacity} bytes");
            return Err(failure);
        }
        block.extend_from_slice(self.unconsumed());
        block.resize(new_capacity, 0);

        trace!(
            "byte buffer: grew {} -> {} bytes, carried {} unconsumed",
            self.capacity(),
            new_capacity,
            window
        );
        self.data = block;
        self.write = window;
        self.read = 0;
        Ok(())
    }

    /// Slides the unconsumed window to offset 0 when it is no larger than the
    /// consumed prefix. Returns whether anything moved.
    pub fn compact(&mut self) -> bool {
        let window = self.available();
        if self.read == 0 || window > self.read {
            return false;
        }
        self.data.copy_within(self.read..self.write, 0);
        trace!(
            "byte buffer: compacted {} unconsumed bytes from offset {}",
            window,
            self.read
        );
        self.write = window;
        self.read = 0;
        true
    }

    fn fits(&self, additional: usize) -> bool {
        self.write
            .checked_add(additional)
            .is_some_and(|end| end <= self.capacity())
    }

    // --------------------------------------------------------------------
    // Stores
    // --------------------------------------------------------------------

    /// Appends raw bytes.
    ///
    /// # Errors
    ///
    /// [`Error::AllocationFailure`] if the buffer cannot grow.
    pub fn store_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.ensure_capacity(bytes.len())?;
        self.data[self.write..self.write + bytes.len()].copy_from_slice(bytes);
        self.write += bytes.len();
        Ok(())
    }

    /// Appends `count` copies of `byte`.
    ///
    /// # Errors
    ///
    /// [`Error::AllocationFailure`] if the buffer cannot grow.
    pub fn store_repeat(&mut self, byte: u8, count: usize) -> Result<()> {
        self.ensure_capacity(count)?;
        self.data[self.write..self.write + count].fill(byte);
        self.write += count;
        Ok(())
    }

    /// Appends a string's bytes without any length prefix.
    ///
    /// # Errors
    ///
    /// [`Error::AllocationFailure`] if the buffer cannot grow.
    pub fn store_string(&mut self, s: impl AsRef<[u8]>) -> Result<()> {
        self.store_bytes(s.as_ref())
    }

    /// Appends a big-endian `u16` length followed by the string's bytes.
    ///
    /// # Errors
    ///
    /// [`Error::StringTooLong`] for strings over 65535 bytes (nothing is
    /// written), or [`Error::AllocationFailure`].
    pub fn store_string_with_size_be(&mut self, s: impl AsRef<[u8]>) -> Result<()> {
        let bytes = s.as_ref();
        let len = Self::short_len(bytes)?;
        self.ensure_capacity(2 + bytes.len())?;
        self.store_u16_be(len)?;
        self.store_bytes(bytes)
    }

    /// Little-endian counterpart of [`store_string_with_size_be`](Self::store_string_with_size_be).
    ///
    /// # Errors
    ///
    /// [`Error::StringTooLong`] or [`Error::AllocationFailure`].
    pub fn store_string_with_size_le(&mut self, s: impl AsRef<[u8]>) -> Result<()> {
        let bytes = s.as_ref();
        let len = Self::short_len(bytes)?;
        self.ensure_capacity(2 + bytes.len())?;
        self.store_u16_le(len)?;
        self.store_bytes(bytes)
    }

    fn short_len(bytes: &[u8]) -> Result<u16> {
        u16::try_from(bytes.len()).map_err(|_| Error::StringTooLong(bytes.len()))
    }

    pub fn store_bool(&mut self, value: bool) -> Result<()> {
        self.store_u8(u8::from(value))
    }

    pub fn store_u8(&mut self, value: u8) -> Result<()> {
        self.store_bytes(&[value])
    }

    pub fn store_i8(&mut self, value: i8) -> Result<()> {
        self.store_bytes(&value.to_ne_bytes())
    }

    /// Moves up to `limit` unconsumed bytes (all of them when `None`) out of
    /// `other` and appends them here. Returns how many bytes moved; a short
    /// transfer is not an error.
    ///
    /// # Errors
    ///
    /// [`Error::AllocationFailure`] if this buffer cannot grow. `other` is
    /// untouched in that case.
    pub fn store_buffer(&mut self, other: &mut ByteBuffer, limit: Option<usize>) -> Result<usize> {
        let n = limit.map_or(other.available(), |limit| limit.min(other.available()));
        if n == 0 {
            return Ok(0);
        }
        self.ensure_capacity(n)?;
        self.data[self.write..self.write + n].copy_from_slice(&other.data[other.read..other.read + n]);
        self.write += n;
        other.read += n;
        Ok(n)
    }

    // --------------------------------------------------------------------
    // Consumes
    // --------------------------------------------------------------------

    fn check_available(&self, requested: usize) -> Result<()> {
        let available = self.available();
        if requested > available {
            return Err(Error::Underflow {
                requested,
                available,
            });
        }
        Ok(())
    }

    fn peek_array<const N: usize>(&self) -> Result<[u8; N]> {
        self.check_available(N)?;
        let mut out = [0; N];
        out.copy_from_slice(&self.data[self.read..self.read + N]);
        Ok(out)
    }

    fn consume_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let out = self.peek_array::<N>()?;
        self.read += N;
        Ok(out)
    }

    /// Consumes exactly `n` bytes and returns them.
    ///
    /// # Errors
    ///
    /// [`Error::Underflow`] if fewer than `n` bytes are unconsumed.
    pub fn consume_bytes(&mut self, n: usize) -> Result<&[u8]> {
        self.check_available(n)?;
        let start = self.read;
        self.read += n;
        Ok(&self.data[start..start + n])
    }

    /// Copies as many unconsumed bytes as fit into `out`, returning the count.
    pub fn read_into(&mut self, out: &mut [u8]) -> usize {
        let n = out.len().min(self.available());
        out[..n].copy_from_slice(&self.data[self.read..self.read + n]);
        self.read += n;
        n
    }

    /// Consumes `n` bytes as a byte string. No UTF-8 validation is done.
    ///
    /// # Errors
    ///
    /// [`Error::Underflow`] if fewer than `n` bytes are unconsumed.
    pub fn consume_string(&mut self, n: usize) -> Result<BString> {
        self.consume_bytes(n).map(BString::from)
    }

    /// Reads a big-endian `u16` length and then that many bytes. Nothing is
    /// consumed unless the whole string is available.
    ///
    /// # Errors
    ///
    /// [`Error::Underflow`] if the prefix or the payload is truncated.
    pub fn consume_string_with_size_be(&mut self) -> Result<BString> {
        let len = usize::from(u16::from_be_bytes(self.peek_array()?));
        self.check_available(2 + len)?;
        self.read += 2;
        self.consume_string(len)
    }

    /// Little-endian counterpart of [`consume_string_with_size_be`](Self::consume_string_with_size_be).
    ///
    /// # Errors
    ///
    /// [`Error::Underflow`] if the prefix or the payload is truncated.
    pub fn consume_string_with_size_le(&mut self) -> Result<BString> {
        let len = usize::from(u16::from_le_bytes(self.peek_array()?));
        self.check_available(2 + len)?;
        self.read += 2;
        self.consume_string(len)
    }

    pub fn consume_bool(&mut self) -> Result<bool> {
        Ok(self.consume_u8()? != 0)
    }

    pub fn consume_u8(&mut self) -> Result<u8> {
        Ok(self.consume_array::<1>()?[0])
    }

    pub fn consume_i8(&mut self) -> Result<i8> {
        Ok(i8::from_ne_bytes(self.consume_array()?))
    }

    /// Scans for `delimiter` from the read cursor.
    ///
    /// On a match, `collected` receives every scanned byte including the
    /// delimiter, the read cursor moves past it, and the absolute offset of
    /// the delimiter is returned. Otherwise `collected` is cleared and the
    /// cursor does not move.
    pub fn consume_until_byte(&mut self, delimiter: u8, collected: &mut BString) -> Option<usize> {
        collected.clear();
        let pos = self.unconsumed().find_byte(delimiter)?;
        Some(self.take_through(pos, 1, collected))
    }

    /// Like [`consume_until_byte`](Self::consume_until_byte) with a multi-byte
    /// delimiter. The returned offset is where the delimiter starts. An empty
    /// delimiter never matches.
    pub fn consume_until(&mut self, delimiter: impl AsRef<[u8]>, collected: &mut BString) -> Option<usize> {
        collected.clear();
        let delimiter = delimiter.as_ref();
        if delimiter.is_empty() {
            return None;
        }
        let pos = self.unconsumed().find(delimiter)?;
        Some(self.take_through(pos, delimiter.len(), collected))
    }

    fn take_through(&mut self, pos: usize, delimiter_len: usize, collected: &mut BString) -> usize {
        let at = self.read + pos;
        let end = at + delimiter_len;
        collected.extend_from_slice(&self.data[self.read..end]);
        self.read = end;
        at
    }

    // --------------------------------------------------------------------
    // Files & debugging
    // --------------------------------------------------------------------

    /// Reads a whole file into a freshly sized buffer.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] if the file cannot be opened or read.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).inspect_err(|e| {
            debug!("byte buffer: cannot read {}: {e}", path.display());
        })?;
        debug!("byte buffer: loaded {} bytes from {}", bytes.len(), path.display());
        Ok(Self::from(bytes))
    }

    /// Writes the published region `[0, write)` to `path`, replacing any
    /// existing file.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] if the file cannot be created or written.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.as_slice()).inspect_err(|e| {
            debug!("byte buffer: cannot write {}: {e}", path.display());
        })?;
        debug!("byte buffer: saved {} bytes to {}", self.write, path.display());
        Ok(())
    }

    /// Renders a range of the published bytes as uppercase hex, sixteen bytes
    /// per line. The range is clamped to what has been published.
    #[must_use]
    pub fn hex_dump(&self, range: impl RangeBounds<usize>) -> String {
        use core::ops::Bound;

        let start = match range.start_bound() {
            Bound::Included(&s) => s,
            Bound::Excluded(&s) => s.saturating_add(1),
            Bound::Unbounded => 0,
        };
        let end = match range.end_bound() {
            Bound::Included(&e) => e.saturating_add(1),
            Bound::Excluded(&e) => e,
            Bound::Unbounded => self.write,
        };
        let end = end.min(self.write);
        let start = start.min(end);

        let mut out = String::with_capacity((end - start) * 3);
        for (i, line) in self.data[start..end].chunks(16).enumerate() {
            if i > 0 {
                out.push('\n');
            }
            let hex: Vec<String> = line.iter().map(|b| format!("{b:02X}")).collect();
            out.push_str(&hex.join(" "));
        }
        out
    }
}

macro_rules! typed_accessors {
    ($( $ty:ty => $store:ident, $store_be:ident, $store_le:ident, $consume:ident, $consume_be:ident, $consume_le:ident; )*) => {
        impl ByteBuffer {
            $(
                #[doc = concat!("Stores a `", stringify!($ty), "` in native byte order.\n\n# Errors\n\n[`Error::AllocationFailure`] if the buffer cannot grow.")]
                pub fn $store(&mut self, value: $ty) -> Result<()> {
                    self.store_bytes(&value.to_ne_bytes())
                }

                #[doc = concat!("Stores a big-endian `", stringify!($ty), "`.\n\n# Errors\n\n[`Error::AllocationFailure`] if the buffer cannot grow.")]
                pub fn $store_be(&mut self, value: $ty) -> Result<()> {
                    self.store_bytes(&value.to_be_bytes())
                }

                #[doc = concat!("Stores a little-endian `", stringify!($ty), "`.\n\n# Errors\n\n[`Error::AllocationFailure`] if the buffer cannot grow.")]
                pub fn $store_le(&mut self, value: $ty) -> Result<()> {
                    self.store_bytes(&value.to_le_bytes())
                }

                #[doc = concat!("Consumes a `", stringify!($ty), "` in native byte order.\n\n# Errors\n\n[`Error::Underflow`] if too few bytes are unconsumed.")]
                pub fn $consume(&mut self) -> Result<$ty> {
                    Ok(<$ty>::from_ne_bytes(self.consume_array()?))
                }

                #[doc = concat!("Consumes a big-endian `", stringify!($ty), "`.\n\n# Errors\n\n[`Error::Underflow`] if too few bytes are unconsumed.")]
                pub fn $consume_be(&mut self) -> Result<$ty> {
                    Ok(<$ty>::from_be_bytes(self.consume_array()?))
                }

                #[doc = concat!("Consumes a little-endian `", stringify!($ty), "`.\n\n# Errors\n\n[`Error::Underflow`] if too few bytes are unconsumed.")]
                pub fn $consume_le(&mut self) -> Result<$ty> {
                    Ok(<$ty>::from_le_bytes(self.consume_array()?))
                }
            )*
        }
    };
}

typed_accessors! {
    u16 => store_u16, store_u16_be, store_u16_le, consume_u16, consume_u16_be, consume_u16_le;
    i16 => store_i16, store_i16_be, store_i16_le, consume_i16, consume_i16_be, consume_i16_le;
    u32 => store_u32, store_u32_be, store_u32_le, consume_u32, consume_u32_be, consume_u32_le;
    i32 => store_i32, store_i32_be, store_i32_le, consume_i32, consume_i32_be, consume_i32_le;
    u64 => store_u64, store_u64_be, store_u64_le, consume_u64, consume_u64_be, consume_u64_le;
    i64 => store_i64, store_i64_be, store_i64_le, consume_i64, consume_i64_be, consume_i64_le;
    f32 => store_f32, store_f32_be, store_f32_le, consume_f32, consume_f32_be, consume_f32_le;
    f64 => store_f64, store_f64_be, store_f64_le, consume_f64, consume_f64_be, consume_f64_le;
}

impl From<Vec<u8>> for ByteBuffer {
    /// Adopts `bytes` as the published region.
    fn from(bytes: Vec<u8>) -> Self {
        Self {
            write: bytes.len(),
            data: bytes,
            read: 0,
            min_growth: BufferOptions::default().min_growth,
        }
    }
}

impl From<&[u8]> for ByteBuffer {
    fn from(bytes: &[u8]) -> Self {
        Self::from(bytes.to_vec())
    }
}

impl Index<usize> for ByteBuffer {
    type Output = u8;

    /// Indexes the published region.
    ///
    /// # Panics
    ///
    /// If `index` is not below [`len`](ByteBuffer::len).
    fn index(&self, index: usize) -> &u8 {
        &self.as_slice()[index]
    }
}

impl AsRef<BStr> for ByteBuffer {
    fn as_ref(&self) -> &BStr {
        self.as_slice().as_bstr()
    }
}

impl io::Write for ByteBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.store_bytes(buf)
            .map_err(|e| io::Error::new(io::ErrorKind::OutOfMemory, e))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl io::Read for ByteBuffer {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(self.read_into(buf))
    }
}
