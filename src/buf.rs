extern crate alloc;

use {
    crate::{
        error::Result,
        io::{Read, Write},
    },
    alloc::vec,
    alloc::vec::Vec,
    core::cmp::min,
};

/// A growable buffer sized at runtime to hold one segment's
/// worth of plaintext or ciphertext.
///
/// Unlike a ring buffer, a [`Buf`] is filled once, drained once,
/// and then reset; that matches how the writer and reader use it
/// (accumulate a whole segment, then flush/authenticate it).
#[derive(Clone, Debug)]
pub(crate) struct Buf {
    /// Contents are data[read..write].
    data: Vec<u8>,
    /// Capacity this buffer is considered "full" at. May be
    /// smaller than `data.capacity()`.
    cap: usize,
    /// Read offset.
    read: usize,
    /// Write offset.
    write: usize,
}

impl Buf {
    /// Creates an empty buffer that holds up to `cap` bytes.
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            data: vec![0u8; cap],
            cap,
            read: 0,
            write: 0,
        }
    }

    /// Reports whether all bytes have been read.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reports whether the buffer is full and no more data can
    /// be written.
    pub fn is_full(&self) -> bool {
        self.write == self.cap
    }

    /// Returns the number of unread bytes in the buffer.
    pub fn len(&self) -> usize {
        self.write - self.read
    }

    /// Resets the buffer to empty, reusing its allocation. If
    /// `cap` differs from the current capacity, the buffer is
    /// resized.
    pub fn reset_to(&mut self, cap: usize) {
        self.read = 0;
        self.write = 0;
        self.cap = cap;
        if self.data.len() < cap {
            self.data.resize(cap, 0);
        }
    }

    /// Discards all but the first n unread bytes in the buffer.
    pub fn truncate(&mut self, n: usize) {
        if n == 0 {
            self.read = 0;
            self.write = 0;
            return;
        }
        self.write = self.read + n;
    }

    /// Returns the buffer's remaining capacity.
    pub fn remaining_capacity_mut(&mut self) -> &mut [u8] {
        &mut self.data[self.write..self.cap]
    }

    /// Returns the unread portion of the buffer.
    pub fn remaining_slice(&self) -> &[u8] {
        &self.data[self.read..self.write]
    }

    /// Returns the unread portion of the buffer as a mutable
    /// slice.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data[self.read..self.write]
    }

    /// Splits the unread portion of the buffer at mid, returning
    /// [0, mid) and [mid, N).
    pub fn split_at_mut(&mut self, mid: usize) -> (&mut [u8], &mut [u8]) {
        self.as_mut_slice().split_at_mut(mid)
    }

    /// Reads from `src` until the buffer is full or `src`
    /// reaches EOF.
    pub fn read_from<R: Read + ?Sized>(
        &mut self,
        src: &mut R,
    ) -> Result<usize> {
        let mut n = 0;
        while !self.is_full() {
            let m = src.read(self.remaining_capacity_mut())?;
            if m == 0 {
                break;
            }
            self.write += m;
            n += m;
        }
        Ok(n)
    }

    /// Writes the entire contents of the buffer to `dst`.
    pub fn write_to<W: Write + ?Sized>(
        &mut self,
        dst: &mut W,
    ) -> Result<usize> {
        let start = self.read;
        while !self.is_empty() {
            let m = dst.write(self.remaining_slice())?;
            if m == 0 {
                break;
            }
            self.read += m;
        }
        let n = self.read - start;
        if n == 0 {
            self.read = 0;
            self.write = 0;
        }
        Ok(n)
    }
}

impl Drop for Buf {
    fn drop(&mut self) {
        self.data.fill(0);
    }
}

impl Read for Buf {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let src = self.remaining_slice();
        let n = min(src.len(), buf.len());
        buf[..n].copy_from_slice(&src[..n]);
        self.read += n;
        Ok(n)
    }
}

impl Write for Buf {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        let dst = self.remaining_capacity_mut();
        let n = min(dst.len(), buf.len());
        (dst[..n]).copy_from_slice(&buf[..n]);
        self.write += n;
        Ok(n)
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}
