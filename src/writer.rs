//! The encrypting writer: a write-side state machine that
//! buffers plaintext, emits one authenticated segment per full
//! buffer, and finalizes the stream on [`Writer::close`].

extern crate alloc;

use {
    crate::{
        buf::Buf,
        cipher::SegmentCipher,
        error::{Error, Result},
        header,
        io::Write,
        nonce::{self, NONCE_PREFIX_SIZE},
    },
    alloc::vec::Vec,
};

#[derive(Clone, Copy, Eq, PartialEq)]
enum State {
    /// The header has not yet been emitted.
    Fresh,
    /// The header has been emitted; segments may be written.
    Active,
    /// [`Writer::close`] has run successfully.
    Closed,
    /// An earlier operation failed; the stream is unusable.
    Poisoned,
}

/// Encrypts a stream, segment by segment, as bytes are written
/// to it.
///
/// Created by [`crate::AesGcmHkdf::new_encrypting_writer`].
pub struct Writer<'a, W: Write + 'a> {
    sink: &'a mut W,
    cipher: SegmentCipher,
    nonce_prefix: [u8; NONCE_PREFIX_SIZE],
    salt: Vec<u8>,
    counter: u32,
    buf: Buf,
    first_plaintext_segment_size: usize,
    plaintext_segment_size: usize,
    state: State,
}

impl<'a, W: Write + 'a> Writer<'a, W> {
    pub(crate) fn new(
        sink: &'a mut W,
        cipher: SegmentCipher,
        nonce_prefix: [u8; NONCE_PREFIX_SIZE],
        salt: Vec<u8>,
        first_plaintext_segment_size: usize,
        plaintext_segment_size: usize,
    ) -> Self {
        Self {
            sink,
            cipher,
            nonce_prefix,
            salt,
            counter: 0,
            buf: Buf::with_capacity(0),
            first_plaintext_segment_size,
            plaintext_segment_size,
            state: State::Fresh,
        }
    }

    /// Writes `buf` to the stream, encrypting and emitting any
    /// segments it fills along the way.
    ///
    /// Returns the number of bytes consumed, which is always
    /// `buf.len()` on success: the writer either buffers or
    /// flushes every byte it accepts.
    pub fn write(&mut self, buf: &[u8]) -> Result<usize> {
        match self.do_write(buf) {
            Ok(n) => Ok(n),
            Err(err) => {
                self.state = State::Poisoned;
                Err(err)
            }
        }
    }

    /// Writes `buf` in its entirety, per [`crate::io::Write::write_all`].
    pub fn write_all(&mut self, mut buf: &[u8]) -> Result<()> {
        while !buf.is_empty() {
            match self.write(buf) {
                Ok(0) => return Err(Error::ShortWrite(0)),
                Ok(n) => buf = &buf[n..],
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    /// Encrypts and emits the final segment (which may be
    /// empty), and finalizes the stream. Further writes or
    /// closes fail with [`Error::State`].
    pub fn close(&mut self) -> Result<()> {
        match self.do_close() {
            Ok(()) => Ok(()),
            Err(err) => {
                self.state = State::Poisoned;
                Err(err)
            }
        }
    }

    fn ensure_active(&mut self) -> Result<()> {
        match self.state {
            State::Active => Ok(()),
            State::Fresh => {
                header::write(self.sink, &self.salt, &self.nonce_prefix)?;
                self.buf =
                    Buf::with_capacity(self.first_plaintext_segment_size);
                self.state = State::Active;
                Ok(())
            }
            State::Closed => Err(Error::State("writer is closed")),
            State::Poisoned => Err(Error::State("writer is poisoned")),
        }
    }

    fn do_write(&mut self, mut buf: &[u8]) -> Result<usize> {
        self.ensure_active()?;
        let total = buf.len();
        while !buf.is_empty() {
            let n = self.buf.write(buf)?;
            buf = &buf[n..];
            if self.buf.is_full() {
                self.flush_segment(false)?;
            }
        }
        Ok(total)
    }

    fn do_close(&mut self) -> Result<()> {
        match self.state {
            State::Closed => {
                return Err(Error::State("writer already closed"))
            }
            State::Poisoned => {
                return Err(Error::State("writer is poisoned"))
            }
            _ => {}
        }
        self.ensure_active()?;
        self.flush_segment(true)?;
        self.state = State::Closed;
        Ok(())
    }

    /// Encrypts the buffer's current contents with the nonce for
    /// `self.counter`, flagged last or not, and writes
    /// `ciphertext ‖ tag` to the sink.
    fn flush_segment(&mut self, last: bool) -> Result<()> {
        let nonce = nonce::build(&self.nonce_prefix, self.counter, last);
        let tag = self
            .cipher
            .encrypt_in_place_detached(&nonce, self.buf.as_mut_slice())?;
        self.buf.write_to(self.sink)?;
        self.sink.write_all(&tag)?;
        if !last {
            self.counter = nonce::next_counter(self.counter)?;
            self.buf.reset_to(self.plaintext_segment_size);
        }
        Ok(())
    }
}

#[cfg(feature = "std")]
impl<W: Write> std::io::Write for Writer<'_, W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        crate::error::map_res(Writer::write(self, buf))
    }

    /// Finalizes the stream, the same as [`Writer::close`].
    ///
    /// `std::io::Write::flush` has no "finalize" concept of its
    /// own, so calling `flush` here closes the stream instead.
    fn flush(&mut self) -> std::io::Result<()> {
        crate::error::map_res(Writer::close(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::AesGcmHkdf;
    use rand_core::OsRng;

    #[test]
    fn test_double_close_errors() {
        let params =
            AesGcmHkdf::new(&[7u8; 32], "SHA256", 16, 256, 0).unwrap();
        let mut sink = Vec::new();
        let mut rng = OsRng;
        let mut w = params
            .new_encrypting_writer(&mut sink, &mut rng, b"aad")
            .unwrap();
        w.close().unwrap();
        assert!(matches!(w.close(), Err(Error::State(_))));
    }

    #[test]
    fn test_write_after_close_errors() {
        let params =
            AesGcmHkdf::new(&[7u8; 32], "SHA256", 16, 256, 0).unwrap();
        let mut sink = Vec::new();
        let mut rng = OsRng;
        let mut w = params
            .new_encrypting_writer(&mut sink, &mut rng, b"aad")
            .unwrap();
        w.close().unwrap();
        assert!(matches!(w.write(b"x"), Err(Error::State(_))));
    }

    #[test]
    fn test_empty_stream_is_header_plus_tag() {
        let params =
            AesGcmHkdf::new(&[7u8; 32], "SHA256", 16, 256, 0).unwrap();
        let mut sink = Vec::new();
        let mut rng = OsRng;
        let mut w = params
            .new_encrypting_writer(&mut sink, &mut rng, b"aad")
            .unwrap();
        w.close().unwrap();
        assert_eq!(sink.len(), params.header_length() + 16);
    }
}
