//! The decrypting reader: a read-side state machine that parses
//! the header lazily, then authenticates and decrypts one segment
//! at a time, in strict order.
//!
//! Telling whether a segment is the stream's last one — without
//! ever authenticating the same bytes twice, which would hand an
//! attacker a padding-oracle-style timing signal — requires
//! reading one byte past what a full segment would need. See
//! [`Reader::read_segment`].

extern crate alloc;

use {
    crate::{
        buf::Buf,
        cipher::{SegmentCipher, TAG_SIZE},
        error::{Error, Result},
        header,
        io::{Read, Write},
        nonce::{self, NONCE_PREFIX_SIZE},
        params::AesGcmHkdf,
    },
    alloc::vec::Vec,
};

#[derive(Clone, Copy, Eq, PartialEq)]
enum State {
    /// The header has not yet been parsed.
    Fresh,
    /// Segments are being authenticated and decrypted in order.
    Reading,
    /// The last segment has been consumed; further reads yield EOF.
    Done,
    /// An earlier operation failed; the stream is unusable.
    Poisoned,
}

/// Decrypts a stream, segment by segment, as bytes are read from
/// it.
///
/// Created by [`crate::AesGcmHkdf::new_decrypting_reader`].
pub struct Reader<'a, R: Read + 'a> {
    source: &'a mut R,
    params: AesGcmHkdf,
    aad: Vec<u8>,
    cipher: Option<SegmentCipher>,
    nonce_prefix: [u8; NONCE_PREFIX_SIZE],
    counter: u32,
    /// Plaintext decrypted from the most recent segment, awaiting
    /// delivery to the caller.
    out: Buf,
    /// A single byte read past the end of the previous segment's
    /// ciphertext, carried forward into the next call to
    /// [`Reader::read_segment`].
    pending: Option<u8>,
    state: State,
}

impl<'a, R: Read + 'a> Reader<'a, R> {
    pub(crate) fn new(source: &'a mut R, params: AesGcmHkdf, aad: Vec<u8>) -> Self {
        Self {
            source,
            params,
            aad,
            cipher: None,
            nonce_prefix: [0u8; NONCE_PREFIX_SIZE],
            counter: 0,
            out: Buf::with_capacity(0),
            pending: None,
            state: State::Fresh,
        }
    }

    /// Reads decrypted plaintext into `buf`, returning the number
    /// of bytes written. Returns `Ok(0)` at end of stream.
    ///
    /// Fails with [`Error::Authentication`] on the first segment
    /// whose tag does not verify, which covers truncation,
    /// extension, reordering, and bit-flipping of the ciphertext.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        match self.do_read(buf) {
            Ok(n) => Ok(n),
            Err(err) => {
                self.state = State::Poisoned;
                Err(err)
            }
        }
    }

    fn ensure_header(&mut self) -> Result<()> {
        match self.state {
            State::Fresh => {
                let (salt, nonce_prefix) =
                    header::read(self.source, self.params.derived_key_size())?;
                let derived_key = self.params.derive_key(&salt, &self.aad)?;
                self.cipher = Some(SegmentCipher::new(&derived_key));
                self.nonce_prefix = nonce_prefix;
                self.state = State::Reading;
                Ok(())
            }
            State::Reading | State::Done => Ok(()),
            State::Poisoned => Err(Error::State("reader is poisoned")),
        }
    }

    fn do_read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        self.ensure_header()?;
        loop {
            let n = self.out.read(buf)?;
            if n > 0 {
                return Ok(n);
            }
            if self.state == State::Done {
                return Ok(0);
            }
            self.read_segment()?;
        }
    }

    /// Authenticates and decrypts the next segment, appending its
    /// plaintext to `self.out`.
    ///
    /// A segment is the stream's last one exactly when fewer than
    /// `expected + 1` ciphertext bytes are available: reading one
    /// byte beyond a full segment's size is the only way to learn
    /// that without first attempting (and potentially failing) an
    /// authentication with the wrong nonce flag.
    fn read_segment(&mut self) -> Result<()> {
        let expected = if self.counter == 0 {
            self.params.first_ciphertext_segment_size()
        } else {
            self.params.segment_size()
        };

        let mut attempt = Buf::with_capacity(expected + 1);
        if let Some(byte) = self.pending.take() {
            attempt.write(&[byte])?;
        }
        attempt.read_from(self.source)?;

        let total = attempt.len();
        if total < TAG_SIZE {
            return Err(Error::Authentication);
        }

        if total > expected {
            let (segment, extra) = attempt.split_at_mut(expected);
            let carry = extra[0];
            self.decrypt_segment(segment, false)?;
            self.pending = Some(carry);
            self.counter = nonce::next_counter(self.counter)?;
        } else {
            self.decrypt_segment(attempt.as_mut_slice(), true)?;
            self.state = State::Done;
        }
        Ok(())
    }

    fn decrypt_segment(&mut self, segment: &mut [u8], last: bool) -> Result<()> {
        let len = segment.len();
        let (ciphertext, tag) = segment.split_at_mut(len - TAG_SIZE);
        let mut detached_tag = [0u8; TAG_SIZE];
        detached_tag.copy_from_slice(tag);

        let nonce = nonce::build(&self.nonce_prefix, self.counter, last);
        self.cipher
            .as_ref()
            .expect("header parsed before any segment is read")
            .decrypt_in_place_detached(&nonce, ciphertext, &detached_tag)?;

        self.out.reset_to(ciphertext.len());
        self.out.write(ciphertext)?;
        Ok(())
    }
}

#[cfg(feature = "std")]
impl<R: Read> std::io::Read for Reader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        crate::error::map_res(Reader::read(self, buf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::AesGcmHkdf;
    use rand_core::OsRng;

    fn read_to_end<R: Read>(r: &mut Reader<'_, R>) -> Vec<u8> {
        let mut out = Vec::new();
        let mut chunk = [0u8; 7];
        loop {
            let n = r.read(&mut chunk).unwrap();
            if n == 0 {
                break;
            }
            out.extend_from_slice(&chunk[..n]);
        }
        out
    }

    fn round_trip(plaintext: &[u8], segment_size: usize, offset: usize) -> Vec<u8> {
        let params = AesGcmHkdf::new(&[9u8; 32], "SHA256", 16, segment_size, offset).unwrap();
        let mut sink = Vec::new();
        let mut rng = OsRng;
        {
            let mut w = params
                .new_encrypting_writer(&mut sink, &mut rng, b"aad")
                .unwrap();
            w.write_all(plaintext).unwrap();
            w.close().unwrap();
        }
        let mut source = &sink[..];
        let mut r = params
            .new_decrypting_reader(&mut source, b"aad")
            .unwrap();
        read_to_end(&mut r)
    }

    #[test]
    fn test_round_trip_empty() {
        assert_eq!(round_trip(b"", 256, 0), b"");
    }

    #[test]
    fn test_round_trip_single_segment() {
        let pt = b"a short message";
        assert_eq!(round_trip(pt, 256, 0), pt.to_vec());
    }

    #[test]
    fn test_round_trip_multi_segment() {
        let pt: Vec<u8> = (0..2000u32).map(|i| (i % 251) as u8).collect();
        assert_eq!(round_trip(&pt, 256, 0), pt);
    }

    #[test]
    fn test_round_trip_with_first_segment_offset() {
        let pt: Vec<u8> = (0..2000u32).map(|i| (i % 251) as u8).collect();
        assert_eq!(round_trip(&pt, 256, 100), pt);
    }

    #[test]
    fn test_truncated_stream_fails_authentication() {
        let params = AesGcmHkdf::new(&[9u8; 32], "SHA256", 16, 256, 0).unwrap();
        let mut sink = Vec::new();
        let mut rng = OsRng;
        let pt: Vec<u8> = (0..2000u32).map(|i| (i % 251) as u8).collect();
        {
            let mut w = params
                .new_encrypting_writer(&mut sink, &mut rng, b"aad")
                .unwrap();
            w.write_all(&pt).unwrap();
            w.close().unwrap();
        }
        sink.truncate(sink.len() - 1);
        let mut source = &sink[..];
        let mut r = params
            .new_decrypting_reader(&mut source, b"aad")
            .unwrap();
        let mut out = Vec::new();
        let mut chunk = [0u8; 7];
        let result = loop {
            match r.read(&mut chunk) {
                Ok(0) => break Ok(()),
                Ok(n) => out.extend_from_slice(&chunk[..n]),
                Err(err) => break Err(err),
            }
        };
        assert!(matches!(result, Err(Error::Authentication)));
    }

    #[test]
    fn test_extended_stream_fails_authentication() {
        let params = AesGcmHkdf::new(&[9u8; 32], "SHA256", 16, 256, 0).unwrap();
        let mut sink = Vec::new();
        let mut rng = OsRng;
        {
            let mut w = params
                .new_encrypting_writer(&mut sink, &mut rng, b"aad")
                .unwrap();
            w.write_all(b"short message").unwrap();
            w.close().unwrap();
        }
        sink.push(0);
        let mut source = &sink[..];
        let mut r = params
            .new_decrypting_reader(&mut source, b"aad")
            .unwrap();
        let mut chunk = [0u8; 32];
        let result = loop {
            match r.read(&mut chunk) {
                Ok(0) => break Ok(()),
                Ok(_) => {}
                Err(err) => break Err(err),
            }
        };
        assert!(matches!(result, Err(Error::Authentication)));
    }

    #[test]
    fn test_bit_flip_fails_authentication() {
        let params = AesGcmHkdf::new(&[9u8; 32], "SHA256", 16, 256, 0).unwrap();
        let mut sink = Vec::new();
        let mut rng = OsRng;
        let pt: Vec<u8> = (0..2000u32).map(|i| (i % 251) as u8).collect();
        {
            let mut w = params
                .new_encrypting_writer(&mut sink, &mut rng, b"aad")
                .unwrap();
            w.write_all(&pt).unwrap();
            w.close().unwrap();
        }
        let flip_at = sink.len() - 20;
        sink[flip_at] ^= 1;
        let mut source = &sink[..];
        let mut r = params
            .new_decrypting_reader(&mut source, b"aad")
            .unwrap();
        let mut out = Vec::new();
        let mut chunk = [0u8; 7];
        let result = loop {
            match r.read(&mut chunk) {
                Ok(0) => break Ok(()),
                Ok(n) => out.extend_from_slice(&chunk[..n]),
                Err(err) => break Err(err),
            }
        };
        assert!(matches!(result, Err(Error::Authentication)));
    }

    #[test]
    fn test_wrong_aad_fails_authentication() {
        let params = AesGcmHkdf::new(&[9u8; 32], "SHA256", 16, 256, 0).unwrap();
        let mut sink = Vec::new();
        let mut rng = OsRng;
        {
            let mut w = params
                .new_encrypting_writer(&mut sink, &mut rng, b"correct aad")
                .unwrap();
            w.write_all(b"payload").unwrap();
            w.close().unwrap();
        }
        let mut source = &sink[..];
        let mut r = params
            .new_decrypting_reader(&mut source, b"wrong aad")
            .unwrap();
        let mut chunk = [0u8; 32];
        assert!(matches!(r.read(&mut chunk), Err(Error::Authentication)));
    }

    #[test]
    fn test_read_after_done_returns_eof() {
        let params = AesGcmHkdf::new(&[9u8; 32], "SHA256", 16, 256, 0).unwrap();
        let mut sink = Vec::new();
        let mut rng = OsRng;
        {
            let mut w = params
                .new_encrypting_writer(&mut sink, &mut rng, b"aad")
                .unwrap();
            w.write_all(b"hi").unwrap();
            w.close().unwrap();
        }
        let mut source = &sink[..];
        let mut r = params
            .new_decrypting_reader(&mut source, b"aad")
            .unwrap();
        let mut chunk = [0u8; 32];
        let mut total = 0;
        loop {
            let n = r.read(&mut chunk).unwrap();
            if n == 0 {
                break;
            }
            total += n;
        }
        assert_eq!(total, 2);
        assert_eq!(r.read(&mut chunk).unwrap(), 0);
    }
}
