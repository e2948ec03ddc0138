//! Stream header encode/decode.
//!
//! ```text
//! byte 0:           header_length (single byte)
//! bytes 1..=K:      salt (K = derived_key_size)
//! bytes K+1..K+7:   nonce_prefix (7 bytes)
//! ```

extern crate alloc;

use crate::{
    error::{Error, Result},
    io::{Read, Write},
    nonce::NONCE_PREFIX_SIZE,
};

/// Computes the header length for a given derived key size.
pub(crate) const fn header_length(derived_key_size: usize) -> usize {
    1 + derived_key_size + NONCE_PREFIX_SIZE
}

/// Writes `header_length ‖ salt ‖ nonce_prefix` to `dst`.
pub(crate) fn write<W: Write + ?Sized>(
    dst: &mut W,
    salt: &[u8],
    nonce_prefix: &[u8; NONCE_PREFIX_SIZE],
) -> Result<()> {
    let len = header_length(salt.len());
    let len: u8 = len
        .try_into()
        .map_err(|_| Error::Configuration("header length too large"))?;
    dst.write_all(&[len])?;
    dst.write_all(salt)?;
    dst.write_all(nonce_prefix)?;
    Ok(())
}

/// Reads and validates a header from `src`, returning the salt
/// and nonce prefix. `derived_key_size` is the expected salt
/// length; any mismatch between the stream's length byte and
/// the expected header length is a [`Error::MalformedHeader`].
pub(crate) fn read<R: Read + ?Sized>(
    src: &mut R,
    derived_key_size: usize,
) -> Result<(alloc::vec::Vec<u8>, [u8; NONCE_PREFIX_SIZE])> {
    let expected = header_length(derived_key_size);

    let mut len_byte = [0u8; 1];
    src.read_exact(&mut len_byte).map_err(header_read_err)?;
    if len_byte[0] as usize != expected {
        return Err(Error::MalformedHeader);
    }

    let mut salt = alloc::vec![0u8; derived_key_size];
    src.read_exact(&mut salt).map_err(header_read_err)?;

    let mut nonce_prefix = [0u8; NONCE_PREFIX_SIZE];
    src.read_exact(&mut nonce_prefix).map_err(header_read_err)?;

    Ok((salt, nonce_prefix))
}

fn header_read_err(err: Error) -> Error {
    match err {
        Error::UnexpectedEof(_) => Error::MalformedHeader,
        other => other,
    }
}
