//! Per-segment nonce construction.

use {
    crate::error::{Error, Result},
    byteorder::{BigEndian, ByteOrder},
};

/// Size of the random per-stream nonce prefix, in bytes.
pub const NONCE_PREFIX_SIZE: usize = 7;

/// Size of a segment's AES-GCM nonce, in bytes:
/// `nonce_prefix(7) ‖ counter_be32(4) ‖ last_flag(1)`.
pub const NONCE_SIZE: usize = NONCE_PREFIX_SIZE + 4 + 1;

const CTR_START: usize = NONCE_PREFIX_SIZE;
const CTR_END: usize = CTR_START + 4;
const LAST_FLAG_IDX: usize = NONCE_SIZE - 1;

/// Builds the 12-byte nonce for segment `counter`, setting the
/// last-segment flag when `last` is true.
pub(crate) fn build(
    prefix: &[u8; NONCE_PREFIX_SIZE],
    counter: u32,
    last: bool,
) -> [u8; NONCE_SIZE] {
    let mut nonce = [0u8; NONCE_SIZE];
    nonce[..NONCE_PREFIX_SIZE].copy_from_slice(prefix);
    BigEndian::write_u32(&mut nonce[CTR_START..CTR_END], counter);
    nonce[LAST_FLAG_IDX] = last as u8;
    nonce
}

/// Increments a segment counter, failing if doing so would
/// overflow a 32-bit counter.
pub(crate) fn next_counter(counter: u32) -> Result<u32> {
    counter.checked_add(1).ok_or(Error::CounterOverflow)
}
