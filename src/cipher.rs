//! Per-segment AES-GCM encryption/decryption.
//!
//! Associated data is never passed to AES-GCM here: it is bound
//! into the stream exclusively through HKDF's `info` argument
//! (see [`crate::hash`]), so every segment is encrypted/decrypted
//! with an empty AAD.

extern crate alloc;

use {
    crate::{error::Result, nonce::NONCE_SIZE},
    aead::AeadInPlace,
    aes_gcm::{Aes128Gcm, Aes256Gcm, KeyInit},
    alloc::boxed::Box,
    generic_array::GenericArray,
};

/// The AES-GCM tag size, in bytes.
pub const TAG_SIZE: usize = 16;

/// The two derived-key sizes this primitive supports.
#[derive(Clone)]
pub(crate) enum SegmentCipher {
    Aes128(Box<Aes128Gcm>),
    Aes256(Box<Aes256Gcm>),
}

impl SegmentCipher {
    /// Builds a segment cipher from a derived key of length 16
    /// or 32 bytes. The caller has already validated the length.
    pub fn new(derived_key: &[u8]) -> Self {
        match derived_key.len() {
            16 => SegmentCipher::Aes128(Box::new(Aes128Gcm::new(
                GenericArray::from_slice(derived_key),
            ))),
            32 => SegmentCipher::Aes256(Box::new(Aes256Gcm::new(
                GenericArray::from_slice(derived_key),
            ))),
            n => unreachable!("validated derived key size, got {}", n),
        }
    }

    /// Encrypts `buf` in place and returns the detached 16-byte
    /// tag. `buf` is left holding the ciphertext of equal length
    /// to the plaintext it held on entry.
    pub fn encrypt_in_place_detached(
        &self,
        nonce: &[u8; NONCE_SIZE],
        buf: &mut [u8],
    ) -> Result<[u8; TAG_SIZE]> {
        let nonce = GenericArray::from_slice(nonce);
        let tag = match self {
            SegmentCipher::Aes128(k) => {
                k.encrypt_in_place_detached(nonce, &[], buf)?
            }
            SegmentCipher::Aes256(k) => {
                k.encrypt_in_place_detached(nonce, &[], buf)?
            }
        };
        let mut out = [0u8; TAG_SIZE];
        out.copy_from_slice(tag.as_slice());
        Ok(out)
    }

    /// Decrypts `buf` in place against the detached `tag`,
    /// authenticating both. Fails with [`crate::Error::Authentication`]
    /// on any tag mismatch.
    pub fn decrypt_in_place_detached(
        &self,
        nonce: &[u8; NONCE_SIZE],
        buf: &mut [u8],
        tag: &[u8; TAG_SIZE],
    ) -> Result<()> {
        let nonce = GenericArray::from_slice(nonce);
        let tag = GenericArray::from_slice(tag);
        match self {
            SegmentCipher::Aes128(k) => {
                k.decrypt_in_place_detached(nonce, &[], buf, tag)?
            }
            SegmentCipher::Aes256(k) => {
                k.decrypt_in_place_detached(nonce, &[], buf, tag)?
            }
        }
        Ok(())
    }
}
