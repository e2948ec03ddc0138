//! The streaming AEAD primitive: validated construction
//! parameters plus the writer/reader factory.

extern crate alloc;

use {
    crate::{
        cipher::{SegmentCipher, TAG_SIZE},
        error::{Error, Result},
        hash::HashAlg,
        header,
        io::{Read, Write},
        nonce::NONCE_PREFIX_SIZE,
        reader::Reader,
        writer::Writer,
    },
    alloc::vec::Vec,
    rand_core::{CryptoRng, RngCore},
};

/// The two derived AES key sizes this primitive supports.
const VALID_KEY_SIZES: [usize; 2] = [16, 32];

/// A freshly HKDF-derived AES key, zeroized on drop.
///
/// The key only ever lives long enough to seed a [`SegmentCipher`];
/// zeroizing it here keeps that short-lived copy from lingering in
/// memory after the cipher has its own copy.
pub(crate) struct DerivedKey(Vec<u8>);

impl core::ops::Deref for DerivedKey {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl Drop for DerivedKey {
    fn drop(&mut self) {
        #[cfg(feature = "zeroize")]
        {
            use zeroize::Zeroize;
            self.0.zeroize();
        }
        #[cfg(not(feature = "zeroize"))]
        self.0.fill(0);
    }
}

/// `AesGcmHkdf` is the streaming AEAD primitive: AES-GCM keyed by
/// a per-stream key HKDF-derives from a long-lived `ikm`.
///
/// Construct one with [`AesGcmHkdf::new`], then spin up as many
/// [`Writer`]s and [`Reader`]s from it as needed; each gets its
/// own random salt and nonce prefix, so streams never share key
/// material even though they share `ikm`.
#[derive(Clone)]
pub struct AesGcmHkdf {
    ikm: Vec<u8>,
    hash: HashAlg,
    derived_key_size: usize,
    segment_size: usize,
    first_segment_offset: usize,
    header_length: usize,
    plaintext_segment_size: usize,
    first_ciphertext_segment_size: usize,
    first_plaintext_segment_size: usize,
}

impl AesGcmHkdf {
    /// Validates `ikm`, `hash_name`, `derived_key_size`,
    /// `segment_size`, and `first_segment_offset`, and builds a
    /// primitive from them.
    ///
    /// `hash_name` must be one of `"SHA1"`, `"SHA256"`,
    /// `"SHA512"`.
    pub fn new(
        ikm: &[u8],
        hash_name: &str,
        derived_key_size: usize,
        segment_size: usize,
        first_segment_offset: usize,
    ) -> Result<Self> {
        if !VALID_KEY_SIZES.contains(&derived_key_size) {
            return Err(Error::Configuration(
                "derived_key_size must be 16 or 32",
            ));
        }
        if ikm.len() < derived_key_size {
            return Err(Error::Configuration(
                "ikm is shorter than derived_key_size",
            ));
        }
        let hash = HashAlg::from_name(hash_name)?;

        let header_length = header::header_length(derived_key_size);
        if segment_size <= header_length + TAG_SIZE {
            return Err(Error::Configuration(
                "segment_size must exceed header_length + tag_size",
            ));
        }
        if segment_size <= first_segment_offset + header_length + TAG_SIZE {
            return Err(Error::Configuration(
                "first_segment_offset leaves no room for a first segment",
            ));
        }

        let first_ciphertext_segment_size =
            segment_size - header_length - first_segment_offset;

        Ok(Self {
            ikm: ikm.to_vec(),
            hash,
            derived_key_size,
            segment_size,
            first_segment_offset,
            header_length,
            plaintext_segment_size: segment_size - TAG_SIZE,
            first_ciphertext_segment_size,
            first_plaintext_segment_size: first_ciphertext_segment_size
                - TAG_SIZE,
        })
    }

    /// The length, in bytes, of the stream header.
    pub fn header_length(&self) -> usize {
        self.header_length
    }

    /// The size, in bytes, this primitive was configured with
    /// for every non-final ciphertext segment.
    pub fn segment_size(&self) -> usize {
        self.segment_size
    }

    pub(crate) fn derive_key(&self, salt: &[u8], aad: &[u8]) -> Result<DerivedKey> {
        let mut key = alloc::vec![0u8; self.derived_key_size];
        self.hash.hkdf_expand(&self.ikm, salt, aad, &mut key)?;
        Ok(DerivedKey(key))
    }

    /// Creates a [`Writer`] that AES-GCM-encrypts everything
    /// written to it and writes the resulting ciphertext to
    /// `sink`. `rng` supplies the per-stream salt and nonce
    /// prefix; it is consulted exactly once, here.
    pub fn new_encrypting_writer<'a, W, R>(
        &self,
        sink: &'a mut W,
        rng: &mut R,
        associated_data: &[u8],
    ) -> Result<Writer<'a, W>>
    where
        W: Write + 'a,
        R: RngCore + CryptoRng,
    {
        let mut salt = alloc::vec![0u8; self.derived_key_size];
        rng.try_fill_bytes(&mut salt)?;

        let mut nonce_prefix = [0u8; NONCE_PREFIX_SIZE];
        rng.try_fill_bytes(&mut nonce_prefix)?;

        let derived_key = self.derive_key(&salt, associated_data)?;
        let cipher = SegmentCipher::new(&derived_key);

        Ok(Writer::new(
            sink,
            cipher,
            nonce_prefix,
            salt,
            self.first_plaintext_segment_size,
            self.plaintext_segment_size,
        ))
    }

    /// Creates a [`Reader`] that authenticates and decrypts
    /// ciphertext pulled from `source`. The header is parsed and
    /// the key derived lazily, on the first read.
    pub fn new_decrypting_reader<'a, R>(
        &self,
        source: &'a mut R,
        associated_data: &[u8],
    ) -> Result<Reader<'a, R>>
    where
        R: Read + 'a,
    {
        Ok(Reader::new(
            source,
            self.clone(),
            associated_data.to_vec(),
        ))
    }

    pub(crate) fn derived_key_size(&self) -> usize {
        self.derived_key_size
    }

    pub(crate) fn first_ciphertext_segment_size(&self) -> usize {
        self.first_ciphertext_segment_size
    }
}

impl Drop for AesGcmHkdf {
    fn drop(&mut self) {
        #[cfg(feature = "zeroize")]
        {
            use zeroize::Zeroize;
            self.ikm.zeroize();
        }
        #[cfg(not(feature = "zeroize"))]
        self.ikm.fill(0);
    }
}
