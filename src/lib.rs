//! Streaming AES-GCM-HKDF authenticated encryption.
//!
//! This crate encrypts a plaintext stream as a sequence of
//! independently authenticated segments. A single, long-lived
//! input keying material (IKM) is combined with a random
//! per-stream salt through HKDF to derive a fresh AES-GCM key for
//! each stream, so the same IKM can be reused across any number
//! of streams without the operator managing per-stream keys
//! themselves.
//!
//! Within a stream, every segment is encrypted with a nonce built
//! from a random per-stream prefix, a monotonically increasing
//! 32-bit counter, and a one-byte flag marking the stream's final
//! segment. The flag is what lets a [`Reader`] detect truncation:
//! without it, an attacker could drop the stream's tail and the
//! recipient would have no way to tell the difference from a
//! shorter, legitimately-terminated stream.
//!
//! ```
//! use segment_stream_aead::AesGcmHkdf;
//! use rand_core::OsRng;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let ikm = [0x42u8; 32];
//! let params = AesGcmHkdf::new(&ikm, "SHA256", 16, 4096, 0)?;
//!
//! let mut ciphertext = Vec::new();
//! let mut rng = OsRng;
//! let mut w = params.new_encrypting_writer(&mut ciphertext, &mut rng, b"")?;
//! w.write_all(b"hello, streaming world")?;
//! w.close()?;
//!
//! let mut source = &ciphertext[..];
//! let mut r = params.new_decrypting_reader(&mut source, b"")?;
//! let mut plaintext = Vec::new();
//! let mut buf = [0u8; 64];
//! loop {
//!     let n = r.read(&mut buf)?;
//!     if n == 0 {
//!         break;
//!     }
//!     plaintext.extend_from_slice(&buf[..n]);
//! }
//! assert_eq!(plaintext, b"hello, streaming world");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]
#![cfg_attr(not(any(feature = "std", test)), no_std)]

mod buf;
mod cipher;
mod error;
mod hash;
mod header;
mod io;
mod nonce;
mod params;
mod reader;
mod writer;

pub use error::{Error, OtherError, Result};
pub use hash::HashAlg;
pub use io::{Read, Write};
pub use params::AesGcmHkdf;
pub use reader::Reader;
pub use writer::Writer;
