//! HKDF key derivation, dispatched over the hash named at
//! construction time.

use {
    crate::error::{Error, Result},
    hkdf::Hkdf,
};

/// Identifies the hash function HKDF is instantiated with.
///
/// SHA-256 is mandatory; SHA-1 and SHA-512 are accepted for
/// interoperability with callers that have already standardized
/// on them elsewhere.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum HashAlg {
    /// SHA-1. Accepted, but SHA-256 or SHA-512 should be
    /// preferred for new streams.
    Sha1,
    /// SHA-256. The mandatory default.
    Sha256,
    /// SHA-512.
    Sha512,
}

impl HashAlg {
    /// Parses a hash name from the set `{"SHA1", "SHA256",
    /// "SHA512"}`.
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "SHA1" => Ok(HashAlg::Sha1),
            "SHA256" => Ok(HashAlg::Sha256),
            "SHA512" => Ok(HashAlg::Sha512),
            _ => Err(Error::Configuration(
                "unsupported hash, want one of SHA1, SHA256, SHA512",
            )),
        }
    }

    /// Derives `out.len()` bytes of key material from `ikm`,
    /// `salt`, and `info` via HKDF-extract-then-expand over this
    /// hash.
    pub fn hkdf_expand(
        &self,
        ikm: &[u8],
        salt: &[u8],
        info: &[u8],
        out: &mut [u8],
    ) -> Result<()> {
        match self {
            HashAlg::Sha1 => {
                Hkdf::<sha1::Sha1>::new(Some(salt), ikm).expand(info, out)?;
            }
            HashAlg::Sha256 => {
                Hkdf::<sha2::Sha256>::new(Some(salt), ikm)
                    .expand(info, out)?;
            }
            HashAlg::Sha512 => {
                Hkdf::<sha2::Sha512>::new(Some(salt), ikm)
                    .expand(info, out)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name() {
        assert_eq!(HashAlg::from_name("SHA1").unwrap(), HashAlg::Sha1);
        assert_eq!(HashAlg::from_name("SHA256").unwrap(), HashAlg::Sha256);
        assert_eq!(HashAlg::from_name("SHA512").unwrap(), HashAlg::Sha512);
        assert!(HashAlg::from_name("MD5").is_err());
    }

    #[test]
    fn test_hkdf_expand_deterministic() {
        let ikm = [0x42u8; 32];
        let salt = [0x11u8; 16];
        let info = b"associated data";
        let mut a = [0u8; 16];
        let mut b = [0u8; 16];
        HashAlg::Sha256.hkdf_expand(&ikm, &salt, info, &mut a).unwrap();
        HashAlg::Sha256.hkdf_expand(&ikm, &salt, info, &mut b).unwrap();
        assert_eq!(a, b);

        let mut c = [0u8; 16];
        HashAlg::Sha256
            .hkdf_expand(&ikm, &salt, b"different", &mut c)
            .unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn test_hkdf_expand_too_long_fails() {
        let ikm = [0x42u8; 32];
        let salt = [0x11u8; 16];
        let mut out = [0u8; 255 * 20 + 1];
        assert!(HashAlg::Sha1
            .hkdf_expand(&ikm, &salt, b"", &mut out)
            .is_err());
    }
}
