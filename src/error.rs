extern crate alloc;

use {
    alloc::boxed::Box,
    core::{convert::From, error, fmt, result},
};

/// Result is a specialized [`result::Result`] for this module.
pub type Result<T> = result::Result<T, Error>;

#[cfg(feature = "std")]
pub(crate) fn map_res<T>(res: Result<T>) -> std::io::Result<T> {
    res.map_err(|err| match err {
        Error::UnexpectedEof(_) => {
            std::io::Error::new(std::io::ErrorKind::UnexpectedEof, err)
        }
        Error::ShortWrite(_) => {
            std::io::Error::new(std::io::ErrorKind::WriteZero, err)
        }
        err => std::io::Error::new(std::io::ErrorKind::Other, err),
    })
}

/// An arbitrary, opaque error, used to carry an underlying I/O
/// failure that doesn't map onto one of [`Error`]'s other
/// variants.
#[derive(Debug)]
pub struct OtherError {
    inner: Box<dyn error::Error + Send + Sync>,
}

impl OtherError {
    /// Allocate an [`OtherError`].
    pub fn new<E>(err: E) -> Self
    where
        E: Into<Box<dyn error::Error + Send + Sync>>,
    {
        Self { inner: err.into() }
    }
}

impl fmt::Display for OtherError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl error::Error for OtherError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        Some(self.inner.as_ref())
    }
}

/// The error type returned by this crate.
///
/// Every variant corresponds to one of the failure classes a
/// streaming AEAD primitive can raise: bad construction
/// parameters, a malformed or truncated header, a forged or
/// corrupted segment, a counter that would wrap, I/O failures
/// from the underlying sink/source, and use of a stream after it
/// has been closed, exhausted, or poisoned by an earlier error.
#[derive(Debug)]
pub enum Error {
    /// One of the constructor parameters (IKM length, hash
    /// name, key size, segment size, or first-segment offset)
    /// is invalid.
    Configuration(&'static str),
    /// The stream header's length byte didn't match the
    /// expected header length, or the header was truncated.
    MalformedHeader,
    /// A segment's AES-GCM tag didn't verify. Also raised for
    /// truncation (a missing last-segment marker, or a segment
    /// shorter than a tag), and for unexpected trailing bytes
    /// after the marked last segment.
    Authentication,
    /// More than 2^32 segments would be required to encode the
    /// stream.
    CounterOverflow,
    /// The sink did not accept the entire buffer.
    ///
    /// Contains the number of bytes actually written.
    ShortWrite(usize),
    /// The source ran out of bytes before a full read could be
    /// satisfied.
    ///
    /// Contains the number of bytes actually read.
    UnexpectedEof(usize),
    /// The writer or reader has already been closed, exhausted,
    /// or poisoned by a previous error.
    State(&'static str),
    /// The randomness source failed while generating the salt
    /// or nonce prefix for a new stream.
    Rand(rand_core::Error),
    /// Some other I/O error occurred.
    Other(OtherError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Configuration(msg) => {
                write!(f, "invalid configuration: {}", msg)
            }
            Error::MalformedHeader => write!(f, "malformed stream header"),
            Error::Authentication => write!(f, "authentication error"),
            Error::CounterOverflow => write!(f, "counter overflow"),
            Error::ShortWrite(n) => write!(f, "short write of {} bytes", n),
            Error::UnexpectedEof(n) => {
                write!(f, "unexpected EOF after {} bytes", n)
            }
            Error::State(msg) => write!(f, "invalid stream state: {}", msg),
            Error::Rand(err) => write!(f, "CSPRNG failure: {}", err),
            Error::Other(err) => write!(f, "{}", err),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Other(err) => Some(err),
            _ => None,
        }
    }
}

impl From<hkdf::InvalidLength> for Error {
    fn from(_value: hkdf::InvalidLength) -> Self {
        Error::Configuration(
            "derived key size exceeds HKDF's output length bound",
        )
    }
}

impl From<aead::Error> for Error {
    fn from(_value: aead::Error) -> Self {
        Error::Authentication
    }
}

impl From<rand_core::Error> for Error {
    fn from(value: rand_core::Error) -> Self {
        Error::Rand(value)
    }
}

impl From<OtherError> for Error {
    fn from(value: OtherError) -> Self {
        Error::Other(value)
    }
}

#[cfg(feature = "std")]
impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        match value.kind() {
            std::io::ErrorKind::UnexpectedEof => Error::UnexpectedEof(0),
            std::io::ErrorKind::WriteZero => Error::ShortWrite(0),
            _ => Error::Other(OtherError::new(Box::new(value))),
        }
    }
}
