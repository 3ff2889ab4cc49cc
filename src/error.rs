use thiserror::Error;

#[derive(Debug, Error)]
pub enum HeaderError {
    #[error("invalid header ID")]
    BadMagic,
    #[error("failed to read {0}")]
    Truncated(&'static str),
    #[error("invalid frame dimensions {width}x{height}")]
    InvalidDimension { width: u16, height: u16 },
    #[error("invalid format {0}")]
    InvalidFormat(u8),
}

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("short audio read: expected {expected} bytes, got {got}")]
    ShortRead { expected: usize, got: usize },
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    IOError(#[from] std::io::Error),
    #[error("{0}")]
    PNGEncodingError(#[from] png::EncodingError),
    #[error("{0}")]
    Header(#[from] HeaderError),
    #[error("{0}")]
    Audio(#[from] AudioError),
    #[error("failed to read palette")]
    PaletteTruncated,
    #[error("header trailer has no field {0} to take the skip-sector count from")]
    MissingSkipField(usize),
    #[error("implausible header: needs {needed} bytes, only {available} available")]
    ImplausibleHeader { needed: u64, available: u64 },
}

impl Error {
    /// Whether a clip scan should move on to the next candidate.
    pub fn rejects_candidate(&self) -> bool {
        matches!(
            self,
            Error::Header(_)
                | Error::PaletteTruncated
                | Error::MissingSkipField(_)
                | Error::ImplausibleHeader { .. }
        )
    }
}
