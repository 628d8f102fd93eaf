use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
#[non_exhaustive]
/// Possible `libqct` errors
pub enum Error {
    /// Error returned if the file does not begin with the QCT magic number
    #[error("not a QCT file (magic {found:#010x} != {expected:#010x})", expected = crate::QCT_MAGIC)]
    BadMagic {
        /// The four bytes actually found at the start of the file
        found: u32,
    },
    /// Error returned if end-of-file is reached in the middle of a field
    #[error("file truncated mid-field")]
    Truncated,
    /// Error returned if the image buffer cannot be allocated
    #[error("unable to allocate {bytes} byte image buffer")]
    Allocation {
        /// Requested buffer size
        bytes: usize,
    },
    /// Error returned for a scale factor that does not divide the tile size
    #[error("scale factor {0} does not divide the tile size of {size}", size = crate::TILE_SIZE)]
    UnsupportedScale(u32),
    /// Any other I/O failure
    #[error("i/o error")]
    Io(#[from] io::Error),
}

impl Error {
    /// `read_exact` reports a short read as `UnexpectedEof`; everything the
    /// wire format calls "truncated" funnels through here.
    pub(crate) fn from_read(e: io::Error) -> Self {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            Self::Truncated
        } else {
            Self::Io(e)
        }
    }
}
