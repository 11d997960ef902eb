use permafs_blobref::BlobRefError;
use permafs_search::SearchError;
use thiserror::Error;

/// Errors returned by node operations.
///
/// Every error is scoped to the one operation that produced it; the node
/// stays usable for the next call.
#[derive(Error, Debug)]
pub enum FsError {
    /// The name is not a blobref, so nothing can be bound to it.
    #[error("no such entry: {name:?}")]
    NotFound {
        name: String,
        #[source]
        reason: BlobRefError,
    },

    #[error("not a directory")]
    NotADirectory,

    /// The index could not answer.
    #[error("index unavailable: {0}")]
    Io(#[source] SearchError),

    /// The caller gave up before the index answered.
    #[error("operation interrupted")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, FsError>;

impl FsError {
    /// Errno reported to the kernel.
    pub fn errno(&self) -> i32 {
        match self {
            FsError::NotFound { .. } => libc::ENOENT,
            FsError::NotADirectory => libc::ENOTDIR,
            FsError::Io(_) => libc::EIO,
            FsError::Cancelled => libc::EINTR,
        }
    }
}
