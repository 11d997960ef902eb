use std::sync::Arc;

use permafs_blobref::BlobRef;

use crate::attr::Attr;
use crate::fs::PermaFs;

/// A leaf file backed by a permanode.
///
/// Holds the parent directory's blobref for context only; it is never used
/// to walk back up the tree. Content I/O lives outside this crate.
#[derive(Debug, Clone)]
pub struct MutFile {
    fs: Arc<PermaFs>,
    br: BlobRef,
    parent: BlobRef,
    name: String,
}

impl MutFile {
    pub(crate) fn new(fs: Arc<PermaFs>, br: BlobRef, parent: BlobRef, name: String) -> Self {
        Self {
            fs,
            br,
            parent,
            name,
        }
    }

    pub fn blob_ref(&self) -> &BlobRef {
        &self.br
    }

    pub fn parent(&self) -> &BlobRef {
        &self.parent
    }

    /// Entry name within the parent
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Session this file was resolved in
    pub fn session(&self) -> &Arc<PermaFs> {
        &self.fs
    }

    pub fn attr(&self) -> Attr {
        Attr::file()
    }
}
