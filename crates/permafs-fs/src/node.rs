use permafs_blobref::BlobRef;

use crate::attr::{Attr, NodeKind};
use crate::dirent::DirEntries;
use crate::error::{FsError, Result};
use crate::intr::Intr;
use crate::mutdir::MutDir;
use crate::mutfile::MutFile;
use crate::roots::RootsDir;

/// Every kind of node the filesystem hands out.
///
/// The kind is fixed when the node is built; operations dispatch on it.
#[derive(Debug, Clone)]
pub enum Node {
    Roots(RootsDir),
    Dir(MutDir),
    File(MutFile),
}

impl Node {
    pub fn attr(&self) -> Attr {
        match self {
            Node::Roots(d) => d.attr(),
            Node::Dir(d) => d.attr(),
            Node::File(f) => f.attr(),
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.attr().kind
    }

    /// Bound permanode; `None` for the roots directory.
    pub fn blob_ref(&self) -> Option<&BlobRef> {
        match self {
            Node::Roots(_) => None,
            Node::Dir(d) => Some(d.blob_ref()),
            Node::File(f) => Some(f.blob_ref()),
        }
    }

    pub async fn read_dir(&self, intr: &Intr) -> Result<DirEntries> {
        match self {
            Node::Roots(d) => d.read_dir(intr).await,
            Node::Dir(d) => d.read_dir(intr).await,
            Node::File(_) => Err(FsError::NotADirectory),
        }
    }

    pub fn lookup(&self, name: &str) -> Result<Node> {
        match self {
            Node::Roots(d) => d.lookup(name).map(Node::Dir),
            Node::Dir(d) => d.lookup(name).map(Node::Dir),
            Node::File(_) => Err(FsError::NotADirectory),
        }
    }
}

impl From<MutDir> for Node {
    fn from(d: MutDir) -> Self {
        Node::Dir(d)
    }
}

impl From<MutFile> for Node {
    fn from(f: MutFile) -> Self {
        Node::File(f)
    }
}
