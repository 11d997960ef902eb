use std::sync::Arc;

use permafs_blobref::BlobRef;
use permafs_config::{log_vfs_debug, log_vfs_warn};
use tracing::field::display;

use crate::attr::Attr;
use crate::dirent::{DirEntries, Dirent};
use crate::error::{FsError, Result};
use crate::fs::PermaFs;
use crate::intr::Intr;
use crate::mutfile::MutFile;

/// Interpret a directory entry name as the blobref of the child.
pub(crate) fn parse_child(name: &str) -> Result<BlobRef> {
    BlobRef::parse(name).map_err(|reason| FsError::NotFound {
        name: name.to_string(),
        reason,
    })
}

/// A directory backed by a permanode.
///
/// Entries are the permanode's `camliPath:<name>` attributes. Roots and
/// nested directories are the same thing; only the way they were reached
/// differs.
#[derive(Debug, Clone)]
pub struct MutDir {
    fs: Arc<PermaFs>,
    br: BlobRef,
}

impl MutDir {
    pub(crate) fn new(fs: Arc<PermaFs>, br: BlobRef) -> Self {
        Self { fs, br }
    }

    /// The permanode this directory is bound to.
    pub fn blob_ref(&self) -> &BlobRef {
        &self.br
    }

    pub fn attr(&self) -> Attr {
        Attr::dir()
    }

    /// Describe the permanode and list its `camliPath:` keys.
    ///
    /// Every record in the describe response contributes entries, and
    /// duplicate names are passed through as-is. Order is whatever the index
    /// returned.
    pub async fn read_dir(&self, intr: &Intr) -> Result<DirEntries> {
        let res = match intr.run(self.fs.client().describe(&self.br)).await {
            Ok(res) => res,
            Err(e) => {
                log_vfs_warn!("ReadDir describe failed", dir = display(&self.br), error = display(&e));
                return Err(e);
            }
        };

        let ents: Vec<_> = res
            .meta
            .values()
            .filter_map(|db| db.permanode.as_ref())
            .flat_map(|pn| pn.path_entries())
            .map(Dirent::dir)
            .collect();
        log_vfs_debug!("ReadDir", dir = display(&self.br), count = ents.len());
        Ok(DirEntries::new(ents))
    }

    /// Bind the child named `name`.
    ///
    /// The name itself is parsed as the child's blobref; the value stored
    /// under `camliPath:<name>` is not consulted and the index is not asked
    /// whether the child exists.
    pub fn lookup(&self, name: &str) -> Result<MutDir> {
        log_vfs_debug!("Lookup", dir = display(&self.br), name = name);
        let br = parse_child(name)?;
        Ok(MutDir::new(Arc::clone(&self.fs), br))
    }

    /// Bind the child named `name` as a leaf file.
    pub fn file(&self, name: &str) -> Result<MutFile> {
        let br = parse_child(name)?;
        Ok(MutFile::new(
            Arc::clone(&self.fs),
            br,
            self.br.clone(),
            name.to_string(),
        ))
    }
}

/// Same bound permanode, regardless of how each handle was reached.
impl PartialEq for MutDir {
    fn eq(&self, other: &Self) -> bool {
        self.br == other.br
    }
}

impl Eq for MutDir {}
