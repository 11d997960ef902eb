use std::sync::Arc;

use permafs_config::{log_vfs_debug, log_vfs_warn};
use permafs_search::WithAttrRequest;
use tracing::field::display;

use crate::attr::Attr;
use crate::dirent::{DirEntries, Dirent};
use crate::error::Result;
use crate::fs::PermaFs;
use crate::intr::Intr;
use crate::mutdir::{parse_child, MutDir};

/// Top-level directory listing every permanode tagged as a root.
#[derive(Debug, Clone)]
pub struct RootsDir {
    fs: Arc<PermaFs>,
}

impl RootsDir {
    pub(crate) fn new(fs: Arc<PermaFs>) -> Self {
        Self { fs }
    }

    pub fn attr(&self) -> Attr {
        Attr::dir()
    }

    /// One entry per root, named by the root's blobref.
    ///
    /// The human name in the root attribute's value is not used, so the
    /// names listed here are exactly the names [`RootsDir::lookup`] accepts.
    pub async fn read_dir(&self, intr: &Intr) -> Result<DirEntries> {
        let options = self.fs.options();
        log_vfs_debug!(
            "ReadDir / searching",
            attr = display(&options.roots_attribute)
        );

        let req = WithAttrRequest::presence(options.roots_attribute.clone(), options.roots_limit);
        let res = match intr.run(self.fs.client().permanodes_with_attr(&req)).await {
            Ok(res) => res,
            Err(e) => {
                log_vfs_warn!("Root search failed", error = display(&e));
                return Err(e);
            }
        };

        let ents: Vec<_> = res
            .with_attr
            .iter()
            .map(|wi| Dirent::dir(wi.permanode.to_string()))
            .collect();
        log_vfs_debug!("Roots listed", count = ents.len());
        Ok(DirEntries::new(ents))
    }

    /// Bind `name` to a directory without checking it is a listed root.
    pub fn lookup(&self, name: &str) -> Result<MutDir> {
        log_vfs_debug!("Lookup in roots", name = name);
        let br = parse_child(name)?;
        Ok(MutDir::new(Arc::clone(&self.fs), br))
    }
}
