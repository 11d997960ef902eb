//! Directory snapshots served to the kernel between `opendir` and
//! `releasedir`.

use std::collections::HashMap;

use permafs_config::log_bridge_debug;

use crate::attr::NodeKind;
use crate::dirent::DirEntries;
use crate::inode::{InodeTable, ROOT_INO};

/// One entry as the kernel sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    pub ino: u64,
    pub kind: NodeKind,
    pub name: String,
}

/// Whether the kernel accepts `name` as a single path component.
fn is_component(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\0'])
}

/// A directory listing with `.` and `..` in front.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    entries: Vec<ListEntry>,
}

impl Listing {
    /// Build the listing of directory `ino`. Names that cannot be a path
    /// component are left out; the rest keep the order they were listed in.
    pub fn build(ino: u64, entries: DirEntries, table: &mut InodeTable) -> Self {
        let parent = table.parent_of(ino).unwrap_or(ROOT_INO);
        let mut listing = vec![
            ListEntry {
                ino,
                kind: NodeKind::Directory,
                name: ".".to_string(),
            },
            ListEntry {
                ino: parent,
                kind: NodeKind::Directory,
                name: "..".to_string(),
            },
        ];

        for ent in entries {
            if !is_component(&ent.name) {
                log_bridge_debug!(
                    "Skipping entry",
                    ino = ino,
                    name = tracing::field::debug(&ent.name)
                );
                continue;
            }
            listing.push(ListEntry {
                ino: table.ino_for(ino, &ent.name),
                kind: ent.kind,
                name: ent.name,
            });
        }
        Self { entries: listing }
    }

    /// Entries after `offset`, each paired with the offset that resumes
    /// right after it.
    pub fn page(&self, offset: i64) -> impl Iterator<Item = (i64, &ListEntry)> {
        self.entries
            .iter()
            .enumerate()
            .skip(offset.max(0) as usize)
            .map(|(i, ent)| ((i + 1) as i64, ent))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Open directory handles and their snapshots.
#[derive(Debug)]
pub struct DirHandles {
    open: HashMap<u64, Listing>,
    next_fh: u64,
}

impl Default for DirHandles {
    fn default() -> Self {
        Self {
            open: HashMap::new(),
            next_fh: 1,
        }
    }
}

impl DirHandles {
    pub fn open(&mut self, listing: Listing) -> u64 {
        let fh = self.next_fh;
        self.next_fh += 1;
        self.open.insert(fh, listing);
        fh
    }

    pub fn get(&self, fh: u64) -> Option<&Listing> {
        self.open.get(&fh)
    }

    pub fn release(&mut self, fh: u64) {
        self.open.remove(&fh);
    }

    pub fn len(&self) -> usize {
        self.open.len()
    }

    pub fn is_empty(&self) -> bool {
        self.open.is_empty()
    }
}
