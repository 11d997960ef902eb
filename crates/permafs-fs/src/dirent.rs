use crate::attr::NodeKind;

/// One directory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dirent {
    pub name: String,
    pub kind: NodeKind,
}

impl Dirent {
    pub fn dir(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: NodeKind::Directory,
        }
    }
}

/// Entries produced by one listing.
///
/// Consumed once; listing again queries the index again.
#[derive(Debug)]
pub struct DirEntries {
    inner: std::vec::IntoIter<Dirent>,
}

impl DirEntries {
    pub(crate) fn new(entries: Vec<Dirent>) -> Self {
        Self {
            inner: entries.into_iter(),
        }
    }

    /// Remaining entry names, in listing order.
    pub fn names(self) -> Vec<String> {
        self.map(|d| d.name).collect()
    }
}

impl Iterator for DirEntries {
    type Item = Dirent;

    fn next(&mut self) -> Option<Dirent> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for DirEntries {}
