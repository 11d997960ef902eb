use nix::unistd::{getgid, getuid};

/// What a node looks like to the kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Directory,
    File,
}

/// Node attributes.
///
/// Fixed per node kind and owned by the mounting process; nothing here is
/// read from the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attr {
    pub kind: NodeKind,
    pub perm: u16,
    pub nlink: u32,
    pub uid: u32,
    pub gid: u32,
}

impl Attr {
    pub fn dir() -> Self {
        Self {
            kind: NodeKind::Directory,
            perm: 0o700,
            nlink: 2,
            uid: getuid().as_raw(),
            gid: getgid().as_raw(),
        }
    }

    pub fn file() -> Self {
        Self {
            kind: NodeKind::File,
            perm: 0o600,
            nlink: 1,
            uid: getuid().as_raw(),
            gid: getgid().as_raw(),
        }
    }

    /// `st_mode`: file type bits plus permissions.
    pub fn mode(&self) -> u32 {
        let type_bits = match self.kind {
            NodeKind::Directory => libc::S_IFDIR,
            NodeKind::File => libc::S_IFREG,
        };
        type_bits as u32 | u32::from(self.perm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dir_attr() {
        let attr = Attr::dir();
        assert_eq!(attr.kind, NodeKind::Directory);
        assert_eq!(attr.mode(), libc::S_IFDIR as u32 | 0o700);
        assert_eq!(attr.uid, getuid().as_raw());
        assert_eq!(attr.gid, getgid().as_raw());
    }

    #[test]
    fn test_file_attr() {
        let attr = Attr::file();
        assert_eq!(attr.kind, NodeKind::File);
        assert_eq!(attr.mode() & 0o777, 0o600);
        assert_eq!(attr.mode() & libc::S_IFMT as u32, libc::S_IFREG as u32);
    }
}
