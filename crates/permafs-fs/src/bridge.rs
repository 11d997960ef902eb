//! FUSE bridge.
//!
//! Maps kernel inodes onto [`Node`](crate::Node)s and runs their async
//! operations on a tokio runtime.
//! - Inode 1 is the roots directory; every other inode names one
//!   (parent, name) position, so cycles and shared subtrees stay browsable.
//! - Each directory listing is taken once at `opendir` and served from that
//!   snapshot until `releasedir`.
//! - Mounted read-only.

#[cfg(all(feature = "fuse", target_os = "linux"))]
mod imp {
    use std::ffi::OsStr;
    use std::path::Path;
    use std::sync::Arc;
    use std::time::{Duration, UNIX_EPOCH};

    use fuser::{
        FileAttr, FileType, Filesystem, ReplyAttr, ReplyDirectory, ReplyEmpty, ReplyEntry,
        ReplyOpen, Request,
    };
    use libc::{EBADF, ENOENT, ENOTDIR};
    use permafs_config::{log_bridge_debug, log_bridge_info, MountConfig};
    use tokio::runtime::Handle;
    use tracing::field::display;

    use crate::attr::{Attr, NodeKind};
    use crate::fs::PermaFs;
    use crate::inode::InodeTable;
    use crate::intr::Intr;
    use crate::listing::{DirHandles, Listing};

    const BLOCK_SIZE: u32 = 4096;

    pub struct PermaFuse {
        table: InodeTable,
        handles: DirHandles,
        runtime: Handle,
        ttl: Duration,
        fs_name: String,
        allow_other: bool,
    }

    impl PermaFuse {
        pub fn new(fs: Arc<PermaFs>, runtime: Handle, mount: &MountConfig) -> Self {
            Self {
                table: InodeTable::new(fs.root()),
                handles: DirHandles::default(),
                runtime,
                ttl: Duration::from_millis(mount.entry_ttl_ms),
                fs_name: mount.fs_name.clone(),
                allow_other: mount.allow_other,
            }
        }

        /// Mount the filesystem at the given path; blocks until unmounted.
        ///
        /// Requests are served on the calling thread and drive node
        /// operations with `Handle::block_on`, so this must not be called
        /// from a runtime worker thread. From async code, run it under
        /// `tokio::task::spawn_blocking`.
        pub fn mount(self, mountpoint: &Path) -> anyhow::Result<()> {
            let mut opts = vec![
                fuser::MountOption::RO,
                fuser::MountOption::FSName(self.fs_name.clone()),
            ];
            if self.allow_other {
                opts.push(fuser::MountOption::AllowOther);
            }

            log_bridge_info!("Mounting", mountpoint = display(mountpoint.display()));
            fuser::mount2(self, mountpoint, &opts)?;
            Ok(())
        }

        fn file_type(kind: NodeKind) -> FileType {
            match kind {
                NodeKind::Directory => FileType::Directory,
                NodeKind::File => FileType::RegularFile,
            }
        }

        fn file_attr(ino: u64, attr: &Attr) -> FileAttr {
            FileAttr {
                ino,
                size: 0,
                blocks: 0,
                atime: UNIX_EPOCH,
                mtime: UNIX_EPOCH,
                ctime: UNIX_EPOCH,
                crtime: UNIX_EPOCH,
                kind: Self::file_type(attr.kind),
                perm: attr.perm,
                nlink: attr.nlink,
                uid: attr.uid,
                gid: attr.gid,
                rdev: 0,
                flags: 0,
                blksize: BLOCK_SIZE,
            }
        }
    }

    impl Filesystem for PermaFuse {
        fn lookup(&mut self, _req: &Request, parent: u64, name: &OsStr, reply: ReplyEntry) {
            let Some(name) = name.to_str() else {
                reply.error(ENOENT);
                return;
            };
            let Some(dir) = self.table.get(parent) else {
                reply.error(ENOENT);
                return;
            };

            match dir.lookup(name) {
                Ok(child) => {
                    let attr = child.attr();
                    let ino = self.table.remember(parent, name, child);
                    reply.entry(&self.ttl, &Self::file_attr(ino, &attr), 0);
                }
                Err(e) => {
                    log_bridge_debug!("Lookup failed", parent = parent, name = name, error = display(&e));
                    reply.error(e.errno());
                }
            }
        }

        fn forget(&mut self, _req: &Request, ino: u64, nlookup: u64) {
            self.table.forget(ino, nlookup);
        }

        fn getattr(&mut self, _req: &Request, ino: u64, reply: ReplyAttr) {
            match self.table.get(ino) {
                Some(node) => reply.attr(&self.ttl, &Self::file_attr(ino, &node.attr())),
                None => reply.error(ENOENT),
            }
        }

        fn opendir(&mut self, _req: &Request, ino: u64, _flags: i32, reply: ReplyOpen) {
            let Some(node) = self.table.get(ino).cloned() else {
                reply.error(ENOENT);
                return;
            };
            if node.kind() != NodeKind::Directory {
                reply.error(ENOTDIR);
                return;
            }

            let entries = match self.runtime.block_on(node.read_dir(&Intr::never())) {
                Ok(entries) => entries,
                Err(e) => {
                    log_bridge_debug!("ReadDir failed", ino = ino, error = display(&e));
                    reply.error(e.errno());
                    return;
                }
            };

            let listing = Listing::build(ino, entries, &mut self.table);
            reply.opened(self.handles.open(listing), 0);
        }

        fn readdir(
            &mut self,
            _req: &Request,
            _ino: u64,
            fh: u64,
            offset: i64,
            mut reply: ReplyDirectory,
        ) {
            let Some(listing) = self.handles.get(fh) else {
                reply.error(EBADF);
                return;
            };

            for (next, ent) in listing.page(offset) {
                if reply.add(ent.ino, next, Self::file_type(ent.kind), &ent.name) {
                    break;
                }
            }
            reply.ok();
        }

        fn releasedir(&mut self, _req: &Request, _ino: u64, fh: u64, _flags: i32, reply: ReplyEmpty) {
            self.handles.release(fh);
            reply.ok();
        }
    }
}

#[cfg(not(all(feature = "fuse", target_os = "linux")))]
mod imp {
    use std::sync::Arc;

    use permafs_config::MountConfig;
    use tokio::runtime::Handle;

    use crate::fs::PermaFs;

    /// Dummy FUSE bridge for non-Linux or non-feature builds
    pub struct PermaFuse;

    impl PermaFuse {
        pub fn new(_fs: Arc<PermaFs>, _runtime: Handle, _mount: &MountConfig) -> Self {
            #[cfg(not(target_os = "linux"))]
            tracing::warn!(
                "FUSE support is only available on Linux (current: {}).",
                std::env::consts::OS
            );
            #[cfg(all(target_os = "linux", not(feature = "fuse")))]
            tracing::warn!("PermaFuse is disabled. Compile with --features fuse to enable.");
            Self
        }

        pub fn mount(self, _mountpoint: &std::path::Path) -> anyhow::Result<()> {
            anyhow::bail!("FUSE not supported on this platform");
        }
    }
}

pub use imp::PermaFuse;
