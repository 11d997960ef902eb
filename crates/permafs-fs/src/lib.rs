//! # permafs-fs
//!
//! Presents a permanode graph as a directory tree.
//!
//! ```text
//! /                                  RootsDir: permanodes with camliRoot
//! └── sha1-0beec7b5...               MutDir bound to that permanode
//!     └── <name>                     one per camliPath:<name> attribute
//! ```
//!
//! Nothing is walked ahead of time. Each node is a blobref plus a handle on
//! the mount's [`PermaFs`] session, and every listing asks the index again,
//! so cycles in the graph cost nothing and concurrent writers are seen on
//! the next call.

mod attr;
pub mod bridge;
mod dirent;
mod error;
mod fs;
pub mod inode;
mod intr;
pub mod listing;
mod mutdir;
mod mutfile;
mod node;
mod roots;

pub use attr::{Attr, NodeKind};
pub use bridge::PermaFuse;
pub use dirent::{DirEntries, Dirent};
pub use error::{FsError, Result};
pub use fs::{FsOptions, PermaFs};
pub use intr::{Interrupter, Intr};
pub use mutdir::MutDir;
pub use mutfile::MutFile;
pub use node::Node;
pub use roots::RootsDir;
