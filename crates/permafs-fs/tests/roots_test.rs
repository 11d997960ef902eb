//! Roots directory behavior.

mod common;

use std::sync::Arc;

use common::{br, Script, ScriptedIndex};
use permafs_blobref::BlobRef;
use permafs_fs::{Attr, FsError, FsOptions, Intr, Node, NodeKind, PermaFs};
use permafs_search::{MemoryIndex, ATTR_CAMLI_ROOT};

#[tokio::test]
async fn test_lists_roots_in_index_order() {
    let (a, b, c) = (br("a"), br("b"), br("c"));
    let index = ScriptedIndex::new().roots(Script::Reply(vec![c.clone(), a.clone(), b.clone()]));
    let root = index.session().root();

    let names = root.read_dir(&Intr::never()).await.unwrap().names();
    assert_eq!(names, vec![c.to_string(), a.to_string(), b.to_string()]);
}

#[tokio::test]
async fn test_root_entries_are_directories() {
    let index = ScriptedIndex::new().roots(Script::Reply(vec![br("a")]));
    let ents: Vec<_> = index
        .session()
        .root()
        .read_dir(&Intr::never())
        .await
        .unwrap()
        .collect();
    assert_eq!(ents.len(), 1);
    assert_eq!(ents[0].kind, NodeKind::Directory);
}

#[tokio::test]
async fn test_searches_camli_root_presence_limit_100() {
    let index = ScriptedIndex::new();
    index.session().root().read_dir(&Intr::never()).await.unwrap();

    let requests = index.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].attr, ATTR_CAMLI_ROOT);
    assert_eq!(requests[0].n, 100);
    assert!(requests[0].value.is_none());
}

#[tokio::test]
async fn test_configured_attribute_and_limit() {
    let index = ScriptedIndex::new();
    let fs = PermaFs::with_options(
        index.clone(),
        FsOptions {
            roots_attribute: "fsRoot".to_string(),
            roots_limit: 3,
        },
    );
    fs.root().read_dir(&Intr::never()).await.unwrap();

    let requests = index.requests.lock().unwrap();
    assert_eq!(requests[0].attr, "fsRoot");
    assert_eq!(requests[0].n, 3);
}

#[tokio::test]
async fn test_index_failure_is_io_with_no_entries() {
    let index = ScriptedIndex::new().roots(Script::Fail);
    let root = index.session().root();

    let err = root.read_dir(&Intr::never()).await.unwrap_err();
    assert!(matches!(err, FsError::Io(_)));
    assert_eq!(err.errno(), libc::EIO);

    // Node stays usable once the index recovers
    index.roots(Script::Reply(vec![br("a")]));
    assert_eq!(root.read_dir(&Intr::never()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_empty_index_lists_nothing() {
    let fs = PermaFs::new(Arc::new(MemoryIndex::new()));
    let ents = fs.root().read_dir(&Intr::never()).await.unwrap();
    assert_eq!(ents.len(), 0);
}

#[tokio::test]
async fn test_memory_index_roots_exclude_untagged() {
    let index = Arc::new(MemoryIndex::new());
    index.set_attribute(&br("pics"), ATTR_CAMLI_ROOT, "dev-pics-root");
    index.set_attribute(&br("other"), "title", "not a root");
    let fs = PermaFs::new(index);

    let names = fs.root().read_dir(&Intr::never()).await.unwrap().names();
    // Named by blobref, not by the camliRoot value
    assert_eq!(names, vec![br("pics").to_string()]);
}

#[test]
fn test_lookup_binds_directory() {
    let fs = PermaFs::new(Arc::new(MemoryIndex::new()));
    let a = br("a");
    let node = fs.root().lookup(&a.to_string()).unwrap();
    assert!(matches!(&node, Node::Dir(d) if d.blob_ref() == &a));
    assert_eq!(node.kind(), NodeKind::Directory);
}

#[test]
fn test_lookup_does_not_require_listed_root() {
    // Nothing is tagged camliRoot, lookup still binds any valid blobref
    let fs = PermaFs::new(Arc::new(MemoryIndex::new()));
    let name = "sha1-0beec7b5ea3f0fdbc95d0dd47f3c5bc275da8a33";
    let node = fs.root().lookup(name).unwrap();
    assert_eq!(node.blob_ref().map(BlobRef::to_string), Some(name.to_string()));
}

#[test]
fn test_lookup_invalid_name_is_not_found() {
    let fs = PermaFs::new(Arc::new(MemoryIndex::new()));
    let root = fs.root();
    for name in ["", "foo", "dev-pics-root", "sha1-abc", ".Trash", "sha1-XYZ"] {
        let err = root.lookup(name).unwrap_err();
        assert!(matches!(err, FsError::NotFound { .. }), "{:?}", name);
        assert_eq!(err.errno(), libc::ENOENT);
    }
}

#[test]
fn test_lookups_are_fresh_but_equal() {
    let fs = PermaFs::new(Arc::new(MemoryIndex::new()));
    let name = br("a").to_string();
    let (Node::Dir(d1), Node::Dir(d2)) = (
        fs.root().lookup(&name).unwrap(),
        fs.root().lookup(&name).unwrap(),
    ) else {
        panic!("expected directories");
    };
    assert_eq!(d1, d2);
}

#[tokio::test]
async fn test_attr_fixed_regardless_of_index() {
    let index = ScriptedIndex::new().roots(Script::Fail);
    let root = index.session().root();
    let before = root.attr();
    let _ = root.read_dir(&Intr::never()).await;
    assert_eq!(root.attr(), before);
    assert_eq!(before, Attr::dir());
    assert_eq!(before.perm, 0o700);
    assert!(root.blob_ref().is_none());
}

#[tokio::test]
async fn test_interrupted_listing_is_cancelled() {
    let index = ScriptedIndex::new().roots(Script::Hang);
    let root = index.session().root();
    let (interrupter, intr) = Intr::pair();

    let task = tokio::spawn(async move { root.read_dir(&intr).await });
    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    interrupter.interrupt();

    let err = tokio::time::timeout(std::time::Duration::from_secs(5), task)
        .await
        .unwrap()
        .unwrap()
        .unwrap_err();
    assert!(matches!(err, FsError::Cancelled));
    assert_eq!(err.errno(), libc::EINTR);
}
