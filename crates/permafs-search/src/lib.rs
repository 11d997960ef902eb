//! # permafs-search
//!
//! The boundary between the filesystem and the permanode index.
//!
//! The index owns attribute state: it aggregates claims and answers two kinds
//! of questions, which the filesystem consumes through [`SearchClient`]:
//! - which permanodes carry a given attribute ([`WithAttrRequest`])
//! - what the current attributes of a permanode are ([`DescribeResponse`])
//!
//! [`MemoryIndex`] is an in-process implementation used by tests and by
//! embedders that keep the graph in memory.

mod memory;

pub use memory::MemoryIndex;

use std::collections::BTreeMap;
use std::io;

use async_trait::async_trait;
use permafs_blobref::BlobRef;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Attribute marking a permanode as a filesystem root.
pub const ATTR_CAMLI_ROOT: &str = "camliRoot";

/// Prefix of attributes naming directory entries: `camliPath:<name>`.
pub const ATTR_CAMLI_PATH_PREFIX: &str = "camliPath:";

/// Errors reported by an index backend
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("transport error: {0}")]
    Transport(#[from] io::Error),

    #[error("request timed out after {millis}ms")]
    Timeout { millis: u64 },

    #[error("index error: {0}")]
    Backend(String),

    #[error("protocol error: {0}")]
    Protocol(String),
}

pub type Result<T> = std::result::Result<T, SearchError>;

/// Find permanodes carrying an attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithAttrRequest {
    /// Maximum number of results
    pub n: usize,
    /// Attribute name
    pub attr: String,
    /// Required value; `None` matches any value
    #[serde(default)]
    pub value: Option<String>,
}

impl WithAttrRequest {
    /// Match every permanode that has `attr` set, whatever its value.
    pub fn presence(attr: impl Into<String>, n: usize) -> Self {
        Self {
            n,
            attr: attr.into(),
            value: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithAttrResponse {
    pub with_attr: Vec<WithAttrItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithAttrItem {
    pub permanode: BlobRef,
}

/// Result of a describe call, keyed by blobref string.
///
/// Usually holds the one requested blob, but an index may describe related
/// blobs in the same response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescribeResponse {
    pub meta: BTreeMap<String, DescribedBlob>,
}

impl DescribeResponse {
    pub fn insert(&mut self, blob: DescribedBlob) {
        self.meta.insert(blob.blob_ref.to_string(), blob);
    }

    pub fn get(&self, br: &BlobRef) -> Option<&DescribedBlob> {
        self.meta.get(&br.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescribedBlob {
    pub blob_ref: BlobRef,
    #[serde(default)]
    pub camli_type: Option<String>,
    /// Present only for permanodes
    #[serde(default)]
    pub permanode: Option<DescribedPermanode>,
}

impl DescribedBlob {
    pub fn permanode(blob_ref: BlobRef, attr: BTreeMap<String, Vec<String>>) -> Self {
        Self {
            blob_ref,
            camli_type: Some("permanode".to_string()),
            permanode: Some(DescribedPermanode { attr }),
        }
    }
}

/// Current attribute state of a permanode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescribedPermanode {
    pub attr: BTreeMap<String, Vec<String>>,
}

impl DescribedPermanode {
    /// First value of `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.attr.get(key)?.first().map(String::as_str)
    }

    /// All values of `key`, empty when unset.
    pub fn values(&self, key: &str) -> &[String] {
        self.attr.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Entry names encoded as `camliPath:<name>` keys, in attribute order.
    pub fn path_entries(&self) -> impl Iterator<Item = &str> {
        self.attr
            .keys()
            .filter_map(|k| k.strip_prefix(ATTR_CAMLI_PATH_PREFIX))
    }
}

/// Client for a permanode index.
///
/// Shared read-only by every node of a mounted filesystem.
#[async_trait]
pub trait SearchClient: Send + Sync {
    async fn permanodes_with_attr(&self, req: &WithAttrRequest) -> Result<WithAttrResponse>;

    async fn describe(&self, br: &BlobRef) -> Result<DescribeResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn br(s: &str) -> BlobRef {
        BlobRef::parse(s).unwrap()
    }

    #[test]
    fn test_path_entries_filters_prefix() {
        let mut attr = BTreeMap::new();
        attr.insert("camliPath:foo".to_string(), vec!["sha1-aa".to_string()]);
        attr.insert("camliPath:bar".to_string(), vec!["sha1-bb".to_string()]);
        attr.insert("other:attr".to_string(), vec!["x".to_string()]);
        attr.insert("camliPath".to_string(), vec!["y".to_string()]);
        let pn = DescribedPermanode { attr };

        let mut names: Vec<_> = pn.path_entries().collect();
        names.sort();
        assert_eq!(names, vec!["bar", "foo"]);
    }

    #[test]
    fn test_empty_path_suffix_is_kept() {
        let mut attr = BTreeMap::new();
        attr.insert("camliPath:".to_string(), vec![]);
        let pn = DescribedPermanode { attr };
        assert_eq!(pn.path_entries().collect::<Vec<_>>(), vec![""]);
    }

    #[test]
    fn test_values_multimap() {
        let mut attr = BTreeMap::new();
        attr.insert(
            ATTR_CAMLI_ROOT.to_string(),
            vec!["dev-pics-root".to_string(), "pics".to_string()],
        );
        let pn = DescribedPermanode { attr };
        assert_eq!(pn.get(ATTR_CAMLI_ROOT), Some("dev-pics-root"));
        assert_eq!(pn.values(ATTR_CAMLI_ROOT).len(), 2);
        assert!(pn.values("title").is_empty());
        assert_eq!(pn.get("title"), None);
    }

    #[test]
    fn test_describe_response_json_shape() {
        let p = br("sha1-0beec7b5ea3f0fdbc95d0dd47f3c5bc275da8a33");
        let mut attr = BTreeMap::new();
        attr.insert("camliPath:foo".to_string(), vec!["sha1-aa".to_string()]);
        let mut res = DescribeResponse::default();
        res.insert(DescribedBlob::permanode(p.clone(), attr));

        let json = serde_json::to_value(&res).unwrap();
        let blob = &json["meta"][p.to_string()];
        assert_eq!(blob["blobRef"], p.to_string());
        assert_eq!(blob["camliType"], "permanode");
        assert_eq!(blob["permanode"]["attr"]["camliPath:foo"][0], "sha1-aa");

        let back: DescribeResponse = serde_json::from_value(json).unwrap();
        assert_eq!(back.get(&p).unwrap().blob_ref, p);
    }

    #[test]
    fn test_with_attr_presence() {
        let req = WithAttrRequest::presence(ATTR_CAMLI_ROOT, 100);
        assert_eq!(req.attr, "camliRoot");
        assert_eq!(req.n, 100);
        assert!(req.value.is_none());
    }
}
