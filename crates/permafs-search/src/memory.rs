//! In-process permanode index.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use permafs_blobref::BlobRef;
use tracing::debug;

use crate::{
    DescribeResponse, DescribedBlob, Result, SearchClient, SearchError, WithAttrItem,
    WithAttrRequest, WithAttrResponse,
};

type Attrs = BTreeMap<String, Vec<String>>;

/// Permanode index held in memory.
///
/// Attribute state is the already-resolved view: setting an attribute
/// replaces its values, adding appends one.
#[derive(Debug, Default)]
pub struct MemoryIndex {
    permanodes: RwLock<BTreeMap<BlobRef, Attrs>>,
    offline: AtomicBool,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a permanode with no attributes. No-op if it exists.
    pub fn create_permanode(&self, br: &BlobRef) {
        self.write().entry(br.clone()).or_default();
    }

    /// Replace all values of `key`.
    pub fn set_attribute(&self, br: &BlobRef, key: &str, value: &str) {
        self.write()
            .entry(br.clone())
            .or_default()
            .insert(key.to_string(), vec![value.to_string()]);
    }

    /// Append a value to `key`, keeping values a set.
    pub fn add_attribute(&self, br: &BlobRef, key: &str, value: &str) {
        let mut permanodes = self.write();
        let values = permanodes
            .entry(br.clone())
            .or_default()
            .entry(key.to_string())
            .or_default();
        if !values.iter().any(|v| v == value) {
            values.push(value.to_string());
        }
    }

    /// Remove `key` entirely.
    pub fn del_attribute(&self, br: &BlobRef, key: &str) {
        if let Some(attrs) = self.write().get_mut(br) {
            attrs.remove(key);
        }
    }

    /// While offline every call fails as if the index were unreachable.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(SearchError::Backend("index offline".to_string()));
        }
        Ok(())
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, BTreeMap<BlobRef, Attrs>> {
        self.permanodes.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, BTreeMap<BlobRef, Attrs>> {
        self.permanodes.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl SearchClient for MemoryIndex {
    async fn permanodes_with_attr(&self, req: &WithAttrRequest) -> Result<WithAttrResponse> {
        self.check_online()?;
        let with_attr: Vec<_> = self
            .read()
            .iter()
            .filter(|(_, attrs)| match (attrs.get(&req.attr), &req.value) {
                (Some(values), None) => !values.is_empty(),
                (Some(values), Some(want)) => values.contains(want),
                (None, _) => false,
            })
            .take(req.n)
            .map(|(br, _)| WithAttrItem {
                permanode: br.clone(),
            })
            .collect();
        debug!(attr = %req.attr, found = with_attr.len(), "with-attr query");
        Ok(WithAttrResponse { with_attr })
    }

    async fn describe(&self, br: &BlobRef) -> Result<DescribeResponse> {
        self.check_online()?;
        let mut res = DescribeResponse::default();
        if let Some(attrs) = self.read().get(br) {
            res.insert(DescribedBlob::permanode(br.clone(), attrs.clone()));
        }
        Ok(res)
    }
}
