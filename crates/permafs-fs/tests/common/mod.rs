//! Index doubles for filesystem tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use permafs_blobref::BlobRef;
use permafs_fs::PermaFs;
use permafs_search::{
    DescribeResponse, DescribedBlob, Result, SearchClient, SearchError, WithAttrItem,
    WithAttrRequest, WithAttrResponse,
};

pub fn br(seed: &str) -> BlobRef {
    BlobRef::for_content(seed.as_bytes())
}

pub fn attrs(pairs: &[(&str, &str)]) -> BTreeMap<String, Vec<String>> {
    let mut attr: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (k, v) in pairs {
        attr.entry(k.to_string()).or_default().push(v.to_string());
    }
    attr
}

/// What a scripted call should do.
#[derive(Clone)]
pub enum Script<T> {
    Reply(T),
    Fail,
    Hang,
}

/// Index that answers exactly what the test told it to, in order.
pub struct ScriptedIndex {
    pub with_attr: Mutex<Script<Vec<BlobRef>>>,
    pub describe: Mutex<Script<Vec<DescribedBlob>>>,
    pub requests: Mutex<Vec<WithAttrRequest>>,
}

impl ScriptedIndex {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            with_attr: Mutex::new(Script::Reply(Vec::new())),
            describe: Mutex::new(Script::Reply(Vec::new())),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn roots(self: &Arc<Self>, script: Script<Vec<BlobRef>>) -> Arc<Self> {
        *self.with_attr.lock().unwrap() = script;
        Arc::clone(self)
    }

    pub fn described(self: &Arc<Self>, script: Script<Vec<DescribedBlob>>) -> Arc<Self> {
        *self.describe.lock().unwrap() = script;
        Arc::clone(self)
    }

    pub fn session(self: &Arc<Self>) -> Arc<PermaFs> {
        PermaFs::new(Arc::clone(self) as Arc<dyn SearchClient>)
    }
}

#[async_trait]
impl SearchClient for ScriptedIndex {
    async fn permanodes_with_attr(&self, req: &WithAttrRequest) -> Result<WithAttrResponse> {
        self.requests.lock().unwrap().push(req.clone());
        let script = self.with_attr.lock().unwrap().clone();
        match script {
            Script::Reply(refs) => Ok(WithAttrResponse {
                with_attr: refs
                    .into_iter()
                    .map(|permanode| WithAttrItem { permanode })
                    .collect(),
            }),
            Script::Fail => Err(SearchError::Backend("scripted failure".to_string())),
            Script::Hang => std::future::pending().await,
        }
    }

    async fn describe(&self, _br: &BlobRef) -> Result<DescribeResponse> {
        let script = self.describe.lock().unwrap().clone();
        match script {
            Script::Reply(blobs) => {
                let mut res = DescribeResponse::default();
                for blob in blobs {
                    res.insert(blob);
                }
                Ok(res)
            }
            Script::Fail => Err(SearchError::Transport(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "scripted failure",
            ))),
            Script::Hang => std::future::pending().await,
        }
    }
}
