use std::sync::Arc;

use permafs_config::{Config, RootsConfig};
use permafs_ipc::IndexClient;
use permafs_search::{SearchClient, ATTR_CAMLI_ROOT};

use crate::node::Node;
use crate::roots::RootsDir;

/// Options fixed for the lifetime of a mount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsOptions {
    /// Attribute marking roots
    pub roots_attribute: String,
    /// Maximum roots listed
    pub roots_limit: usize,
}

impl Default for FsOptions {
    fn default() -> Self {
        Self {
            roots_attribute: ATTR_CAMLI_ROOT.to_string(),
            roots_limit: 100,
        }
    }
}

impl From<&RootsConfig> for FsOptions {
    fn from(roots: &RootsConfig) -> Self {
        Self {
            roots_attribute: roots.attribute.clone(),
            roots_limit: roots.limit,
        }
    }
}

/// One mounted filesystem.
///
/// Every node built for the mount holds an `Arc` to this session and reaches
/// the index only through it.
pub struct PermaFs {
    client: Arc<dyn SearchClient>,
    options: FsOptions,
}

impl PermaFs {
    pub fn new(client: Arc<dyn SearchClient>) -> Arc<Self> {
        Self::with_options(client, FsOptions::default())
    }

    pub fn with_options(client: Arc<dyn SearchClient>, options: FsOptions) -> Arc<Self> {
        Arc::new(Self { client, options })
    }

    /// Session talking to the index daemon named in `config`.
    pub fn from_config(config: &Config) -> Arc<Self> {
        let client = Arc::new(IndexClient::from_config(&config.index));
        Self::with_options(client, FsOptions::from(&config.roots))
    }

    /// The roots directory of this mount.
    pub fn root(self: &Arc<Self>) -> Node {
        Node::Roots(RootsDir::new(Arc::clone(self)))
    }

    pub fn options(&self) -> &FsOptions {
        &self.options
    }

    pub(crate) fn client(&self) -> &dyn SearchClient {
        self.client.as_ref()
    }
}

impl std::fmt::Debug for PermaFs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermaFs")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
