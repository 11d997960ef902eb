//! # permafs-ipc
//!
//! Talks to a permanode index daemon over a Unix domain socket.
//!
//! ## Framing
//!
//! ```text
//! +----------------+---------------------------+
//! | len: u32 (LE)  | bincode(IndexRequest/...) |
//! +----------------+---------------------------+
//! ```
//!
//! [`IndexClient`] implements [`SearchClient`] by opening one connection per
//! request, so any number of filesystem operations can share it without
//! locking. [`serve`] answers the same frames from any [`SearchClient`].

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use permafs_blobref::BlobRef;
use permafs_config::{log_index_debug, log_index_warn, IndexConfig};
use permafs_search::{
    DescribeResponse, Result, SearchClient, SearchError, WithAttrRequest, WithAttrResponse,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tracing::field::display;

/// Largest frame either side will accept
pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

#[derive(Debug, Serialize, Deserialize)]
pub enum IndexRequest {
    Handshake { client_version: String },
    PermanodesWithAttr(WithAttrRequest),
    Describe { blob_ref: BlobRef },
}

#[derive(Debug, Serialize, Deserialize)]
pub enum IndexResponse {
    HandshakeAck { server_version: String },
    WithAttr(WithAttrResponse),
    Describe(DescribeResponse),
    Error(String),
}

/// Write one length-prefixed frame.
pub async fn write_frame<W, T>(w: &mut W, msg: &T) -> Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let payload = bincode::serialize(msg).map_err(|e| SearchError::Protocol(e.to_string()))?;
    if payload.len() > MAX_FRAME_LEN {
        return Err(SearchError::Protocol(format!(
            "frame too large: {} bytes",
            payload.len()
        )));
    }
    w.write_all(&(payload.len() as u32).to_le_bytes()).await?;
    w.write_all(&payload).await?;
    w.flush().await?;
    Ok(())
}

/// Read one length-prefixed frame. `None` on clean EOF before a header.
pub async fn read_frame<R, T>(r: &mut R) -> Result<Option<T>>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let mut len_buf = [0u8; 4];
    match r.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }
    let len = u32::from_le_bytes(len_buf) as usize;
    if len > MAX_FRAME_LEN {
        return Err(SearchError::Protocol(format!("frame too large: {} bytes", len)));
    }

    let mut payload = vec![0u8; len];
    r.read_exact(&mut payload).await?;
    let msg = bincode::deserialize(&payload).map_err(|e| SearchError::Protocol(e.to_string()))?;
    Ok(Some(msg))
}

/// Client for an index daemon
#[derive(Debug, Clone)]
pub struct IndexClient {
    socket_path: PathBuf,
    request_timeout: Option<Duration>,
}

impl IndexClient {
    pub fn new<P: AsRef<Path>>(socket_path: P) -> Self {
        Self {
            socket_path: socket_path.as_ref().to_path_buf(),
            request_timeout: None,
        }
    }

    pub fn from_config(config: &IndexConfig) -> Self {
        Self {
            socket_path: config.socket.clone(),
            request_timeout: config.request_timeout_ms.map(Duration::from_millis),
        }
    }

    /// Fail requests that take longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Send a request and receive its response
    pub async fn call(&self, request: IndexRequest) -> Result<IndexResponse> {
        match self.request_timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.round_trip(&request))
                .await
                .map_err(|_| SearchError::Timeout {
                    millis: timeout.as_millis() as u64,
                })?,
            None => self.round_trip(&request).await,
        }
    }

    async fn round_trip(&self, request: &IndexRequest) -> Result<IndexResponse> {
        let mut stream = UnixStream::connect(&self.socket_path).await?;
        write_frame(&mut stream, request).await?;
        read_frame(&mut stream).await?.ok_or_else(|| {
            SearchError::Protocol("connection closed before response".to_string())
        })
    }

    /// Handshake with the daemon, returning its version
    pub async fn handshake(&self) -> Result<String> {
        let request = IndexRequest::Handshake {
            client_version: env!("CARGO_PKG_VERSION").to_string(),
        };
        match self.call(request).await? {
            IndexResponse::HandshakeAck { server_version } => Ok(server_version),
            IndexResponse::Error(e) => Err(SearchError::Backend(e)),
            other => Err(unexpected(&other)),
        }
    }
}

fn unexpected(resp: &IndexResponse) -> SearchError {
    SearchError::Protocol(format!("unexpected response: {:?}", resp))
}

#[async_trait]
impl SearchClient for IndexClient {
    async fn permanodes_with_attr(&self, req: &WithAttrRequest) -> Result<WithAttrResponse> {
        match self.call(IndexRequest::PermanodesWithAttr(req.clone())).await? {
            IndexResponse::WithAttr(res) => Ok(res),
            IndexResponse::Error(e) => Err(SearchError::Backend(e)),
            other => Err(unexpected(&other)),
        }
    }

    async fn describe(&self, br: &BlobRef) -> Result<DescribeResponse> {
        let request = IndexRequest::Describe {
            blob_ref: br.clone(),
        };
        match self.call(request).await? {
            IndexResponse::Describe(res) => Ok(res),
            IndexResponse::Error(e) => Err(SearchError::Backend(e)),
            other => Err(unexpected(&other)),
        }
    }
}

/// Accept connections forever, answering from `index`.
pub async fn serve(listener: UnixListener, index: Arc<dyn SearchClient>) -> Result<()> {
    loop {
        let (stream, _addr) = listener.accept().await?;
        let index = Arc::clone(&index);
        tokio::spawn(async move {
            if let Err(e) = serve_connection(stream, index.as_ref()).await {
                log_index_warn!("Client handler error", error = display(&e));
            }
        });
    }
}

/// Answer requests on one connection until the peer hangs up.
pub async fn serve_connection(mut stream: UnixStream, index: &dyn SearchClient) -> Result<()> {
    while let Some(request) = read_frame::<_, IndexRequest>(&mut stream).await? {
        log_index_debug!("Received request", request = tracing::field::debug(&request));
        let response = match request {
            IndexRequest::Handshake { .. } => IndexResponse::HandshakeAck {
                server_version: env!("CARGO_PKG_VERSION").to_string(),
            },
            IndexRequest::PermanodesWithAttr(req) => match index.permanodes_with_attr(&req).await {
                Ok(res) => IndexResponse::WithAttr(res),
                Err(e) => IndexResponse::Error(e.to_string()),
            },
            IndexRequest::Describe { blob_ref } => match index.describe(&blob_ref).await {
                Ok(res) => IndexResponse::Describe(res),
                Err(e) => IndexResponse::Error(e.to_string()),
            },
        };
        write_frame(&mut stream, &response).await?;
    }
    log_index_debug!("Client disconnected");
    Ok(())
}
