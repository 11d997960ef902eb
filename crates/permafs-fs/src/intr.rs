//! Request interruption.
//!
//! The bridge hands every operation an [`Intr`]. Backend calls race it, so an
//! interrupted request returns [`FsError::Cancelled`] without waiting for
//! the index.

use std::future::{pending, Future};

use permafs_search::SearchError;
use tokio::sync::watch;

use crate::error::{FsError, Result};

/// Fires the paired [`Intr`].
#[derive(Debug)]
pub struct Interrupter {
    tx: watch::Sender<bool>,
}

impl Interrupter {
    pub fn interrupt(&self) {
        self.tx.send_replace(true);
    }
}

/// Interruption signal observed by an operation.
#[derive(Debug, Clone)]
pub struct Intr {
    rx: Option<watch::Receiver<bool>>,
}

impl Intr {
    /// An operation nobody can interrupt.
    pub fn never() -> Self {
        Self { rx: None }
    }

    pub fn pair() -> (Interrupter, Intr) {
        let (tx, rx) = watch::channel(false);
        (Interrupter { tx }, Intr { rx: Some(rx) })
    }

    pub fn is_interrupted(&self) -> bool {
        self.rx.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Resolves once interrupted; never resolves if the interrupter is
    /// dropped without firing.
    pub async fn interrupted(&self) {
        let Some(rx) = &self.rx else {
            return pending().await;
        };
        let mut rx = rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                return pending().await;
            }
        }
    }

    /// Run a backend call unless interrupted first.
    pub async fn run<F, T>(&self, call: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, SearchError>>,
    {
        tokio::select! {
            biased;
            _ = self.interrupted() => Err(FsError::Cancelled),
            res = call => res.map_err(FsError::Io),
        }
    }
}

impl Default for Intr {
    fn default() -> Self {
        Self::never()
    }
}
