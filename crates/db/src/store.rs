//! # Document Store Contract
//!
//! The reservation calendar keeps its state in an external document store
//! that pushes live updates to its clients. This module describes what the
//! adapters need from such a store: keyed writes on two collections and a
//! subscription that delivers the whole collection every time it changes.

use std::fmt;

use async_trait::async_trait;
use caseta_core::errors::{CasetaError, CasetaResult};
use eyre::eyre;
use serde_json::{Map, Value};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::models::{Document, DocumentSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Reservations,
    Admins,
}

impl Collection {
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Reservations => "reservations",
            Collection::Admins => "admins",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create or overwrite the document at `key`.
    ///
    /// If `server_timestamp` names a field, the store writes its own current
    /// time into that field. Returns the document as stored.
    async fn set(
        &self,
        collection: Collection,
        key: &str,
        data: Map<String, Value>,
        server_timestamp: Option<&'static str>,
    ) -> CasetaResult<Document>;

    /// Merge `fields` into the existing document at `key`.
    ///
    /// Fails with [CasetaError::NotFound] if there is no such document.
    async fn update(
        &self,
        collection: Collection,
        key: &str,
        fields: Map<String, Value>,
    ) -> CasetaResult<()>;

    /// Delete the document at `key`. Deleting a missing key succeeds.
    async fn delete(&self, collection: Collection, key: &str) -> CasetaResult<()>;

    /// Open a live feed of full-collection snapshots.
    async fn subscribe(&self, collection: Collection) -> CasetaResult<Subscription>;
}

/// A live feed of one collection.
///
/// Every delivery replaces the previous one entirely. Dropping the
/// subscription stops the background task feeding it, if any.
pub struct Subscription {
    collection: Collection,
    receiver: watch::Receiver<DocumentSet>,
    primed: bool,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    pub fn new(collection: Collection, receiver: watch::Receiver<DocumentSet>) -> Self {
        Self {
            collection,
            receiver,
            primed: false,
            task: None,
        }
    }

    /// Ties the lifetime of `task` to this subscription.
    pub fn with_task(mut self, task: JoinHandle<()>) -> Self {
        self.task = Some(task);
        self
    }

    pub fn collection(&self) -> Collection {
        self.collection
    }

    /// Yields the current document set on the first call, then waits for
    /// each following change.
    pub async fn next(&mut self) -> CasetaResult<DocumentSet> {
        if self.primed {
            self.receiver.changed().await.map_err(|_| {
                CasetaError::Persistence(eyre!("Subscription to {} closed", self.collection))
            })?;
        }
        self.primed = true;
        Ok(self.receiver.borrow_and_update().clone())
    }

    /// The most recent document set, without waiting.
    pub fn latest(&mut self) -> DocumentSet {
        self.primed = true;
        self.receiver.borrow_and_update().clone()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("collection", &self.collection)
            .field("primed", &self.primed)
            .finish()
    }
}
