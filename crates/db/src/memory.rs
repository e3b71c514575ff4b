use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use caseta_core::errors::{CasetaError, CasetaResult};
use chrono::Utc;
use eyre::eyre;
use serde_json::{Map, Value};
use tokio::sync::watch;

use crate::models::{Document, DocumentSet};
use crate::store::{Collection, DocumentStore, Subscription};

/**
 * An in-process [DocumentStore].
 *
 * Each collection is a sorted map of keys to JSON bodies. Every mutation
 * publishes the full collection to all subscribers through a watch channel,
 * mirroring the push behaviour of the real store.
 *
 * [MemoryStore::fail_next] makes the next store call fail, to simulate a
 * transport error.
 */
#[derive(Default)]
pub struct MemoryStore {
    data: Mutex<MemoryStoreData>,
}

#[derive(Default)]
struct MemoryStoreData {
    collections: HashMap<Collection, BTreeMap<String, Value>>,
    channels: HashMap<Collection, watch::Sender<DocumentSet>>,
    /// If not none, the next call to a store method will return this error.
    next_error: Option<CasetaError>,
}

impl MemoryStoreData {
    fn snapshot(&self, collection: Collection) -> DocumentSet {
        let documents = self
            .collections
            .get(&collection)
            .map(|docs| {
                docs.iter()
                    .map(|(key, data)| Document {
                        key: key.clone(),
                        data: data.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Arc::new(documents)
    }

    fn publish(&mut self, collection: Collection) {
        let snapshot = self.snapshot(collection);
        if let Some(sender) = self.channels.get(&collection) {
            sender.send_replace(snapshot);
        }
    }

    fn take_error(&mut self) -> CasetaResult<()> {
        match self.next_error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> CasetaResult<MutexGuard<'_, MemoryStoreData>> {
        self.data
            .lock()
            .map_err(|_| CasetaError::Persistence(eyre!("Memory store lock poisoned")))
    }

    /// Make the next store call fail with `error`.
    pub fn fail_next(&self, error: CasetaError) -> CasetaResult<()> {
        self.lock()?.next_error = Some(error);
        Ok(())
    }

    /// Write a raw document, bypassing server timestamps. Subscribers are
    /// notified as for any other write.
    pub fn seed(&self, collection: Collection, key: &str, data: Value) -> CasetaResult<()> {
        let mut data_guard = self.lock()?;
        data_guard
            .collections
            .entry(collection)
            .or_default()
            .insert(key.to_string(), data);
        data_guard.publish(collection);
        Ok(())
    }

    /// Read a raw document.
    pub fn get(&self, collection: Collection, key: &str) -> CasetaResult<Option<Value>> {
        Ok(self
            .lock()?
            .collections
            .get(&collection)
            .and_then(|docs| docs.get(key).cloned()))
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn set(
        &self,
        collection: Collection,
        key: &str,
        mut data: Map<String, Value>,
        server_timestamp: Option<&'static str>,
    ) -> CasetaResult<Document> {
        let mut store = self.lock()?;
        store.take_error()?;

        if let Some(field) = server_timestamp {
            data.insert(field.to_string(), Value::String(Utc::now().to_rfc3339()));
        }
        let data = Value::Object(data);
        store
            .collections
            .entry(collection)
            .or_default()
            .insert(key.to_string(), data.clone());
        store.publish(collection);

        Ok(Document {
            key: key.to_string(),
            data,
        })
    }

    async fn update(
        &self,
        collection: Collection,
        key: &str,
        fields: Map<String, Value>,
    ) -> CasetaResult<()> {
        let mut store = self.lock()?;
        store.take_error()?;

        let existing = store
            .collections
            .get_mut(&collection)
            .and_then(|docs| docs.get_mut(key))
            .and_then(Value::as_object_mut)
            .ok_or_else(|| CasetaError::NotFound(format!("{}/{}", collection, key)))?;
        existing.extend(fields);
        store.publish(collection);
        Ok(())
    }

    async fn delete(&self, collection: Collection, key: &str) -> CasetaResult<()> {
        let mut store = self.lock()?;
        store.take_error()?;

        let removed = store
            .collections
            .get_mut(&collection)
            .and_then(|docs| docs.remove(key))
            .is_some();
        if removed {
            store.publish(collection);
        }
        Ok(())
    }

    async fn subscribe(&self, collection: Collection) -> CasetaResult<Subscription> {
        let mut store = self.lock()?;
        store.take_error()?;

        let snapshot = store.snapshot(collection);
        let receiver = match store.channels.get(&collection) {
            Some(sender) => sender.subscribe(),
            None => {
                let (sender, receiver) = watch::channel(snapshot);
                store.channels.insert(collection, sender);
                receiver
            }
        };
        Ok(Subscription::new(collection, receiver))
    }
}
