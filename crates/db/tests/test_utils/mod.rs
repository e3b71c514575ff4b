use async_trait::async_trait;
use caseta_core::errors::CasetaResult;
use caseta_db::memory::MemoryStore;
use caseta_db::models::Document;
use caseta_db::store::{Collection, DocumentStore, Subscription};
use serde_json::{Map, Value};

/// A [MemoryStore] whose deletes never complete, like a request stuck on a
/// dead connection.
pub struct HungDeletes {
    inner: MemoryStore,
}

impl HungDeletes {
    pub fn new(inner: MemoryStore) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl DocumentStore for HungDeletes {
    async fn set(
        &self,
        collection: Collection,
        key: &str,
        data: Map<String, Value>,
        server_timestamp: Option<&'static str>,
    ) -> CasetaResult<Document> {
        self.inner.set(collection, key, data, server_timestamp).await
    }

    async fn update(
        &self,
        collection: Collection,
        key: &str,
        fields: Map<String, Value>,
    ) -> CasetaResult<()> {
        self.inner.update(collection, key, fields).await
    }

    async fn delete(&self, _collection: Collection, _key: &str) -> CasetaResult<()> {
        std::future::pending().await
    }

    async fn subscribe(&self, collection: Collection) -> CasetaResult<Subscription> {
        self.inner.subscribe(collection).await
    }
}
