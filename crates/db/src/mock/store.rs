use async_trait::async_trait;
use caseta_core::errors::CasetaResult;
use mockall::mock;
use serde_json::{Map, Value};

use crate::models::Document;
use crate::store::{Collection, DocumentStore, Subscription};

// Mock document store for testing
mock! {
    pub DocStore {}

    #[async_trait]
    impl DocumentStore for DocStore {
        async fn set(
            &self,
            collection: Collection,
            key: &str,
            data: Map<String, Value>,
            server_timestamp: Option<&'static str>,
        ) -> CasetaResult<Document>;

        async fn update(
            &self,
            collection: Collection,
            key: &str,
            fields: Map<String, Value>,
        ) -> CasetaResult<()>;

        async fn delete(
            &self,
            collection: Collection,
            key: &str,
        ) -> CasetaResult<()>;

        async fn subscribe(
            &self,
            collection: Collection,
        ) -> CasetaResult<Subscription>;
    }
}
