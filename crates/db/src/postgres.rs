//! PostgreSQL-backed [DocumentStore].
//!
//! All collections share the `documents` table, keyed by
//! `(app_id, collection, key)` with a JSONB body. A trigger announces every
//! change on [CHANGE_CHANNEL]; each subscription runs a [PgListener] task that
//! reloads the whole collection whenever its own `<app_id>/<collection>`
//! payload arrives.

use async_trait::async_trait;
use caseta_core::errors::{CasetaError, CasetaResult};
use eyre::{Result, WrapErr};
use serde_json::{Map, Value};
use sqlx::postgres::PgListener;
use sqlx::{Pool, Postgres};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::models::{Document, DocumentSet};
use crate::schema::CHANGE_CHANNEL;
use crate::store::{Collection, DocumentStore, Subscription};

#[derive(Clone)]
pub struct PgDocumentStore {
    pool: Pool<Postgres>,
    app_id: String,
}

impl PgDocumentStore {
    pub fn new(pool: Pool<Postgres>, app_id: impl Into<String>) -> Self {
        Self {
            pool,
            app_id: app_id.into(),
        }
    }

    fn channel_payload(&self, collection: Collection) -> String {
        format!("{}/{}", self.app_id, collection)
    }
}

async fn fetch_collection(
    pool: &Pool<Postgres>,
    app_id: &str,
    collection: Collection,
) -> Result<DocumentSet> {
    let documents = sqlx::query_as::<_, Document>(
        r#"
        SELECT key, data
        FROM documents
        WHERE app_id = $1 AND collection = $2
        ORDER BY key ASC
        "#,
    )
    .bind(app_id)
    .bind(collection.name())
    .fetch_all(pool)
    .await
    .wrap_err_with(|| format!("Failed to load collection {}", collection))?;

    Ok(Arc::new(documents))
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn set(
        &self,
        collection: Collection,
        key: &str,
        data: Map<String, Value>,
        server_timestamp: Option<&'static str>,
    ) -> CasetaResult<Document> {
        debug!("Setting document {}/{}", collection, key);

        let document = sqlx::query_as::<_, Document>(
            r#"
            INSERT INTO documents (app_id, collection, key, data)
            VALUES (
                $1, $2, $3,
                CASE WHEN $5::TEXT IS NULL THEN $4::JSONB
                     ELSE jsonb_set($4::JSONB, ARRAY[$5::TEXT], to_jsonb(NOW()))
                END
            )
            ON CONFLICT (app_id, collection, key)
            DO UPDATE SET data = EXCLUDED.data, updated_at = NOW()
            RETURNING key, data
            "#,
        )
        .bind(&self.app_id)
        .bind(collection.name())
        .bind(key)
        .bind(Value::Object(data))
        .bind(server_timestamp)
        .fetch_one(&self.pool)
        .await
        .wrap_err_with(|| format!("Failed to write document {}/{}", collection, key))?;

        Ok(document)
    }

    async fn update(
        &self,
        collection: Collection,
        key: &str,
        fields: Map<String, Value>,
    ) -> CasetaResult<()> {
        debug!("Updating document {}/{}", collection, key);

        let result = sqlx::query(
            r#"
            UPDATE documents
            SET data = data || $4::JSONB, updated_at = NOW()
            WHERE app_id = $1 AND collection = $2 AND key = $3
            "#,
        )
        .bind(&self.app_id)
        .bind(collection.name())
        .bind(key)
        .bind(Value::Object(fields))
        .execute(&self.pool)
        .await
        .wrap_err_with(|| format!("Failed to update document {}/{}", collection, key))?;

        if result.rows_affected() == 0 {
            return Err(CasetaError::NotFound(format!("{}/{}", collection, key)));
        }
        Ok(())
    }

    async fn delete(&self, collection: Collection, key: &str) -> CasetaResult<()> {
        debug!("Deleting document {}/{}", collection, key);

        sqlx::query(
            r#"
            DELETE FROM documents
            WHERE app_id = $1 AND collection = $2 AND key = $3
            "#,
        )
        .bind(&self.app_id)
        .bind(collection.name())
        .bind(key)
        .execute(&self.pool)
        .await
        .wrap_err_with(|| format!("Failed to delete document {}/{}", collection, key))?;

        Ok(())
    }

    async fn subscribe(&self, collection: Collection) -> CasetaResult<Subscription> {
        // Listen before the initial load so no change slips in between.
        let mut listener = PgListener::connect_with(&self.pool)
            .await
            .wrap_err("Failed to open change listener")?;
        listener
            .listen(CHANGE_CHANNEL)
            .await
            .wrap_err_with(|| format!("Failed to listen on {}", CHANGE_CHANNEL))?;

        let initial = fetch_collection(&self.pool, &self.app_id, collection).await?;
        let (sender, receiver) = watch::channel(initial);

        let pool = self.pool.clone();
        let app_id = self.app_id.clone();
        let payload = self.channel_payload(collection);
        let task = tokio::spawn(async move {
            loop {
                let notification = match listener.recv().await {
                    Ok(notification) => notification,
                    Err(e) => {
                        warn!("Change listener for {} failed: {}", payload, e);
                        break;
                    }
                };
                if notification.payload() != payload {
                    continue;
                }
                match fetch_collection(&pool, &app_id, collection).await {
                    Ok(documents) => {
                        if sender.send(documents).is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!("Failed to reload {}: {:?}", payload, e),
                }
            }
        });

        Ok(Subscription::new(collection, receiver).with_task(task))
    }
}
