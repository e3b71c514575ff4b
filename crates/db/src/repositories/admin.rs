//! Admin Directory Adapter: the collaborator list, keyed by member id.
//!
//! Writes follow document-store upsert semantics; adding an existing member
//! id overwrites it. The master identity never appears here.

use std::sync::Arc;

use caseta_core::errors::{CasetaError, CasetaResult};
use caseta_core::models::admin::Admin;
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use crate::models::Document;
use crate::store::{Collection, DocumentStore, Subscription};

const CREATED_AT_FIELD: &str = "createdAt";

pub struct AdminDirectory<S: ?Sized> {
    store: Arc<S>,
}

impl<S: ?Sized> Clone for AdminDirectory<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: DocumentStore + ?Sized> AdminDirectory<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn subscribe(&self) -> CasetaResult<AdminFeed> {
        let subscription = self.store.subscribe(Collection::Admins).await?;
        Ok(AdminFeed { subscription })
    }

    pub async fn add(&self, member_id: &str, password: &str, added_by: &str) -> CasetaResult<()> {
        if member_id.trim().is_empty() || password.is_empty() {
            return Err(CasetaError::Validation(
                "Member id and password are required".to_string(),
            ));
        }

        let mut data = Map::new();
        data.insert("memberId".to_string(), json!(member_id));
        data.insert("password".to_string(), json!(password));
        data.insert("addedBy".to_string(), json!(added_by));

        self.store
            .set(Collection::Admins, member_id, data, Some(CREATED_AT_FIELD))
            .await
            .inspect_err(|e| warn!("Failed to add admin {}: {}", member_id, e))?;

        info!("Admin {} added by {}", member_id, added_by);
        Ok(())
    }

    /// Overwrites the password only.
    pub async fn update_password(&self, member_id: &str, new_password: &str) -> CasetaResult<()> {
        if new_password.is_empty() {
            return Err(CasetaError::Validation("Password is required".to_string()));
        }

        let mut fields = Map::new();
        fields.insert("password".to_string(), Value::String(new_password.to_string()));

        self.store
            .update(Collection::Admins, member_id, fields)
            .await
            .inspect_err(|e| warn!("Failed to update password of admin {}: {}", member_id, e))?;

        info!("Password of admin {} updated", member_id);
        Ok(())
    }

    pub async fn remove(&self, member_id: &str) -> CasetaResult<()> {
        self.store
            .delete(Collection::Admins, member_id)
            .await
            .inspect_err(|e| warn!("Failed to remove admin {}: {}", member_id, e))?;

        info!("Admin {} removed", member_id);
        Ok(())
    }
}

pub struct AdminFeed {
    subscription: Subscription,
}

fn parse_directory(documents: &[Document]) -> Vec<Admin> {
    let mut admins: Vec<Admin> = documents
        .iter()
        .filter_map(|document| match serde_json::from_value::<Admin>(document.data.clone()) {
            Ok(admin) => Some(admin),
            Err(e) => {
                warn!("Skipping unreadable admin {}: {}", document.key, e);
                None
            }
        })
        .collect();
    admins.sort_by(|a, b| a.member_id.cmp(&b.member_id));
    admins
}

impl AdminFeed {
    /// Wait for the next directory delivery (the current one on first call).
    pub async fn next(&mut self) -> CasetaResult<Vec<Admin>> {
        let documents = self.subscription.next().await?;
        Ok(parse_directory(&documents))
    }

    pub fn latest(&mut self) -> Vec<Admin> {
        parse_directory(&self.subscription.latest())
    }
}
