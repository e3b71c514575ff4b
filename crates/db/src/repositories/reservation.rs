//! # Reservation Store Adapter
//!
//! Owns the mapping from block id to reservation. All writes go through
//! [ReservationStore]; readers get a [ReservationSnapshot] materialized from
//! each delivery of the live reservation feed.
//!
//! ## Expiry on read
//!
//! Pending reservations are never expired by a timer. Instead, every time a
//! snapshot is ingested, each pending record older than five days is left out
//! of the returned view and a delete is issued for it. The delete runs on its
//! own task and is best effort: the view never waits for it, a failure is
//! logged and not retried, and the next observer will try again. Concurrent
//! observers may both delete the same key, which the store treats as a no-op.
//!
//! ## Concurrency
//!
//! Writes are keyed by block id only; there is no transaction spanning the
//! "block is free" check and the following [ReservationStore::create]. Two
//! near-simultaneous bookings of the same block are resolved by whichever
//! write reaches the store last.

use std::sync::Arc;

use caseta_core::errors::{CasetaError, CasetaResult};
use caseta_core::models::block::BlockId;
use caseta_core::models::reservation::{
    NewReservation, Reservation, ReservationSnapshot, ReservationStatus,
};
use chrono::{DateTime, Utc};
use eyre::{eyre, WrapErr};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::models::Document;
use crate::store::{Collection, DocumentStore, Subscription};

const CREATED_AT_FIELD: &str = "createdAt";

pub struct ReservationStore<S: ?Sized> {
    store: Arc<S>,
}

impl<S: ?Sized> Clone for ReservationStore<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

fn parse_document(document: &Document) -> Option<(BlockId, Reservation)> {
    let block_id = match document.key.parse::<BlockId>() {
        Ok(block_id) => block_id,
        Err(e) => {
            warn!("Skipping reservation with malformed key {}: {}", document.key, e);
            return None;
        }
    };
    match serde_json::from_value::<Reservation>(document.data.clone()) {
        Ok(reservation) => Some((block_id, reservation)),
        Err(e) => {
            warn!("Skipping unreadable reservation {}: {}", document.key, e);
            None
        }
    }
}

impl<S: DocumentStore + ?Sized + 'static> ReservationStore<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Open the live reservation feed.
    pub async fn subscribe(&self) -> CasetaResult<ReservationFeed<S>> {
        let subscription = self.store.subscribe(Collection::Reservations).await?;
        Ok(ReservationFeed {
            store: self.clone(),
            subscription,
        })
    }

    /// Materialize one delivery of the reservation collection as seen at
    /// `now`, issuing a background delete for every expired pending
    /// reservation. Must be called inside a Tokio runtime.
    pub fn ingest(&self, documents: &[Document], now: DateTime<Utc>) -> ReservationSnapshot {
        let mut expired = Vec::new();
        let snapshot: ReservationSnapshot = documents
            .iter()
            .filter_map(parse_document)
            .filter(|(block_id, reservation)| {
                if reservation.is_expired(now) {
                    expired.push(*block_id);
                    false
                } else {
                    true
                }
            })
            .collect();

        for block_id in expired {
            info!("Pending reservation for block {} expired", block_id);
            let store = Arc::clone(&self.store);
            tokio::spawn(async move {
                let key = block_id.to_string();
                if let Err(e) = store.delete(Collection::Reservations, &key).await {
                    warn!("Failed to delete expired reservation {}: {}", block_id, e);
                }
            });
        }

        snapshot
    }

    /// Store a new `pending` reservation for `block_id`.
    ///
    /// Overwrites whatever is stored at that key; callers only offer this on
    /// blocks without a reservation. The request is stored as given, form
    /// validation belongs to the caller.
    pub async fn create(
        &self,
        block_id: BlockId,
        request: NewReservation,
    ) -> CasetaResult<Reservation> {
        let reservation = Reservation::pending(block_id, request);
        let data = match serde_json::to_value(&reservation)
            .wrap_err("Failed to encode reservation")?
        {
            Value::Object(data) => data,
            other => {
                return Err(CasetaError::Persistence(eyre!(
                    "Reservation encoded as non-object: {}",
                    other
                )));
            }
        };

        let stored = self
            .store
            .set(
                Collection::Reservations,
                &block_id.to_string(),
                data,
                Some(CREATED_AT_FIELD),
            )
            .await
            .inspect_err(|e| warn!("Failed to create reservation for block {}: {}", block_id, e))?;

        info!(
            "Created pending reservation for block {} ({} EUR)",
            block_id, reservation.price
        );
        let reservation = serde_json::from_value(stored.data)
            .wrap_err_with(|| format!("Stored reservation {} is unreadable", block_id))?;
        Ok(reservation)
    }

    /// Mark the reservation at `block_id` as paid.
    pub async fn confirm_payment(&self, block_id: BlockId) -> CasetaResult<()> {
        let mut fields = Map::new();
        fields.insert(
            "status".to_string(),
            serde_json::to_value(ReservationStatus::Confirmed)
                .wrap_err("Failed to encode reservation status")?,
        );

        self.store
            .update(Collection::Reservations, &block_id.to_string(), fields)
            .await
            .inspect_err(|e| warn!("Failed to confirm payment for block {}: {}", block_id, e))?;

        info!("Confirmed payment for block {}", block_id);
        Ok(())
    }

    /// Delete the reservation at `block_id`, whatever its status.
    pub async fn cancel(&self, block_id: BlockId) -> CasetaResult<()> {
        self.store
            .delete(Collection::Reservations, &block_id.to_string())
            .await
            .inspect_err(|e| warn!("Failed to cancel reservation for block {}: {}", block_id, e))?;

        info!("Cancelled reservation for block {}", block_id);
        Ok(())
    }
}

/// Live reservation view; every delivery is ingested with the expiry rule.
pub struct ReservationFeed<S: ?Sized> {
    store: ReservationStore<S>,
    subscription: Subscription,
}

impl<S: DocumentStore + ?Sized + 'static> ReservationFeed<S> {
    /// Wait for the next delivery (the current one on first call).
    pub async fn next(&mut self) -> CasetaResult<ReservationSnapshot> {
        let documents = self.subscription.next().await?;
        debug!("Received {} reservation documents", documents.len());
        Ok(self.store.ingest(&documents, Utc::now()))
    }

    /// Re-ingest the most recent delivery at the current time.
    pub fn latest(&mut self) -> ReservationSnapshot {
        let documents = self.subscription.latest();
        self.store.ingest(&documents, Utc::now())
    }
}
