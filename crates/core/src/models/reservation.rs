use std::collections::BTreeMap;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{CasetaError, CasetaResult};
use crate::models::block::BlockId;

/// Price of a block for club members.
pub const MEMBER_PRICE: u32 = 100;
/// Price of a block for everyone else.
pub const NON_MEMBER_PRICE: u32 = 300;
/// A pending reservation older than this is dropped.
pub const PENDING_EXPIRY_DAYS: i64 = 5;

pub fn price_for(is_member: bool) -> u32 {
    if is_member { MEMBER_PRICE } else { NON_MEMBER_PRICE }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
}

/// A persisted reservation, keyed by its block id.
///
/// `price` and the holder's identity are fixed at creation; only `status`
/// ever changes afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub start_date: BlockId,
    pub status: ReservationStatus,
    pub first_name: String,
    pub last_name: String,
    pub is_member: bool,
    #[serde(default)]
    pub member_number: Option<String>,
    pub price: u32,
    /// Assigned by the store; absent until the server timestamp resolves.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Reservation {
    /// Builds a fresh `pending` reservation for `block_id` from a submitted form.
    pub fn pending(block_id: BlockId, request: NewReservation) -> Self {
        let member_number = request
            .member_number
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        Self {
            start_date: block_id,
            status: ReservationStatus::Pending,
            first_name: request.first_name,
            last_name: request.last_name,
            is_member: request.is_member,
            member_number,
            price: price_for(request.is_member),
            created_at: None,
        }
    }

    fn pending_age(&self, now: DateTime<Utc>) -> Option<TimeDelta> {
        match (self.status, self.created_at) {
            (ReservationStatus::Pending, Some(created_at)) => Some(now - created_at),
            _ => None,
        }
    }

    /// A pending reservation expires once strictly more than five days have
    /// passed since its creation. Confirmed or unstamped ones never do.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.pending_age(now)
            .is_some_and(|age| age > TimeDelta::days(PENDING_EXPIRY_DAYS))
    }

    /// Days left to pay: five minus the elapsed days rounded up, never
    /// negative. Zero for confirmed or unstamped reservations.
    pub fn days_left(&self, now: DateTime<Utc>) -> i64 {
        let Some(age) = self.pending_age(now) else {
            return 0;
        };
        let elapsed_days = age.num_days() + i64::from(age > TimeDelta::days(age.num_days()));
        (PENDING_EXPIRY_DAYS - elapsed_days).max(0)
    }

    pub fn holder_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// The reservation form as submitted by a member.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReservation {
    pub first_name: String,
    pub last_name: String,
    pub is_member: bool,
    pub member_number: Option<String>,
}

impl NewReservation {
    pub fn validate(&self) -> CasetaResult<()> {
        if self.first_name.trim().is_empty() {
            return Err(CasetaError::Validation("First name is required".to_string()));
        }
        if self.last_name.trim().is_empty() {
            return Err(CasetaError::Validation("Last name is required".to_string()));
        }
        Ok(())
    }
}

/// Materialized view of all non-expired reservations, keyed by block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReservationSnapshot {
    reservations: BTreeMap<BlockId, Reservation>,
}

impl ReservationSnapshot {
    pub fn get(&self, block_id: &BlockId) -> Option<&Reservation> {
        self.reservations.get(block_id)
    }

    pub fn contains(&self, block_id: &BlockId) -> bool {
        self.reservations.contains_key(block_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&BlockId, &Reservation)> {
        self.reservations.iter()
    }

    pub fn len(&self) -> usize {
        self.reservations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reservations.is_empty()
    }
}

impl FromIterator<(BlockId, Reservation)> for ReservationSnapshot {
    fn from_iter<T: IntoIterator<Item = (BlockId, Reservation)>>(iter: T) -> Self {
        Self {
            reservations: iter.into_iter().collect(),
        }
    }
}
