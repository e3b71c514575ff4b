//! Periodic expiry sweep.
//!
//! Expiry normally happens whenever a client observes the reservation feed.
//! The sweeper is such an observer that never goes away: it ingests every
//! delivery and, on each interval tick, re-ingests the latest one so stale
//! pending reservations are removed even when nothing else changes.

use std::future::Future;
use std::time::Duration;

use caseta_core::errors::CasetaResult;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::repositories::reservation::ReservationFeed;
use crate::store::DocumentStore;

pub struct Sweeper<S: ?Sized> {
    feed: ReservationFeed<S>,
    period: Duration,
}

impl<S: DocumentStore + ?Sized + 'static> Sweeper<S> {
    pub fn new(feed: ReservationFeed<S>, period: Duration) -> Self {
        Self { feed, period }
    }

    /// Run until `shutdown` completes or the feed closes.
    pub async fn run_until<F>(mut self, shutdown: F) -> CasetaResult<()>
    where
        F: Future<Output = ()>,
    {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        info!("Expiry sweeper running every {:?}", self.period);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Expiry sweeper stopping");
                    return Ok(());
                }
                // Only waits on the change notification, so losing the race
                // to a tick or shutdown drops no delivery.
                snapshot = self.feed.next() => {
                    let snapshot = snapshot?;
                    debug!("Reservation feed delivered {} active reservations", snapshot.len());
                }
                _ = ticker.tick() => {
                    let snapshot = self.feed.latest();
                    debug!("Sweep tick: {} active reservations", snapshot.len());
                }
            }
        }
    }
}
