//! # Club Session
//!
//! One signed-in client of the reservation calendar. Opening a session signs
//! in with the identity provider and starts the two live feeds (reservations
//! and admins); dropping it tears both down.
//!
//! Mutations return as soon as the store has accepted them. Their effect on
//! [ClubSession::reservations] and [ClubSession::admins] becomes visible with
//! the next delivery, picked up by [ClubSession::refresh_reservations] and
//! [ClubSession::refresh_admins].

use std::sync::Arc;

use caseta_core::access::{AccessControl, MasterCredential, Privilege, SessionState, Tier};
use caseta_core::calendar::{self, MonthCursor, MonthGrid, SelectedBlock};
use caseta_core::errors::{CasetaError, CasetaResult};
use caseta_core::models::admin::Admin;
use caseta_core::models::block::BlockId;
use caseta_core::models::reservation::{NewReservation, Reservation, ReservationSnapshot};
use chrono::NaiveDate;
use tracing::info;

use crate::identity::{IdentityProvider, SessionIdentity};
use crate::repositories::admin::{AdminDirectory, AdminFeed};
use crate::repositories::reservation::{ReservationFeed, ReservationStore};
use crate::store::DocumentStore;

pub struct ClubSession<S: ?Sized> {
    identity: SessionIdentity,
    reservations: ReservationStore<S>,
    directory: AdminDirectory<S>,
    reservation_feed: ReservationFeed<S>,
    admin_feed: AdminFeed,
    snapshot: ReservationSnapshot,
    admins: Vec<Admin>,
    access: AccessControl,
}

impl<S: DocumentStore + ?Sized + 'static> ClubSession<S> {
    pub async fn open(
        store: Arc<S>,
        identity_provider: &dyn IdentityProvider,
        master: MasterCredential,
    ) -> CasetaResult<Self> {
        let identity = identity_provider.sign_in().await?;

        let reservations = ReservationStore::new(Arc::clone(&store));
        let directory = AdminDirectory::new(store);

        let mut reservation_feed = reservations.subscribe().await?;
        let mut admin_feed = directory.subscribe().await?;
        let snapshot = reservation_feed.next().await?;
        let admins = admin_feed.next().await?;

        info!(
            "Session {} opened with {} reservations and {} admins",
            identity.uid,
            snapshot.len(),
            admins.len()
        );

        Ok(Self {
            identity,
            reservations,
            directory,
            reservation_feed,
            admin_feed,
            snapshot,
            admins,
            access: AccessControl::new(master),
        })
    }

    pub fn identity(&self) -> &SessionIdentity {
        &self.identity
    }

    /// Latest materialized reservation view.
    pub fn reservations(&self) -> &ReservationSnapshot {
        &self.snapshot
    }

    /// Latest admin directory, visible to any logged-in admin.
    pub fn admins(&self) -> CasetaResult<&[Admin]> {
        self.access.check_privilege(Privilege::ViewAdmins)?;
        Ok(&self.admins)
    }

    /// Wait for the next reservation delivery and make it current.
    pub async fn refresh_reservations(&mut self) -> CasetaResult<&ReservationSnapshot> {
        self.snapshot = self.reservation_feed.next().await?;
        Ok(&self.snapshot)
    }

    /// Wait for the next admin directory delivery and make it current.
    pub async fn refresh_admins(&mut self) -> CasetaResult<()> {
        self.admins = self.admin_feed.next().await?;
        Ok(())
    }

    pub fn month(&self, cursor: MonthCursor) -> MonthGrid {
        calendar::month_grid(cursor, &self.snapshot)
    }

    pub fn select_day(&self, date: NaiveDate) -> Option<SelectedBlock> {
        calendar::select_day(date, &self.snapshot)
    }

    /// Submit the reservation form for a block. Open to everyone.
    ///
    /// On failure nothing is stored and the caller keeps its form for a retry.
    pub async fn request_reservation(
        &self,
        block_id: BlockId,
        request: &NewReservation,
    ) -> CasetaResult<Reservation> {
        request.validate()?;
        self.reservations.create(block_id, request.clone()).await
    }

    pub async fn confirm_payment(&self, block_id: BlockId) -> CasetaResult<()> {
        self.access.check_privilege(Privilege::ModerateReservations)?;
        if !self.snapshot.contains(&block_id) {
            return Err(CasetaError::NotFound(format!("Reservation for block {}", block_id)));
        }
        self.reservations.confirm_payment(block_id).await
    }

    pub async fn cancel_reservation(&self, block_id: BlockId) -> CasetaResult<()> {
        self.access.check_privilege(Privilege::ModerateReservations)?;
        self.reservations.cancel(block_id).await
    }

    pub fn login(&mut self, member_id: &str, password: &str) -> CasetaResult<Tier> {
        self.access.login(member_id, password, &self.admins)
    }

    pub fn logout(&mut self) {
        self.access.logout();
    }

    pub fn access_state(&self) -> &SessionState {
        self.access.state()
    }

    pub async fn add_admin(&self, member_id: &str, password: &str) -> CasetaResult<()> {
        self.access.check_privilege(Privilege::ManageAdmins)?;
        let added_by = self.access.identity().unwrap_or_default();
        self.directory.add(member_id, password, added_by).await
    }

    pub async fn update_admin_password(&self, member_id: &str, new_password: &str) -> CasetaResult<()> {
        self.access.check_privilege(Privilege::ManageAdmins)?;
        self.directory.update_password(member_id, new_password).await
    }

    pub async fn remove_admin(&self, member_id: &str) -> CasetaResult<()> {
        self.access.check_privilege(Privilege::ManageAdmins)?;
        self.directory.remove(member_id).await
    }
}
