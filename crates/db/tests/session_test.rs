use std::sync::Arc;

use caseta_core::access::{MasterCredential, SessionState, Tier};
use caseta_core::calendar::{DayStatus, MonthCursor};
use caseta_core::errors::CasetaError;
use caseta_core::models::block::BlockId;
use caseta_core::models::reservation::{NewReservation, ReservationStatus};
use caseta_db::identity::{AnonymousSignIn, TokenSignIn};
use caseta_db::memory::MemoryStore;
use caseta_db::session::ClubSession;
use caseta_db::store::Collection;
use chrono::NaiveDate;
use pretty_assertions::assert_eq;

fn block(id: &str) -> BlockId {
    id.parse().unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn master() -> MasterCredential {
    MasterCredential::new("123", "test")
}

fn ana() -> NewReservation {
    NewReservation {
        first_name: "Ana".to_string(),
        last_name: "López".to_string(),
        is_member: false,
        member_number: None,
    }
}

async fn open(memory: &Arc<MemoryStore>) -> ClubSession<MemoryStore> {
    ClubSession::open(Arc::clone(memory), &AnonymousSignIn, master())
        .await
        .unwrap()
}

#[test_log::test(tokio::test)]
async fn test_reservation_lifecycle() {
    let memory = Arc::new(MemoryStore::new());
    let mut session = open(&memory).await;
    assert!(session.identity().anonymous);
    assert!(session.reservations().is_empty());

    // A Saturday click resolves to the Thursday block.
    let selected = session.select_day(date(2025, 6, 7)).unwrap();
    assert_eq!(selected.block.id, block("2025-06-05"));
    assert!(selected.is_bookable());

    let created = session
        .request_reservation(selected.block.id, &ana())
        .await
        .unwrap();
    assert_eq!(created.status, ReservationStatus::Pending);
    assert_eq!(created.price, 300);

    let snapshot = session.refresh_reservations().await.unwrap();
    let stored = snapshot.get(&block("2025-06-05")).unwrap();
    assert_eq!(stored.holder_name(), "Ana López");
    assert!(!session.select_day(date(2025, 6, 9)).unwrap().is_bookable());

    session.login("123", "test").unwrap();
    session.confirm_payment(block("2025-06-05")).await.unwrap();
    session.refresh_reservations().await.unwrap();

    let grid = session.month(MonthCursor::new(2025, 6).unwrap());
    let thursday = grid.days.iter().find(|d| d.date == date(2025, 6, 5)).unwrap();
    assert_eq!(thursday.status, DayStatus::Confirmed);
    let tuesday = grid.days.iter().find(|d| d.date == date(2025, 6, 10)).unwrap();
    assert_eq!(tuesday.status, DayStatus::Closed);

    session.cancel_reservation(block("2025-06-05")).await.unwrap();
    session.refresh_reservations().await.unwrap();
    assert!(!session.reservations().contains(&block("2025-06-05")));
    assert_eq!(memory.get(Collection::Reservations, "2025-06-05").unwrap(), None);
}

#[test_log::test(tokio::test)]
async fn test_blank_names_are_rejected_before_writing() {
    let memory = Arc::new(MemoryStore::new());
    let session = open(&memory).await;

    let mut request = ana();
    request.last_name = "  ".to_string();
    let result = session.request_reservation(block("2025-06-05"), &request).await;

    assert!(matches!(result, Err(CasetaError::Validation(_))));
    assert_eq!(memory.get(Collection::Reservations, "2025-06-05").unwrap(), None);
}

#[test_log::test(tokio::test)]
async fn test_moderation_requires_login() {
    let memory = Arc::new(MemoryStore::new());
    let mut session = open(&memory).await;
    session.request_reservation(block("2025-06-05"), &ana()).await.unwrap();
    session.refresh_reservations().await.unwrap();

    let confirm = session.confirm_payment(block("2025-06-05")).await;
    assert!(matches!(confirm, Err(CasetaError::Authorization(_))));
    let cancel = session.cancel_reservation(block("2025-06-05")).await;
    assert!(matches!(cancel, Err(CasetaError::Authorization(_))));
    assert!(matches!(session.admins(), Err(CasetaError::Authorization(_))));

    let stored = memory.get(Collection::Reservations, "2025-06-05").unwrap().unwrap();
    assert_eq!(stored["status"], "pending");
}

#[test_log::test(tokio::test)]
async fn test_confirm_payment_of_unknown_block_is_not_found() {
    let memory = Arc::new(MemoryStore::new());
    let mut session = open(&memory).await;
    session.login("123", "test").unwrap();

    let result = session.confirm_payment(block("2025-06-12")).await;
    assert!(matches!(result, Err(CasetaError::NotFound(_))));
}

#[test_log::test(tokio::test)]
async fn test_wrong_master_password_is_rejected() {
    let memory = Arc::new(MemoryStore::new());
    let mut session = open(&memory).await;

    let result = session.login("123", "wrong");
    assert!(matches!(result, Err(CasetaError::AuthFailure(_))));
    assert_eq!(session.access_state(), &SessionState::LoggedOut);
}

#[test_log::test(tokio::test)]
async fn test_collaborator_flow() {
    let memory = Arc::new(MemoryStore::new());
    let mut session = open(&memory).await;

    session.login("123", "test").unwrap();
    session.add_admin("456", "secret").await.unwrap();
    session.refresh_admins().await.unwrap();

    let admins = session.admins().unwrap();
    assert_eq!(admins.len(), 1);
    assert_eq!(admins[0].added_by, "123");

    session.logout();
    assert_eq!(session.access_state(), &SessionState::LoggedOut);

    assert_eq!(session.login("456", "secret").unwrap(), Tier::Collaborator);
    assert_eq!(session.admins().unwrap().len(), 1);

    let add = session.add_admin("789", "other").await;
    assert!(matches!(add, Err(CasetaError::Authorization(_))));
    let remove = session.remove_admin("456").await;
    assert!(matches!(remove, Err(CasetaError::Authorization(_))));
    assert!(memory.get(Collection::Admins, "456").unwrap().is_some());
}

#[test_log::test(tokio::test)]
async fn test_removed_admin_can_no_longer_log_in() {
    let memory = Arc::new(MemoryStore::new());
    let mut session = open(&memory).await;
    session.login("123", "test").unwrap();
    session.add_admin("456", "secret").await.unwrap();
    session.refresh_admins().await.unwrap();

    session.update_admin_password("456", "changed").await.unwrap();
    session.refresh_admins().await.unwrap();
    session.remove_admin("456").await.unwrap();
    session.refresh_admins().await.unwrap();

    session.logout();
    let result = session.login("456", "changed");
    assert!(matches!(result, Err(CasetaError::AuthFailure(_))));
}

#[test_log::test(tokio::test)]
async fn test_open_fails_without_identity() {
    let memory = Arc::new(MemoryStore::new());

    let result = ClubSession::open(Arc::clone(&memory), &TokenSignIn::new(" "), master()).await;
    assert!(matches!(result, Err(CasetaError::AuthFailure(_))));
}

#[test_log::test(tokio::test)]
async fn test_sessions_see_each_others_writes() {
    let memory = Arc::new(MemoryStore::new());
    let visitor = open(&memory).await;
    let mut moderator = open(&memory).await;

    visitor.request_reservation(block("2025-06-12"), &ana()).await.unwrap();

    let snapshot = moderator.refresh_reservations().await.unwrap();
    assert_eq!(
        snapshot.get(&block("2025-06-12")).unwrap().status,
        ReservationStatus::Pending
    );
}
