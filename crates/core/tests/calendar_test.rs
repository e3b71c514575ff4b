use caseta_core::calendar::{day_status, month_grid, select_day, DayStatus, MonthCursor};
use caseta_core::errors::CasetaError;
use caseta_core::models::block::BlockId;
use caseta_core::models::reservation::{
    NewReservation, Reservation, ReservationSnapshot, ReservationStatus,
};
use chrono::{Datelike, NaiveDate};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn snapshot(entries: &[(&str, ReservationStatus)]) -> ReservationSnapshot {
    entries
        .iter()
        .map(|(id, status)| {
            let block_id: BlockId = id.parse().unwrap();
            let mut reservation = Reservation::pending(
                block_id,
                NewReservation {
                    first_name: "Ana".to_string(),
                    last_name: "López".to_string(),
                    is_member: false,
                    member_number: None,
                },
            );
            reservation.status = *status;
            (block_id, reservation)
        })
        .collect()
}

#[rstest]
#[case(date(2025, 6, 5), DayStatus::Confirmed)]
#[case(date(2025, 6, 9), DayStatus::Confirmed)]
#[case(date(2025, 6, 10), DayStatus::Closed)]
#[case(date(2025, 6, 11), DayStatus::Closed)]
#[case(date(2025, 6, 12), DayStatus::Pending)]
#[case(date(2025, 6, 19), DayStatus::Free)]
fn test_day_status(#[case] day: NaiveDate, #[case] expected: DayStatus) {
    let snapshot = snapshot(&[
        ("2025-06-05", ReservationStatus::Confirmed),
        ("2025-06-12", ReservationStatus::Pending),
    ]);
    assert_eq!(day_status(day, &snapshot), expected);
}

#[test]
fn test_month_grid_layout() {
    // June 2025 starts on a Sunday
    let cursor = MonthCursor::new(2025, 6).unwrap();
    let grid = month_grid(cursor, &ReservationSnapshot::default());

    assert_eq!(grid.leading_blanks, 6);
    assert_eq!(grid.days.len(), 30);
    assert_eq!(grid.days[0].date, date(2025, 6, 1));
    assert_eq!(grid.days[0].block.id.to_string(), "2025-05-29");

    let closed = grid
        .days
        .iter()
        .filter(|day| day.status == DayStatus::Closed)
        .count();
    // Tuesdays and Wednesdays of June 2025
    assert_eq!(closed, 8);
}

#[test]
fn test_month_cursor_navigation() {
    let december = MonthCursor::new(2024, 12).unwrap();
    assert_eq!(december.next(), MonthCursor::new(2025, 1).unwrap());
    assert_eq!(december.next().previous(), december);
    assert_eq!(december.days_in_month(), 31);

    assert_eq!(MonthCursor::new(2024, 2).unwrap().days_in_month(), 29);
    assert_eq!(MonthCursor::containing(date(2025, 3, 17)).month(), 3);
}

#[test]
fn test_invalid_month_cursor() {
    assert!(matches!(MonthCursor::new(2025, 13), Err(CasetaError::Validation(_))));
    assert!(matches!(MonthCursor::new(2025, 0), Err(CasetaError::Validation(_))));
}

#[test]
fn test_month_cursor_stays_within_chrono_range() {
    let last = MonthCursor::containing(NaiveDate::MAX);
    assert_eq!(last.month(), 12);
    assert_eq!(last.days_in_month(), 31);
    assert_eq!(last.next(), last);
    assert_eq!(month_grid(last, &snapshot(&[])).days.len(), 31);

    let first = MonthCursor::containing(NaiveDate::MIN);
    assert_eq!(first.month(), 1);
    assert_eq!(first.previous(), first);
    assert_eq!(month_grid(first, &snapshot(&[])).days.len(), 31);

    assert!(matches!(
        MonthCursor::new(NaiveDate::MAX.year(), 1),
        Err(CasetaError::Validation(_))
    ));
}

#[test]
fn test_select_day() {
    let snapshot = snapshot(&[("2025-06-05", ReservationStatus::Pending)]);

    let reserved = select_day(date(2025, 6, 8), &snapshot).unwrap();
    assert_eq!(reserved.block.id.to_string(), "2025-06-05");
    assert!(!reserved.is_bookable());
    assert_eq!(
        reserved.reservation.map(|r| r.status),
        Some(ReservationStatus::Pending)
    );

    let free = select_day(date(2025, 6, 13), &snapshot).unwrap();
    assert_eq!(free.block.start, date(2025, 6, 12));
    assert!(free.is_bookable());

    assert!(select_day(date(2025, 6, 10), &snapshot).is_none());
}
