//! # Caseta Core
//!
//! Domain logic of the caseta reservation calendar: how dates resolve to
//! Thursday–Monday rental blocks, the reservation and admin records, the
//! pending-reservation expiry rule, admin access control and the month-grid
//! model. Nothing in this crate performs I/O; persistence lives in
//! `caseta-db`.

pub mod access;
pub mod calendar;
pub mod config;
pub mod errors;
pub mod models;
