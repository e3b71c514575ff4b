//! # Caseta Store
//!
//! Persistence side of the reservation calendar: the document store contract
//! and its implementations, the reservation and admin adapters built on it,
//! session identity, the per-client [session::ClubSession] and the expiry
//! [sweeper::Sweeper].

pub mod identity;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod repositories;
pub mod schema;
pub mod session;
pub mod store;
pub mod sweeper;

pub mod mock;

use eyre::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};

pub type DbPool = Pool<Postgres>;

pub async fn create_pool(database_url: &str) -> Result<DbPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(pool)
}
