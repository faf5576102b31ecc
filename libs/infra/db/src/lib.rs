// [libs/infra/db/src/lib.rs]
//! sqlx/Postgres adapter: connection pool, migrations, and the repository
//! implementations backing the ports declared in `billing-domain-models`.

pub mod client;
pub mod errors;
pub mod mapping;
pub mod repositories;

pub use client::{connect, run_migrations};
pub use errors::DbError;
pub use repositories::*;
