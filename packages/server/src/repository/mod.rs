//! Persistence boundaries consumed by the bill service.
//!
//! Each boundary is a trait so the service can be driven by the sea-orm
//! implementations in production and by in-memory fakes in tests.

pub mod bill;
pub mod user;

use sea_orm::DbErr;

pub use bill::{BillRepository, NewBill, SeaOrmBillRepository};
pub use user::{SeaOrmUserResolver, UserResolver};

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("database error: {0}")]
    Database(#[from] DbErr),
}
