pub mod assembler;
pub mod notes;

pub use assembler::*;
pub use notes::*;

use thiserror::Error;

use crate::db::DatabaseError;

#[derive(Error, Debug)]
pub enum ConsultationError {
    /// Rejected input. Nothing was scored, called or written.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Persistence error: {0}")]
    Persistence(#[from] DatabaseError),
}
