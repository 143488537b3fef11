//! Repository layer — entity-scoped database operations.
//!
//! Free functions take a `&Connection`; `SqliteStore` owns one and implements
//! the collaborator traits the consultation assembler consumes.

mod condition;
mod consultation;
pub mod seed;
mod statistics;
mod symptom;

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use rusqlite::Connection;
use uuid::Uuid;

use super::sqlite::{open_database, open_memory_database};
use super::DatabaseError;
use crate::models::{Condition, Consultation};

pub use condition::*;
pub use consultation::*;
pub use seed::seed_catalog;
pub use statistics::*;
pub use symptom::*;

/// Supplies the universe of active conditions with their symptom sets.
pub trait ConditionRepository {
    fn list_active(&self) -> Result<Vec<Condition>, DatabaseError>;
}

/// Resolves symptom ids to display names.
pub trait SymptomCatalog {
    fn resolve_names(&self, ids: &BTreeSet<Uuid>) -> Result<HashMap<Uuid, String>, DatabaseError>;
}

/// Writes finished consultations.
pub trait ConsultationStore {
    fn insert_consultation(&self, consultation: &Consultation) -> Result<Uuid, DatabaseError>;
}

/// SQLite-backed implementation of every collaborator.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        Ok(Self {
            conn: open_database(path)?,
        })
    }

    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        Ok(Self {
            conn: open_memory_database()?,
        })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl ConditionRepository for SqliteStore {
    fn list_active(&self) -> Result<Vec<Condition>, DatabaseError> {
        list_active_conditions(&self.conn)
    }
}

impl SymptomCatalog for SqliteStore {
    fn resolve_names(&self, ids: &BTreeSet<Uuid>) -> Result<HashMap<Uuid, String>, DatabaseError> {
        resolve_symptom_names(&self.conn, ids)
    }
}

impl ConsultationStore for SqliteStore {
    fn insert_consultation(&self, record: &Consultation) -> Result<Uuid, DatabaseError> {
        consultation::insert_consultation(&self.conn, record)
    }
}
