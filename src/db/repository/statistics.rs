use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::condition::{count_active_conditions, severity_distribution};
use super::consultation::{count_consultations_by_author, recent_consultations};
use super::symptom::count_active_symptoms;
use crate::db::DatabaseError;
use crate::models::enums::Severity;
use crate::models::ConsultationSummary;

const RECENT_LIMIT: u32 = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeverityCount {
    pub severity: Severity,
    pub count: u64,
}

/// Dashboard figures for one clinician.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Statistics {
    pub total_conditions: u64,
    pub total_symptoms: u64,
    pub total_consultations: u64,
    pub recent_consultations: Vec<ConsultationSummary>,
    pub severity_distribution: Vec<SeverityCount>,
}

pub fn collect_statistics(conn: &Connection, author_id: &Uuid) -> Result<Statistics, DatabaseError> {
    Ok(Statistics {
        total_conditions: count_active_conditions(conn)?,
        total_symptoms: count_active_symptoms(conn)?,
        total_consultations: count_consultations_by_author(conn, author_id)?,
        recent_consultations: recent_consultations(conn, author_id, RECENT_LIMIT)?,
        severity_distribution: severity_distribution(conn)?
            .into_iter()
            .map(|(severity, count)| SeverityCount { severity, count })
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::seed::seed_catalog;
    use crate::db::sqlite::open_memory_database;

    #[test]
    fn empty_database_has_zero_counts() {
        let conn = open_memory_database().unwrap();
        let stats = collect_statistics(&conn, &Uuid::new_v4()).unwrap();
        assert_eq!(stats.total_conditions, 0);
        assert_eq!(stats.total_symptoms, 0);
        assert_eq!(stats.total_consultations, 0);
        assert!(stats.recent_consultations.is_empty());
        assert!(stats.severity_distribution.is_empty());
    }

    #[test]
    fn seeded_catalog_counts() {
        let conn = open_memory_database().unwrap();
        seed_catalog(&conn).unwrap();
        let stats = collect_statistics(&conn, &Uuid::new_v4()).unwrap();
        assert_eq!(stats.total_conditions, 10);
        assert_eq!(stats.total_symptoms, 15);
        let total: u64 = stats.severity_distribution.iter().map(|s| s.count).sum();
        assert_eq!(total, 10);
    }
}
