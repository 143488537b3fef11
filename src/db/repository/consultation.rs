use std::collections::BTreeSet;
use std::str::FromStr;

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::symptom::{contains_pattern, parse_uuid};
use crate::db::DatabaseError;
use crate::models::enums::*;
use crate::models::*;

/// Persist a consultation with its reported symptoms and ranked results in one transaction.
pub fn insert_consultation(
    conn: &Connection,
    consultation: &Consultation,
) -> Result<Uuid, DatabaseError> {
    let narrative_json = serde_json::to_string(&consultation.narrative)?;
    let id = consultation.id.to_string();

    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "INSERT INTO consultations (id, patient_name, zone, image_ref, primary_diagnosis_id,
         notes, author_id, status, created_at, updated_at, narrative, urgency, narrative_source)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            id,
            consultation.patient_name,
            consultation.zone.as_str(),
            consultation.image_ref,
            consultation.primary_diagnosis.map(|c| c.to_string()),
            consultation.notes,
            consultation.author_id.to_string(),
            consultation.status.as_str(),
            consultation.created_at,
            consultation.updated_at,
            narrative_json,
            consultation.narrative.urgency.as_str(),
            consultation.narrative.source.as_str(),
        ],
    )?;

    for symptom_id in &consultation.reported_symptoms {
        tx.execute(
            "INSERT INTO consultation_symptoms (consultation_id, symptom_id) VALUES (?1, ?2)",
            params![id, symptom_id.to_string()],
        )?;
    }

    for (rank, result) in consultation.candidates.iter().enumerate() {
        let coincident = serde_json::to_string(result.coincident_symptoms())?;
        tx.execute(
            "INSERT INTO consultation_results (consultation_id, rank, condition_id, condition_name,
             severity, percentage, coincident_symptoms)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                id,
                rank as i64,
                result.condition_id().to_string(),
                result.condition_name(),
                result.severity().as_str(),
                result.percentage(),
                coincident,
            ],
        )?;
    }

    tx.commit()?;
    Ok(consultation.id)
}

/// Load a consultation the requester is allowed to see.
pub fn get_consultation(
    conn: &Connection,
    id: &Uuid,
    requester: &Requester,
) -> Result<Consultation, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, patient_name, zone, image_ref, primary_diagnosis_id, notes, author_id,
             status, created_at, updated_at, narrative
             FROM consultations WHERE id = ?1",
            params![id.to_string()],
            |row| {
                Ok(ConsultationRow {
                    id: row.get(0)?,
                    patient_name: row.get(1)?,
                    zone: row.get(2)?,
                    image_ref: row.get(3)?,
                    primary_diagnosis_id: row.get(4)?,
                    notes: row.get(5)?,
                    author_id: row.get(6)?,
                    status: row.get(7)?,
                    created_at: row.get(8)?,
                    updated_at: row.get(9)?,
                    narrative: row.get(10)?,
                })
            },
        )
        .optional()?
        .ok_or_else(|| not_found(id))?;

    let author_id = parse_uuid(&row.author_id)?;
    if !requester.can_access(&author_id) {
        return Err(forbidden(id));
    }

    Ok(Consultation {
        id: parse_uuid(&row.id)?,
        patient_name: row.patient_name,
        zone: BodyZone::from_str(&row.zone)?,
        reported_symptoms: reported_symptoms_for(conn, id)?,
        image_ref: row.image_ref,
        candidates: results_for(conn, id)?,
        primary_diagnosis: row
            .primary_diagnosis_id
            .as_deref()
            .map(parse_uuid)
            .transpose()?,
        narrative: serde_json::from_str(&row.narrative)?,
        notes: row.notes,
        author_id,
        status: ConsultationStatus::from_str(&row.status)?,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

/// One page of the author's consultations, newest first.
pub fn list_consultations(
    conn: &Connection,
    author_id: &Uuid,
    query: &ConsultationQuery,
) -> Result<Page<ConsultationSummary>, DatabaseError> {
    let search = contains_pattern(query.search.as_deref());

    let total: i64 = conn.query_row(
        "SELECT COUNT(*) FROM consultations
         WHERE author_id = ?1 AND (?2 IS NULL OR LOWER(patient_name) LIKE LOWER(?2) ESCAPE '\\')",
        params![author_id.to_string(), search],
        |row| row.get(0),
    )?;

    let items = query_summaries(
        conn,
        "WHERE c.author_id = ?1 AND (?2 IS NULL OR LOWER(c.patient_name) LIKE LOWER(?2) ESCAPE '\\')
         ORDER BY c.created_at DESC LIMIT ?3 OFFSET ?4",
        params![
            author_id.to_string(),
            search,
            i64::from(query.limit.max(1)),
            i64::from(query.offset()),
        ],
    )?;

    Ok(Page::new(items, query, total as u64))
}

/// The author's `limit` most recent consultations.
pub fn recent_consultations(
    conn: &Connection,
    author_id: &Uuid,
    limit: u32,
) -> Result<Vec<ConsultationSummary>, DatabaseError> {
    query_summaries(
        conn,
        "WHERE c.author_id = ?1 ORDER BY c.created_at DESC LIMIT ?2",
        params![author_id.to_string(), i64::from(limit)],
    )
}

pub fn count_consultations_by_author(
    conn: &Connection,
    author_id: &Uuid,
) -> Result<u64, DatabaseError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM consultations WHERE author_id = ?1",
        params![author_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(count as u64)
}

/// Delete a consultation. Only its author or an admin may do so.
pub fn delete_consultation(
    conn: &Connection,
    id: &Uuid,
    requester: &Requester,
) -> Result<(), DatabaseError> {
    let author: Option<String> = conn
        .query_row(
            "SELECT author_id FROM consultations WHERE id = ?1",
            params![id.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    let author = author.ok_or_else(|| not_found(id))?;
    if !requester.can_access(&parse_uuid(&author)?) {
        return Err(forbidden(id));
    }

    conn.execute("DELETE FROM consultations WHERE id = ?1", params![id.to_string()])?;
    Ok(())
}

struct ConsultationRow {
    id: String,
    patient_name: String,
    zone: String,
    image_ref: Option<String>,
    primary_diagnosis_id: Option<String>,
    notes: String,
    author_id: String,
    status: String,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
    narrative: String,
}

fn query_summaries(
    conn: &Connection,
    tail: &str,
    params: impl rusqlite::Params,
) -> Result<Vec<ConsultationSummary>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT c.id, c.patient_name, c.zone, r.condition_name, r.severity, c.urgency,
         c.status, c.created_at
         FROM consultations c
         LEFT JOIN consultation_results r ON r.consultation_id = c.id AND r.rank = 0
         {tail}"
    ))?;
    let rows = stmt.query_map(params, |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, Option<String>>(3)?,
            row.get::<_, Option<String>>(4)?,
            row.get::<_, String>(5)?,
            row.get::<_, String>(6)?,
            row.get::<_, NaiveDateTime>(7)?,
        ))
    })?;

    let mut summaries = Vec::new();
    for row in rows {
        let (id, patient_name, zone, diagnosis, severity, urgency, status, created_at) = row?;
        summaries.push(ConsultationSummary {
            id: parse_uuid(&id)?,
            patient_name,
            zone: BodyZone::from_str(&zone)?,
            primary_diagnosis_name: diagnosis,
            primary_diagnosis_severity: severity.as_deref().map(Severity::from_str).transpose()?,
            urgency: Urgency::from_str(&urgency)?,
            status: ConsultationStatus::from_str(&status)?,
            created_at,
        });
    }
    Ok(summaries)
}

fn reported_symptoms_for(conn: &Connection, id: &Uuid) -> Result<BTreeSet<Uuid>, DatabaseError> {
    let mut stmt =
        conn.prepare("SELECT symptom_id FROM consultation_symptoms WHERE consultation_id = ?1")?;
    let rows = stmt.query_map(params![id.to_string()], |row| row.get::<_, String>(0))?;
    let mut ids = BTreeSet::new();
    for row in rows {
        ids.insert(parse_uuid(&row?)?);
    }
    Ok(ids)
}

fn results_for(conn: &Connection, id: &Uuid) -> Result<Vec<MatchResult>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT condition_id, condition_name, severity, percentage, coincident_symptoms
         FROM consultation_results WHERE consultation_id = ?1 ORDER BY rank",
    )?;
    let rows = stmt.query_map(params![id.to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, u8>(3)?,
            row.get::<_, String>(4)?,
        ))
    })?;

    let mut results = Vec::new();
    for row in rows {
        let (condition_id, name, severity, percentage, coincident) = row?;
        results.push(MatchResult::new(
            parse_uuid(&condition_id)?,
            name,
            Severity::from_str(&severity)?,
            percentage,
            serde_json::from_str(&coincident)?,
        ));
    }
    Ok(results)
}

fn not_found(id: &Uuid) -> DatabaseError {
    DatabaseError::NotFound {
        entity_type: "Consultation".into(),
        id: id.to_string(),
    }
}

fn forbidden(id: &Uuid) -> DatabaseError {
    DatabaseError::Forbidden {
        entity_type: "Consultation".into(),
        id: id.to_string(),
    }
}
