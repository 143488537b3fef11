use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::symptom::{contains_pattern, parse_uuid};
use crate::db::DatabaseError;
use crate::models::enums::{BodyZone, Severity};
use crate::models::*;

const CONDITION_COLUMNS: &str =
    "id, name, description, severity, zone, treatment, image_ref, active";

/// Insert a condition together with its symptom links, atomically.
pub fn insert_condition(conn: &Connection, condition: &Condition) -> Result<(), DatabaseError> {
    let tx = conn.unchecked_transaction()?;
    insert_condition_rows(&tx, condition)?;
    tx.commit()?;
    Ok(())
}

/// Row inserts only; the caller owns the transaction.
pub(crate) fn insert_condition_rows(
    conn: &Connection,
    condition: &Condition,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO conditions (id, name, description, severity, zone, treatment, image_ref, active)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            condition.id.to_string(),
            condition.name.trim(),
            condition.description,
            condition.severity.as_str(),
            condition.zone.as_str(),
            condition.treatment,
            condition.image_ref,
            condition.active as i32,
        ],
    )?;
    for symptom_id in &condition.symptom_ids {
        conn.execute(
            "INSERT INTO condition_symptoms (condition_id, symptom_id) VALUES (?1, ?2)",
            params![condition.id.to_string(), symptom_id.to_string()],
        )?;
    }
    Ok(())
}

pub fn get_condition(conn: &Connection, id: &Uuid) -> Result<Option<Condition>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {CONDITION_COLUMNS} FROM conditions WHERE id = ?1"),
            params![id.to_string()],
            read_condition_row,
        )
        .optional()?;
    let Some(row) = row else {
        return Ok(None);
    };
    let mut condition = condition_from_row(row)?;
    condition.symptom_ids = symptom_ids_for(conn, &condition.id)?;
    Ok(Some(condition))
}

/// Every active condition with its symptom set, ordered by name.
pub fn list_active_conditions(conn: &Connection) -> Result<Vec<Condition>, DatabaseError> {
    list_conditions(conn, &ConditionFilter::default())
}

/// Active conditions matching the filter, ordered by name.
pub fn list_conditions(
    conn: &Connection,
    filter: &ConditionFilter,
) -> Result<Vec<Condition>, DatabaseError> {
    let search = contains_pattern(filter.search.as_deref());

    let mut stmt = conn.prepare(&format!(
        "SELECT {CONDITION_COLUMNS} FROM conditions
         WHERE active = 1
           AND (?1 IS NULL OR LOWER(name) LIKE LOWER(?1) ESCAPE '\\' OR LOWER(description) LIKE LOWER(?1) ESCAPE '\\')
           AND (?2 IS NULL OR zone = ?2)
           AND (?3 IS NULL OR severity = ?3)
         ORDER BY name COLLATE NOCASE"
    ))?;
    let rows = stmt.query_map(
        params![
            search,
            filter.zone.map(|z| z.as_str()),
            filter.severity.map(|s| s.as_str()),
        ],
        read_condition_row,
    )?;

    let mut conditions = Vec::new();
    for row in rows {
        conditions.push(condition_from_row(row?)?);
    }

    let mut links = symptom_links(conn)?;
    for condition in &mut conditions {
        condition.symptom_ids = links.remove(&condition.id).unwrap_or_default();
    }
    Ok(conditions)
}

pub fn deactivate_condition(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE conditions SET active = 0 WHERE id = ?1",
        params![id.to_string()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Condition".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

pub fn count_active_conditions(conn: &Connection) -> Result<u64, DatabaseError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM conditions WHERE active = 1",
        [],
        |row| row.get(0),
    )?;
    Ok(count as u64)
}

/// Number of active conditions per severity, in severity order.
pub fn severity_distribution(conn: &Connection) -> Result<Vec<(Severity, u64)>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT severity, COUNT(*) FROM conditions WHERE active = 1 GROUP BY severity",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
    })?;

    let mut counts: HashMap<Severity, u64> = HashMap::new();
    for row in rows {
        let (severity, count) = row?;
        counts.insert(Severity::from_str(&severity)?, count as u64);
    }
    Ok(Severity::all()
        .iter()
        .filter_map(|s| counts.get(s).map(|c| (*s, *c)))
        .collect())
}

fn symptom_ids_for(conn: &Connection, condition_id: &Uuid) -> Result<BTreeSet<Uuid>, DatabaseError> {
    let mut stmt =
        conn.prepare("SELECT symptom_id FROM condition_symptoms WHERE condition_id = ?1")?;
    let rows = stmt.query_map(params![condition_id.to_string()], |row| row.get::<_, String>(0))?;
    let mut ids = BTreeSet::new();
    for row in rows {
        ids.insert(parse_uuid(&row?)?);
    }
    Ok(ids)
}

fn symptom_links(conn: &Connection) -> Result<HashMap<Uuid, BTreeSet<Uuid>>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT condition_id, symptom_id FROM condition_symptoms")?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;
    let mut links: HashMap<Uuid, BTreeSet<Uuid>> = HashMap::new();
    for row in rows {
        let (condition_id, symptom_id) = row?;
        links
            .entry(parse_uuid(&condition_id)?)
            .or_default()
            .insert(parse_uuid(&symptom_id)?);
    }
    Ok(links)
}

type ConditionRow = (
    String, String, String, String, String,
    Option<String>, Option<String>, i32,
);

fn read_condition_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ConditionRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
    ))
}

fn condition_from_row(row: ConditionRow) -> Result<Condition, DatabaseError> {
    let (id, name, description, severity, zone, treatment, image_ref, active) = row;
    Ok(Condition {
        id: parse_uuid(&id)?,
        name,
        description,
        severity: Severity::from_str(&severity)?,
        zone: BodyZone::from_str(&zone)?,
        symptom_ids: BTreeSet::new(),
        treatment,
        image_ref,
        active: active != 0,
    })
}
