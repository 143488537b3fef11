use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::BodyZone;
use crate::models::*;

const SYMPTOM_COLUMNS: &str = "id, name, zone, description, active";

pub fn insert_symptom(conn: &Connection, symptom: &Symptom) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO symptoms (id, name, zone, description, active)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            symptom.id.to_string(),
            symptom.name.trim(),
            symptom.zone.map(|z| z.as_str()),
            symptom.description,
            symptom.active as i32,
        ],
    )?;
    Ok(())
}

pub fn get_symptom(conn: &Connection, id: &Uuid) -> Result<Option<Symptom>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {SYMPTOM_COLUMNS} FROM symptoms WHERE id = ?1"),
            params![id.to_string()],
            read_symptom_row,
        )
        .optional()?;
    row.map(symptom_from_row).transpose()
}

/// Active symptoms, alphabetical. A zone filter keeps symptoms tagged with
/// that zone, with `all`, or untagged.
pub fn list_active_symptoms(
    conn: &Connection,
    zone: Option<BodyZone>,
) -> Result<Vec<Symptom>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SYMPTOM_COLUMNS} FROM symptoms
         WHERE active = 1
           AND (?1 IS NULL OR zone IS NULL OR zone = 'all' OR zone = ?1)
         ORDER BY name COLLATE NOCASE"
    ))?;
    let rows = stmt.query_map(params![zone.map(|z| z.as_str())], read_symptom_row)?;

    let mut symptoms = Vec::new();
    for row in rows {
        symptoms.push(symptom_from_row(row?)?);
    }
    Ok(symptoms)
}

/// Display names for the given ids. Unknown ids are simply absent.
pub fn resolve_symptom_names(
    conn: &Connection,
    ids: &BTreeSet<Uuid>,
) -> Result<HashMap<Uuid, String>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT name FROM symptoms WHERE id = ?1")?;
    let mut names = HashMap::with_capacity(ids.len());
    for id in ids {
        let name: Option<String> = stmt
            .query_row(params![id.to_string()], |row| row.get(0))
            .optional()?;
        if let Some(name) = name {
            names.insert(*id, name);
        }
    }
    Ok(names)
}

pub fn deactivate_symptom(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE symptoms SET active = 0 WHERE id = ?1",
        params![id.to_string()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Symptom".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

pub fn count_active_symptoms(conn: &Connection) -> Result<u64, DatabaseError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM symptoms WHERE active = 1",
        [],
        |row| row.get(0),
    )?;
    Ok(count as u64)
}

type SymptomRow = (String, String, Option<String>, Option<String>, i32);

fn read_symptom_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<SymptomRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
    ))
}

fn symptom_from_row(row: SymptomRow) -> Result<Symptom, DatabaseError> {
    let (id, name, zone, description, active) = row;
    Ok(Symptom {
        id: parse_uuid(&id)?,
        name,
        zone: zone.as_deref().map(BodyZone::from_str).transpose()?,
        description,
        active: active != 0,
    })
}

pub(crate) fn parse_uuid(raw: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(raw).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))
}

/// `%term%` for a `LIKE ... ESCAPE '\'` clause; `None` for blank input.
pub(crate) fn contains_pattern(search: Option<&str>) -> Option<String> {
    let term = search.map(str::trim).filter(|s| !s.is_empty())?;
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    Some(pattern)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    #[test]
    fn contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern(Some(" acne ")).as_deref(), Some("%acne%"));
        assert_eq!(contains_pattern(Some("50%_off")).as_deref(), Some(r"%50\%\_off%"));
        assert_eq!(contains_pattern(Some(r"a\b")).as_deref(), Some(r"%a\\b%"));
        assert_eq!(contains_pattern(Some("   ")), None);
        assert_eq!(contains_pattern(None), None);
    }

    fn symptom(name: &str, zone: Option<BodyZone>) -> Symptom {
        Symptom {
            id: Uuid::new_v4(),
            name: name.into(),
            zone,
            description: None,
            active: true,
        }
    }

    #[test]
    fn insert_and_get_symptom() {
        let conn = open_memory_database().unwrap();
        let s = symptom("Itching", Some(BodyZone::All));
        insert_symptom(&conn, &s).unwrap();

        let loaded = get_symptom(&conn, &s.id).unwrap().unwrap();
        assert_eq!(loaded.name, "Itching");
        assert_eq!(loaded.zone, Some(BodyZone::All));
        assert!(loaded.active);
    }

    #[test]
    fn get_missing_symptom_is_none() {
        let conn = open_memory_database().unwrap();
        assert!(get_symptom(&conn, &Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn duplicate_name_rejected() {
        let conn = open_memory_database().unwrap();
        insert_symptom(&conn, &symptom("Redness", None)).unwrap();
        assert!(insert_symptom(&conn, &symptom("Redness", None)).is_err());
    }

    #[test]
    fn zone_filter_keeps_generic_symptoms() {
        let conn = open_memory_database().unwrap();
        insert_symptom(&conn, &symptom("Blackheads", Some(BodyZone::Face))).unwrap();
        insert_symptom(&conn, &symptom("Cracks", Some(BodyZone::Feet))).unwrap();
        insert_symptom(&conn, &symptom("Redness", Some(BodyZone::All))).unwrap();
        insert_symptom(&conn, &symptom("Pain", None)).unwrap();

        let face: Vec<String> = list_active_symptoms(&conn, Some(BodyZone::Face))
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(face, vec!["Blackheads", "Pain", "Redness"]);

        let all = list_active_symptoms(&conn, None).unwrap();
        assert_eq!(all.len(), 4);
    }

    #[test]
    fn resolve_names_skips_unknown_ids() {
        let conn = open_memory_database().unwrap();
        let itching = symptom("Itching", None);
        insert_symptom(&conn, &itching).unwrap();

        let unknown = Uuid::new_v4();
        let ids: BTreeSet<Uuid> = [itching.id, unknown].into_iter().collect();
        let names = resolve_symptom_names(&conn, &ids).unwrap();
        assert_eq!(names.len(), 1);
        assert_eq!(names[&itching.id], "Itching");
    }

    #[test]
    fn deactivated_symptoms_leave_active_listing() {
        let conn = open_memory_database().unwrap();
        let s = symptom("Scabs", None);
        insert_symptom(&conn, &s).unwrap();
        assert_eq!(count_active_symptoms(&conn).unwrap(), 1);

        deactivate_symptom(&conn, &s.id).unwrap();
        assert_eq!(count_active_symptoms(&conn).unwrap(), 0);
        assert!(list_active_symptoms(&conn, None).unwrap().is_empty());
    }

    #[test]
    fn deactivate_missing_symptom_is_not_found() {
        let conn = open_memory_database().unwrap();
        let err = deactivate_symptom(&conn, &Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }
}
