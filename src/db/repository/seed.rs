//! Reference catalog: 15 skin symptoms and 10 common conditions.
//!
//! Ids are UUIDv5 over the English name so every seeded database shares them.

use rusqlite::Connection;
use uuid::Uuid;

use super::condition::insert_condition_rows;
use super::symptom::insert_symptom;
use crate::db::DatabaseError;
use crate::models::enums::{BodyZone, Severity};
use crate::models::{Condition, Symptom};

const SYMPTOMS: &[(&str, &str, BodyZone)] = &[
    ("Redness", "Red, inflamed skin", BodyZone::All),
    ("Itching", "Intense itching sensation", BodyZone::All),
    ("Scaling", "Dry skin that flakes off", BodyZone::All),
    ("Burning", "Burning sensation on the skin", BodyZone::All),
    ("Blisters", "Small fluid-filled bubbles", BodyZone::All),
    ("Pustules", "Raised lesions containing pus", BodyZone::All),
    ("Patches", "Areas of different colouring", BodyZone::All),
    ("Pain", "Discomfort or pain on touch", BodyZone::All),
    ("Swelling", "Swelling of the affected area", BodyZone::All),
    ("Dryness", "Lack of skin hydration", BodyZone::All),
    ("Excess oil", "Excessive sebum production", BodyZone::Face),
    ("Blackheads", "Open comedones", BodyZone::Face),
    ("Whiteheads", "Closed comedones", BodyZone::Face),
    ("Scabs", "Build-up of dead skin cells", BodyZone::All),
    ("Cracks", "Fissures in the skin", BodyZone::All),
];

struct SeedCondition {
    name: &'static str,
    description: &'static str,
    severity: Severity,
    zone: BodyZone,
    symptoms: &'static [usize],
    treatment: &'static str,
}

const CONDITIONS: &[SeedCondition] = &[
    SeedCondition {
        name: "Acne",
        description: "Inflammatory skin condition causing pimples and spots",
        severity: Severity::Moderate,
        zone: BodyZone::Face,
        symptoms: &[0, 1, 5, 10, 11, 12],
        treatment: "Facial cleansing, benzoyl peroxide, topical retinoids, antibiotics if needed",
    },
    SeedCondition {
        name: "Atopic dermatitis (Eczema)",
        description: "Chronic skin inflammation marked by itching and redness",
        severity: Severity::Moderate,
        zone: BodyZone::All,
        symptoms: &[0, 1, 2, 9, 8],
        treatment: "Constant hydration, corticosteroid creams, avoid irritants, antihistamines",
    },
    SeedCondition {
        name: "Psoriasis",
        description: "Autoimmune disease causing red, scaly patches",
        severity: Severity::Severe,
        zone: BodyZone::All,
        symptoms: &[0, 2, 1, 6, 8],
        treatment: "Corticosteroid creams, phototherapy, systemic medication, biologic therapy",
    },
    SeedCondition {
        name: "Rosacea",
        description: "Chronic condition causing persistent facial redness",
        severity: Severity::Mild,
        zone: BodyZone::Face,
        symptoms: &[0, 3, 8, 5],
        treatment: "Avoid triggers, topical or oral antibiotics, vascular laser",
    },
    SeedCondition {
        name: "Contact dermatitis",
        description: "Allergic reaction to contact with irritating substances",
        severity: Severity::Mild,
        zone: BodyZone::All,
        symptoms: &[0, 1, 3, 4, 8],
        treatment: "Identify and avoid the allergen, topical corticosteroids, antihistamines",
    },
    SeedCondition {
        name: "Seborrheic dermatitis",
        description: "Inflammation causing scaly, reddened skin, common on the scalp",
        severity: Severity::Mild,
        zone: BodyZone::Scalp,
        symptoms: &[2, 0, 1, 10, 13],
        treatment: "Anti-dandruff shampoo, topical antifungals, mild corticosteroids",
    },
    SeedCondition {
        name: "Urticaria",
        description: "Raised welts on the skin causing intense itching",
        severity: Severity::Mild,
        zone: BodyZone::All,
        symptoms: &[1, 0, 8, 6],
        treatment: "Antihistamines, identify and avoid triggers, corticosteroids if severe",
    },
    SeedCondition {
        name: "Herpes simplex",
        description: "Viral infection causing painful blisters",
        severity: Severity::Moderate,
        zone: BodyZone::Face,
        symptoms: &[4, 7, 0, 3, 13],
        treatment: "Oral or topical antivirals, analgesics, keep the area clean",
    },
    SeedCondition {
        name: "Tinea",
        description: "Fungal infection causing circular reddish patches",
        severity: Severity::Mild,
        zone: BodyZone::All,
        symptoms: &[0, 1, 2, 6],
        treatment: "Topical or oral antifungals, keep the area dry and clean",
    },
    SeedCondition {
        name: "Xerosis (Dry skin)",
        description: "Extreme dryness of the skin",
        severity: Severity::Mild,
        zone: BodyZone::All,
        symptoms: &[9, 2, 1, 14],
        treatment: "Frequent hydration, emollient moisturisers, avoid long hot baths",
    },
];

/// Stable id for a seeded symptom name.
pub fn seeded_symptom_id(name: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, format!("symptom:{name}").as_bytes())
}

/// Stable id for a seeded condition name.
pub fn seeded_condition_id(name: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, format!("condition:{name}").as_bytes())
}

/// Populate the catalog when it is empty. Returns `false` if data already existed.
pub fn seed_catalog(conn: &Connection) -> Result<bool, DatabaseError> {
    let existing: i64 = conn.query_row(
        "SELECT (SELECT COUNT(*) FROM symptoms) + (SELECT COUNT(*) FROM conditions)",
        [],
        |row| row.get(0),
    )?;
    if existing > 0 {
        tracing::debug!("Catalog already populated, skipping seed");
        return Ok(false);
    }

    let tx = conn.unchecked_transaction()?;

    let symptom_ids: Vec<Uuid> = SYMPTOMS.iter().map(|(name, _, _)| seeded_symptom_id(name)).collect();
    for ((name, description, zone), id) in SYMPTOMS.iter().zip(&symptom_ids) {
        insert_symptom(
            &tx,
            &Symptom {
                id: *id,
                name: (*name).to_string(),
                zone: Some(*zone),
                description: Some((*description).to_string()),
                active: true,
            },
        )?;
    }

    for seed in CONDITIONS {
        insert_condition_rows(
            &tx,
            &Condition {
                id: seeded_condition_id(seed.name),
                name: seed.name.to_string(),
                description: seed.description.to_string(),
                severity: seed.severity,
                zone: seed.zone,
                symptom_ids: seed.symptoms.iter().map(|i| symptom_ids[*i]).collect(),
                treatment: Some(seed.treatment.to_string()),
                image_ref: None,
                active: true,
            },
        )?;
    }

    tx.commit()?;
    tracing::info!(
        symptoms = SYMPTOMS.len(),
        conditions = CONDITIONS.len(),
        "Seeded reference catalog"
    );
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::condition::get_condition;
    use crate::db::sqlite::open_memory_database;

    #[test]
    fn seed_populates_once() {
        let conn = open_memory_database().unwrap();
        assert!(seed_catalog(&conn).unwrap());
        assert!(!seed_catalog(&conn).unwrap());
    }

    #[test]
    fn seeded_ids_are_stable() {
        let conn = open_memory_database().unwrap();
        seed_catalog(&conn).unwrap();
        let acne = get_condition(&conn, &seeded_condition_id("Acne")).unwrap().unwrap();
        assert_eq!(acne.symptom_ids.len(), 6);
        assert!(acne.symptom_ids.contains(&seeded_symptom_id("Blackheads")));
        assert_eq!(acne.zone, BodyZone::Face);
    }

    #[test]
    fn every_seed_condition_has_symptoms() {
        for seed in CONDITIONS {
            assert!(!seed.symptoms.is_empty(), "{} has no symptoms", seed.name);
            assert!(seed.symptoms.iter().all(|i| *i < SYMPTOMS.len()));
        }
    }
}
