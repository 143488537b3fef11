use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{BodyZone, ConsultationStatus, Role, Severity, Urgency};
use super::narrative::Narrative;

/// One scored candidate. Built by the scorer; the percentage always comes
/// from the coincident set it travels with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    condition_id: Uuid,
    condition_name: String,
    severity: Severity,
    percentage: u8,
    coincident_symptoms: BTreeSet<Uuid>,
}

impl MatchResult {
    pub(crate) fn new(
        condition_id: Uuid,
        condition_name: String,
        severity: Severity,
        percentage: u8,
        coincident_symptoms: BTreeSet<Uuid>,
    ) -> Self {
        Self {
            condition_id,
            condition_name,
            severity,
            percentage,
            coincident_symptoms,
        }
    }

    pub fn condition_id(&self) -> Uuid {
        self.condition_id
    }

    pub fn condition_name(&self) -> &str {
        &self.condition_name
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Match percentage, 0..=100.
    pub fn percentage(&self) -> u8 {
        self.percentage
    }

    pub fn coincident_symptoms(&self) -> &BTreeSet<Uuid> {
        &self.coincident_symptoms
    }
}

/// A persisted diagnostic consultation. Created once, never mutated, may be deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Consultation {
    pub id: Uuid,
    pub patient_name: String,
    pub zone: BodyZone,
    pub reported_symptoms: BTreeSet<Uuid>,
    pub image_ref: Option<String>,
    /// Ranked, best first, at most `config::MAX_CANDIDATES`.
    pub candidates: Vec<MatchResult>,
    pub primary_diagnosis: Option<Uuid>,
    pub narrative: Narrative,
    pub notes: String,
    pub author_id: Uuid,
    pub status: ConsultationStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Consultation {
    pub fn primary_candidate(&self) -> Option<&MatchResult> {
        self.candidates.first()
    }
}

/// List row for consultation history views.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsultationSummary {
    pub id: Uuid,
    pub patient_name: String,
    pub zone: BodyZone,
    pub primary_diagnosis_name: Option<String>,
    pub primary_diagnosis_severity: Option<Severity>,
    pub urgency: Urgency,
    pub status: ConsultationStatus,
    pub created_at: NaiveDateTime,
}

/// Who is asking; used for ownership checks on reads and deletes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requester {
    pub user_id: Uuid,
    pub role: Role,
}

impl Requester {
    pub fn clinician(user_id: Uuid) -> Self {
        Self {
            user_id,
            role: Role::Clinician,
        }
    }

    pub fn can_access(&self, author_id: &Uuid) -> bool {
        self.role == Role::Admin || self.user_id == *author_id
    }
}
