use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{BodyZone, Severity};

/// A dermatological condition with its symptom profile.
///
/// A condition whose `symptom_ids` is empty is never matchable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Condition {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub severity: Severity,
    pub zone: BodyZone,
    pub symptom_ids: BTreeSet<Uuid>,
    pub treatment: Option<String>,
    pub image_ref: Option<String>,
    pub active: bool,
}

impl Condition {
    pub fn is_matchable(&self) -> bool {
        self.active && !self.symptom_ids.is_empty()
    }
}
