use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::BodyZone;

/// An atomic reportable skin observation from the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Symptom {
    pub id: Uuid,
    pub name: String,
    pub zone: Option<BodyZone>,
    pub description: Option<String>,
    pub active: bool,
}
