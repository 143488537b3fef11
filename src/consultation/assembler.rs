use std::collections::BTreeSet;
use std::str::FromStr;

use uuid::Uuid;

use super::notes::compose_notes;
use super::ConsultationError;
use crate::config::MAX_IMAGE_BYTES;
use crate::db::repository::{ConditionRepository, ConsultationStore, SymptomCatalog};
use crate::diagnosis::match_conditions;
use crate::diagnosis::ranking::primary_diagnosis;
use crate::models::enums::{BodyZone, ConsultationStatus};
use crate::models::{Condition, Consultation, ImageUpload, MatchResult, Narrative};
use crate::narrative::{local_narrative, FallbackReason, NarrativeProvider, NarrativeRequest};

/// Caller input for one diagnostic consultation.
#[derive(Debug, Clone, Default)]
pub struct ConsultationRequest {
    pub patient_name: String,
    pub zone: String,
    pub symptoms: Vec<Uuid>,
    pub image: Option<ImageUpload>,
    pub notes: Option<String>,
}

/// Input that passed validation.
struct ValidatedRequest {
    patient_name: String,
    zone: BodyZone,
    /// Request order, duplicates removed.
    symptom_order: Vec<Uuid>,
    reported: BTreeSet<Uuid>,
}

fn validate(request: &ConsultationRequest) -> Result<ValidatedRequest, ConsultationError> {
    let patient_name = request.patient_name.trim();
    if patient_name.is_empty() {
        return Err(ConsultationError::Validation("Patient name is required".into()));
    }

    let zone = request.zone.trim();
    if zone.is_empty() {
        return Err(ConsultationError::Validation("Body zone is required".into()));
    }
    let zone = BodyZone::from_str(&zone.to_lowercase())
        .map_err(|_| ConsultationError::Validation(format!("Unknown body zone: {zone}")))?;

    if request.symptoms.is_empty() {
        return Err(ConsultationError::Validation(
            "At least one symptom is required".into(),
        ));
    }

    if let Some(image) = &request.image {
        if image.data.is_empty() {
            return Err(ConsultationError::Validation("Image is empty".into()));
        }
        if image.data.len() > MAX_IMAGE_BYTES {
            return Err(ConsultationError::Validation(format!(
                "Image exceeds {} MiB limit",
                MAX_IMAGE_BYTES / (1024 * 1024)
            )));
        }
        if !image.is_image() {
            return Err(ConsultationError::Validation(format!(
                "Unsupported image type: {}",
                image.mime_type
            )));
        }
    }

    let mut reported = BTreeSet::new();
    let symptom_order: Vec<Uuid> = request
        .symptoms
        .iter()
        .copied()
        .filter(|id| reported.insert(*id))
        .collect();

    Ok(ValidatedRequest {
        patient_name: patient_name.to_string(),
        zone,
        symptom_order,
        reported,
    })
}

/// Builds and persists consultations: validate, score, narrate, store.
pub struct ConsultationAssembler<'a> {
    conditions: &'a dyn ConditionRepository,
    symptoms: &'a dyn SymptomCatalog,
    store: &'a dyn ConsultationStore,
    narrator: &'a NarrativeProvider,
}

impl<'a> ConsultationAssembler<'a> {
    pub fn new(
        conditions: &'a dyn ConditionRepository,
        symptoms: &'a dyn SymptomCatalog,
        store: &'a dyn ConsultationStore,
        narrator: &'a NarrativeProvider,
    ) -> Self {
        Self {
            conditions,
            symptoms,
            store,
            narrator,
        }
    }

    /// Create one consultation. Only validation and persistence failures
    /// reach the caller; narrative problems degrade to the local narrative.
    pub fn assemble(
        &self,
        request: ConsultationRequest,
        author_id: Uuid,
    ) -> Result<Consultation, ConsultationError> {
        let validated = validate(&request)?;
        let _span = tracing::info_span!(
            "assemble_consultation",
            zone = %validated.zone,
            symptoms = validated.reported.len(),
            has_image = request.image.is_some()
        )
        .entered();

        let conditions = self.conditions.list_active()?;
        let names = self.symptoms.resolve_names(&validated.reported)?;

        let mut symptom_names = Vec::with_capacity(validated.symptom_order.len());
        for id in &validated.symptom_order {
            match names.get(id) {
                Some(name) => symptom_names.push(name.clone()),
                None => tracing::warn!(symptom_id = %id, "Unknown symptom id, omitted from narrative"),
            }
        }

        let image_ref = request.image.as_ref().and_then(|i| i.reference.clone());
        let narrative_request = NarrativeRequest {
            symptom_names,
            zone: validated.zone,
            image: request.image,
        };

        let (candidates, narrative) =
            score_and_narrate(self.narrator, &narrative_request, &validated.reported, &conditions);

        let now = chrono::Local::now().naive_local();
        let consultation = Consultation {
            id: Uuid::new_v4(),
            patient_name: validated.patient_name,
            zone: validated.zone,
            reported_symptoms: validated.reported,
            image_ref,
            primary_diagnosis: primary_diagnosis(&candidates),
            notes: compose_notes(request.notes.as_deref(), &narrative),
            candidates,
            narrative,
            author_id,
            status: ConsultationStatus::Completed,
            created_at: now,
            updated_at: now,
        };

        self.store.insert_consultation(&consultation)?;

        tracing::info!(
            consultation_id = %consultation.id,
            candidates = consultation.candidates.len(),
            urgency = %consultation.narrative.urgency,
            narrative_source = %consultation.narrative.source,
            "Consultation created"
        );
        Ok(consultation)
    }
}

/// Run the narrative call on a worker thread while scoring on this one.
fn score_and_narrate(
    narrator: &NarrativeProvider,
    narrative_request: &NarrativeRequest,
    reported: &BTreeSet<Uuid>,
    conditions: &[Condition],
) -> (Vec<MatchResult>, Narrative) {
    std::thread::scope(|s| {
        let worker = s.spawn(move || narrator.generate(narrative_request));
        let candidates = match_conditions(reported, conditions);
        let narrative = worker.join().unwrap_or_else(|_| {
            tracing::error!("Narrative worker panicked, using local narrative");
            local_narrative(narrative_request, FallbackReason::ServiceFailed)
        });
        (candidates, narrative)
    })
}
