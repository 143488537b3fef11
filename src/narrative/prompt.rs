use super::types::NarrativeRequest;
use crate::models::enums::Severity;

/// Build the symptom-analysis prompt. Deterministic for a given request.
pub fn build_narrative_prompt(request: &NarrativeRequest) -> String {
    let zone = request.zone;
    let symptoms = request.symptom_names.join(", ");
    let image_note = if request.image.is_some() {
        "A photograph of the affected area is attached. Use it only to refine the explanation.\n"
    } else {
        ""
    };

    format!(
        r#"You are a medical assistant specialised in dermatology.

Analyse the following dermatological findings:
- Affected zone: {zone}
- Reported symptoms: {symptoms}
{image_note}
Provide a professional analysis with:
1. A short summary of the most likely condition
2. A clear explanation of what these symptoms could indicate (2-3 sentences)
3. Three to four specific care recommendations
4. An urgency level: low, medium or high
5. A warning that a medical consultation is required

Respond ONLY with a valid JSON object in exactly this format:
{{
  "diagnosis": "Most likely condition",
  "explanation": "Medical explanation of the symptoms",
  "recommendations": ["Recommendation 1", "Recommendation 2", "Recommendation 3"],
  "urgency": "low",
  "disclaimer": "This information is for reference only. Consult a professional dermatologist for an accurate diagnosis and treatment."
}}"#
    )
}

/// Prompt for a short catalog description of a condition.
pub fn build_description_prompt(condition_name: &str, symptom_names: &[String]) -> String {
    let symptoms = symptom_names.join(", ");
    format!(
        r#"Write a brief medical description (2-3 paragraphs) of the dermatological condition "{condition_name}".

Associated symptoms: {symptoms}

The description must:
- Be clear and professional
- Include common causes
- Mention the affected population
- Stay under 300 words"#
    )
}

/// Prompt for a general treatment plan.
pub fn build_treatment_prompt(condition_name: &str, severity: Severity) -> String {
    format!(
        r#"Suggest a general treatment plan for:

Condition: {condition_name}
Severity: {severity}

Include:
1. Immediate care measures (2-3 points)
2. Common topical treatments
3. When to seek urgent medical attention
4. Prevention

Answer as a clear, concise list."#
    )
}
