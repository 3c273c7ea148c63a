//! Prompt templates sent to the image model.
//!
//! Only the density label varies between simulation requests; everything
//! else is fixed text.

use super::types::ContentRequest;
use crate::imaging::DataUri;
use crate::reference::Density;

pub const VALIDATION_PROMPT: &str = "Analyze this image. Is it a human scalp, human hair, or a human head/face suitable for a hair transplant simulation? Answer ONLY with 'TRUE' if it is, or 'FALSE' if it is anything else (animals, landscapes, objects, etc).";

/// Shown to the user when the gate rejects their photo.
pub const REJECTION_MESSAGE: &str =
    "Please upload a clear photo of your scalp/head for simulation, not any other type of image.";

pub const REFERENCE_LABEL: &str = "[MASTER CLINICAL DENSITY REFERENCE - FOR DATA ONLY]";
pub const PATIENT_LABEL: &str = "[PRIMARY PATIENT PHOTO - USE THIS FOR ALL PIXELS AND IDENTITY]";

const INSTRUCTIONS_TEMPLATE: &str = "ROLE: MEDICAL HAIR VISUALIZATION SPECIALIST.
MISSION: HARMONIOUS SURGICAL RESTORATION.
1. BIOLOGICAL HARMONY (PRIORITY #1):
   - LIGHTING INTEGRATION: Analyze the light source, shadows, and highlights of the patient's photo. Apply the EXACT same lighting to the new hair so it melts into the donor hair perfectly.
   - NATURAL HANDSHAKE: Do not create a \"box\" or \"patch\". Taper the density at the mask edges to blend seamlessly with the patient's real hair.
   - DIRECTIONAL FLOW: Follow the patient's natural hair direction (forward at forehead, swirl at crown) with 100% precision.
2. DENSITY MAPPING (MASTER REFERENCE):
   - [MASTER CLINICAL REFERENCE]: Use this as your primary frequency standard for follicle count.
   - OPAQUE CORE, SOFT EDGES: The center of the mask should follow high frequency follicle counts, while the perimeter must be soft and tapered.
3. IDENTITY PRESERVATION:
   - [PATIENT PHOTO] is the exclusive source for DNA (Color + Texture + Wave).
   - IGNORE CURRENT THINNING: Restore the area as a successful, fully-grown result.
4. ANATOMY & FRONTOTEMPORAL DESIGN:
   - FRONTAL HAIRLINE: Create an irregular, organic, \"micro-jagged\" line. No straight lines.
   - TEMPORAL CLOSURE: Populate the frontotemporal corners densely.
FINAL OUTPUT: A realistic medical simulation. {density} DENSITY. PERFECT LIGHTING MATCH. INVISIBLE SEAMS.";

pub fn simulation_instructions(density: Density) -> String {
    INSTRUCTIONS_TEMPLATE.replace("{density}", density.label())
}

/// `[prompt, photo]`.
pub fn validation_request(photo: &DataUri) -> ContentRequest {
    ContentRequest::new()
        .with_text(VALIDATION_PROMPT)
        .with_image(photo.clone())
}

/// Reference first (when present), then the marked-up patient photo, then the
/// instructions.
pub fn simulation_request(
    reference: Option<&DataUri>,
    patient: &DataUri,
    density: Density,
) -> ContentRequest {
    let mut request = ContentRequest::new();
    if let Some(reference) = reference {
        request = request
            .with_text(REFERENCE_LABEL)
            .with_image(reference.clone());
    }
    request
        .with_text(PATIENT_LABEL)
        .with_image(patient.clone())
        .with_text(simulation_instructions(density))
}
