//! Active Directory attack impact scenario generator.
//!
//! Turns an [`ImpactProfile`] into one schema-constrained generation request
//! and validates the reply into an [`ImpactScenario`]. The result is all or
//! nothing: a reply missing any category or field is rejected whole.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::gateway::{GatewayError, GenerationRequest, TextGenerator};

pub mod profile;

pub use profile::{BranchCountBucket, ImpactProfile, PlatformType, UserCountBucket};

/// User-facing message shown for any generation failure.
pub const SCENARIO_ERROR_MESSAGE: &str =
    "No se pudo generar el escenario. Por favor, inténtalo de nuevo más tarde.";

/// Wire keys of the three impact categories, in display order.
pub const CATEGORY_KEYS: [&str; 3] = ["operativo", "financiero", "reputacional"];

/// Wire keys every category must carry.
pub const FIELD_KEYS: [&str; 4] = ["titulo", "metrica", "descripcion", "severidad"];

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from scenario generation.
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    /// The gateway call failed.
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    /// The generated text is not JSON.
    #[error("scenario response is not valid JSON: {0}")]
    MalformedResponse(String),
    /// The JSON is missing a category or field.
    #[error("scenario response failed validation: {0}")]
    Validation(String),
}

// ---------------------------------------------------------------------------
// Scenario model
// ---------------------------------------------------------------------------

/// Severity classification of one impact card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Severity {
    /// "Crítica".
    Critical,
    /// "Alta".
    High,
    /// "Media".
    Medium,
    /// Anything else, kept verbatim.
    Other(String),
}

impl Severity {
    /// Classify a severity label, case-insensitively.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "crítica" | "critica" => Self::Critical,
            "alta" => Self::High,
            "media" => Self::Medium,
            _ => Self::Other(label.to_owned()),
        }
    }

    /// Label as shown to users.
    pub fn label(&self) -> &str {
        match self {
            Self::Critical => "Crítica",
            Self::High => "Alta",
            Self::Medium => "Media",
            Self::Other(label) => label,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Severity {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(Self::from_label(&label))
    }
}

/// One impact category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpactCard {
    /// Short headline.
    #[serde(rename = "titulo")]
    pub title: String,
    /// Quantified impact.
    #[serde(rename = "metrica")]
    pub metric: String,
    /// One-line explanation.
    #[serde(rename = "descripcion")]
    pub description: String,
    /// Severity level.
    #[serde(rename = "severidad")]
    pub severity: Severity,
}

/// The three-category impact summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpactScenario {
    /// Operational impact.
    #[serde(rename = "operativo")]
    pub operational: ImpactCard,
    /// Financial impact.
    #[serde(rename = "financiero")]
    pub financial: ImpactCard,
    /// Reputational impact.
    #[serde(rename = "reputacional")]
    pub reputational: ImpactCard,
}

impl ImpactScenario {
    /// Cards in display order with their category label.
    pub fn cards(&self) -> [(&'static str, &ImpactCard); 3] {
        [
            ("Operativo", &self.operational),
            ("Financiero", &self.financial),
            ("Reputacional", &self.reputational),
        ]
    }
}

// ---------------------------------------------------------------------------
// Request building
// ---------------------------------------------------------------------------

/// Build the scenario prompt for a profile.
pub fn build_prompt(profile: &ImpactProfile) -> String {
    format!(
        "Actúa como un consultor de ciberseguridad experto en Active Directory. Analiza la siguiente descripción de empresa: \"{description}\".
Genera una respuesta JSON estructurada que resuma el impacto de negocio de un ataque exitoso a su Directorio Activo.
El JSON debe tener tres claves principales: \"operativo\", \"financiero\", y \"reputacional\".
Cada clave debe ser un objeto con los siguientes campos:
- \"titulo\": Un título corto y llamativo (ej. \"Parálisis Operativa\").
- \"metrica\": Una métrica de impacto cuantificable y alarmante (ej. \"48-72 horas de inactividad\", \">$1M en costos\", \"Pérdida del 20% de clientes\").
- \"descripcion\": Una explicación concisa (máximo 20 palabras).
- \"severidad\": Clasifica la severidad como \"Crítica\", \"Alta\", o \"Media\".
La respuesta debe ser únicamente el objeto JSON.",
        description = profile.describe(),
    )
}

/// Response schema attached to the request.
pub fn response_schema() -> Value {
    let card_properties: serde_json::Map<String, Value> = FIELD_KEYS
        .iter()
        .map(|key| ((*key).to_owned(), json!({ "type": "STRING" })))
        .collect();
    let card = json!({
        "type": "OBJECT",
        "properties": card_properties,
        "required": FIELD_KEYS,
    });
    let properties: serde_json::Map<String, Value> = CATEGORY_KEYS
        .iter()
        .map(|key| ((*key).to_owned(), card.clone()))
        .collect();
    json!({
        "type": "OBJECT",
        "properties": properties,
        "required": CATEGORY_KEYS,
    })
}

/// Full generation request for a profile.
pub fn build_request(profile: &ImpactProfile) -> GenerationRequest {
    GenerationRequest::json(build_prompt(profile), response_schema())
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse and validate generated scenario JSON.
///
/// # Errors
///
/// Returns `ScenarioError::MalformedResponse` for invalid JSON and
/// `ScenarioError::Validation` naming the first missing or non-string path.
pub fn parse_scenario(text: &str) -> Result<ImpactScenario, ScenarioError> {
    let value: Value = serde_json::from_str(text.trim())
        .map_err(|e| ScenarioError::MalformedResponse(e.to_string()))?;
    validate_shape(&value)?;
    serde_json::from_value(value).map_err(|e| ScenarioError::Validation(e.to_string()))
}

fn validate_shape(value: &Value) -> Result<(), ScenarioError> {
    let root = value
        .as_object()
        .ok_or_else(|| ScenarioError::Validation("root is not an object".to_owned()))?;
    for category in CATEGORY_KEYS {
        let card = root
            .get(category)
            .ok_or_else(|| ScenarioError::Validation(format!("missing {category}")))?
            .as_object()
            .ok_or_else(|| ScenarioError::Validation(format!("{category} is not an object")))?;
        for field in FIELD_KEYS {
            match card.get(field) {
                Some(Value::String(_)) => {}
                Some(_) => {
                    return Err(ScenarioError::Validation(format!(
                        "{category}.{field} is not a string"
                    )))
                }
                None => {
                    return Err(ScenarioError::Validation(format!(
                        "missing {category}.{field}"
                    )))
                }
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Generator
// ---------------------------------------------------------------------------

/// Holds the latest scenario result for one generator surface.
pub struct ScenarioGenerator {
    generator: Arc<dyn TextGenerator>,
    scenario: Option<ImpactScenario>,
    error: Option<String>,
    loading: bool,
}

impl ScenarioGenerator {
    /// Create an empty generator.
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            scenario: None,
            error: None,
            loading: false,
        }
    }

    /// Latest successful scenario.
    pub fn scenario(&self) -> Option<&ImpactScenario> {
        self.scenario.as_ref()
    }

    /// User-facing error from the latest attempt.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Whether a request is outstanding; the trigger must be disabled while true.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Start an attempt: clears the previous result. Returns the request to
    /// send, or `None` while another attempt is loading.
    pub fn begin(&mut self, profile: &ImpactProfile) -> Option<GenerationRequest> {
        if self.loading {
            return None;
        }
        self.loading = true;
        self.scenario = None;
        self.error = None;
        info!(profile = %profile.describe(), "generating impact scenario");
        Some(build_request(profile))
    }

    /// Finish an attempt with the gateway outcome.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`ScenarioError`]; the user-facing message is
    /// also stored and available through [`Self::error`].
    pub fn finish(
        &mut self,
        outcome: Result<String, GatewayError>,
    ) -> Result<&ImpactScenario, ScenarioError> {
        self.loading = false;
        let parsed = outcome
            .map_err(ScenarioError::from)
            .and_then(|text| parse_scenario(&text));
        match parsed {
            Ok(scenario) => Ok(&*self.scenario.insert(scenario)),
            Err(err) => {
                warn!(error = %err, "impact scenario generation failed");
                self.error = Some(SCENARIO_ERROR_MESSAGE.to_owned());
                Err(err)
            }
        }
    }

    /// Run one full attempt.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError`] on gateway, JSON, or validation failure.
    /// Re-invocation while loading is ignored and returns the current state.
    pub async fn generate(
        &mut self,
        profile: &ImpactProfile,
    ) -> Result<Option<&ImpactScenario>, ScenarioError> {
        let Some(request) = self.begin(profile) else {
            return Ok(self.scenario.as_ref());
        };
        let generator = Arc::clone(&self.generator);
        let outcome = generator.generate(request).await;
        self.finish(outcome).map(Some)
    }
}
