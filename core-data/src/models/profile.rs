use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// The job-profile form itself. The workflow never inspects it beyond the
/// title and the vehicle/licence pair; everything else travels untouched.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct JobProfile {
    pub nombre_cargo: String,

    pub mision_cargo: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area_general: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub departamento: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proceso: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cargo_jefe_inmediato: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cargos_que_reportan: Option<String>,

    /// Kept as text; JSON booleans are accepted and stored as "true"/"false".
    #[serde(
        default,
        deserialize_with = "flag_as_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub requiere_vehiculo: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tipo_licencia: Option<String>,

    #[serde(default)]
    pub responsabilidades: Vec<Value>,

    #[serde(default)]
    pub competencias: Vec<Value>,

    #[serde(default)]
    pub indicadores: Vec<Value>,

    #[serde(default)]
    pub riesgos: Vec<Value>,

    #[serde(default)]
    pub plan_entrenamiento: Vec<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl JobProfile {
    pub fn requires_vehicle(&self) -> bool {
        self.requiere_vehiculo
            .as_deref()
            .map(is_affirmative)
            .unwrap_or(false)
    }
}

fn flag_as_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Text(String),
        Bool(bool),
    }

    Ok(Option::<Flag>::deserialize(deserializer)?.map(|flag| match flag {
        Flag::Text(text) => text,
        Flag::Bool(value) => value.to_string(),
    }))
}

pub(crate) fn is_affirmative(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "si" | "sí" | "s" | "true" | "yes" | "1"
    )
}

/// A file received with a submission, before it reaches the blob store.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(filename: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Raw submission as received from the form: loosely typed fields plus the
/// optional structural-chart file.
#[derive(Debug, Clone, Default)]
pub struct Submission {
    pub fields: Map<String, Value>,
    pub documento: Option<UploadedFile>,
}

impl Submission {
    pub fn new(fields: Map<String, Value>, documento: Option<UploadedFile>) -> Self {
        Self { fields, documento }
    }
}
