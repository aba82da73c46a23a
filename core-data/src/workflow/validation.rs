use datalogic_rs::JsonLogic;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, instrument};

use crate::models::company::Company;
use crate::models::errors::WorkflowError;
use crate::models::profile::{is_affirmative, JobProfile};
use crate::models::record::Approvers;
use crate::models::role::Role;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    #[default]
    Text,
    Email,
}

/// A required field. `condition` is a JsonLogic expression evaluated
/// against the submitted fields; a null condition always applies.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ValidationRule {
    pub field: String,
    #[serde(default)]
    pub condition: Value,
    #[serde(default)]
    pub kind: FieldKind,
    pub description: Option<String>,
}

impl ValidationRule {
    fn required(field: &str, kind: FieldKind, description: &str) -> Self {
        Self {
            field: field.to_string(),
            condition: Value::Null,
            kind,
            description: Some(description.to_string()),
        }
    }

    fn when(mut self, condition: Value) -> Self {
        self.condition = condition;
        self
    }
}

/// Required fields of the job-profile form.
pub fn default_rules() -> Vec<ValidationRule> {
    vec![
        ValidationRule::required("nombre_cargo", FieldKind::Text, "Job title"),
        ValidationRule::required("mision_cargo", FieldKind::Text, "Mission of the position"),
        ValidationRule::required("area", FieldKind::Email, "Area approver")
            .when(json!({"!=": [{"var": "company"}, "construahorro"]})),
        ValidationRule::required("director", FieldKind::Email, "Director approver"),
        ValidationRule::required("gerencia", FieldKind::Email, "Management approver"),
        ValidationRule::required("calidad", FieldKind::Email, "Quality approver"),
        ValidationRule::required("seguridad", FieldKind::Email, "Safety approver"),
        ValidationRule::required("tipo_licencia", FieldKind::Text, "Driving licence type")
            .when(json!({"==": [{"var": "requiere_vehiculo"}, true]})),
    ]
}

/// Submission fields once they passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedForm {
    pub company: Company,
    pub approvers: Approvers,
    pub perfil: JobProfile,
}

#[derive(Debug, Clone)]
pub struct Validator {
    rules: Vec<ValidationRule>,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(default_rules())
    }
}

impl Validator {
    pub fn new(rules: Vec<ValidationRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[ValidationRule] {
        &self.rules
    }

    /// Checks the fields in rule order and stops at the first failure.
    #[instrument(skip(self, fields), fields(field_count = fields.len()))]
    pub fn validate(&self, fields: &Map<String, Value>) -> Result<ValidatedForm, WorkflowError> {
        let company: Company = match fields.get("company").and_then(Value::as_str) {
            Some(raw) if !raw.trim().is_empty() => raw.parse()?,
            _ => return Err(WorkflowError::validation("company", "is required")),
        };

        let context = Self::evaluation_context(fields, company);
        let logic = JsonLogic::new();

        for rule in &self.rules {
            if !rule.condition.is_null() {
                let applies = logic
                    .apply(&rule.condition, &context)
                    .map(|v| v.as_bool().unwrap_or(false))
                    .map_err(|e| {
                        WorkflowError::validation(
                            rule.field.clone(),
                            format!("rule condition could not be evaluated: {:?}", e),
                        )
                    })?;
                if !applies {
                    debug!(field = %rule.field, "Rule condition not met, skipping");
                    continue;
                }
            }

            let value = fields.get(&rule.field);
            if is_blank(value) {
                return Err(WorkflowError::validation(rule.field.clone(), "is required"));
            }
            if rule.kind == FieldKind::Email {
                let valid = value
                    .and_then(Value::as_str)
                    .map(looks_like_email)
                    .unwrap_or(false);
                if !valid {
                    return Err(WorkflowError::validation(
                        rule.field.clone(),
                        "must be a valid email address",
                    ));
                }
            }
        }

        let mut approver_fields = Map::new();
        let mut profile_fields = Map::new();
        for (key, value) in fields {
            if key == "company" {
                continue;
            }
            if Role::ALL.iter().any(|role| role.as_str() == key) {
                approver_fields.insert(key.clone(), value.clone());
            } else {
                profile_fields.insert(key.clone(), value.clone());
            }
        }

        let approvers: Approvers = typed(approver_fields)?;
        let perfil: JobProfile = typed(profile_fields)?;

        Ok(ValidatedForm {
            company,
            approvers,
            perfil,
        })
    }

    fn evaluation_context(fields: &Map<String, Value>, company: Company) -> Value {
        let mut context = fields.clone();
        context.insert("company".to_string(), json!(company.as_str()));
        let requires_vehicle = match fields.get("requiere_vehiculo") {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => is_affirmative(s),
            _ => false,
        };
        context.insert("requiere_vehiculo".to_string(), json!(requires_vehicle));
        Value::Object(context)
    }
}

fn typed<T: serde::de::DeserializeOwned>(fields: Map<String, Value>) -> Result<T, WorkflowError> {
    serde_path_to_error::deserialize(Value::Object(fields)).map_err(|err| {
        let path = err.path().to_string();
        let field = if path == "." { "form".to_string() } else { path };
        WorkflowError::validation(field, err.into_inner().to_string())
    })
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        _ => false,
    }
}

fn looks_like_email(value: &str) -> bool {
    let value = value.trim();
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !value.contains(char::is_whitespace)
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(company: &str) -> Map<String, Value> {
        let value = json!({
            "company": company,
            "nombre_cargo": "Auxiliar de bodega",
            "mision_cargo": "Recibir y despachar mercancía",
            "area": "area@merkahorro.com",
            "director": "director@merkahorro.com",
            "gerencia": "gerencia@merkahorro.com",
            "calidad": "calidad@merkahorro.com",
            "seguridad": "sst@merkahorro.com",
            "responsabilidades": ["Cargar camiones"]
        });
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_valid_form_is_split_into_approvers_and_profile() {
        let validated = Validator::default().validate(&form("Merkahorro")).unwrap();
        assert_eq!(validated.company, Company::Merkahorro);
        assert_eq!(validated.approvers.get(Role::Seguridad), Some("sst@merkahorro.com"));
        assert_eq!(validated.perfil.nombre_cargo, "Auxiliar de bodega");
        assert!(validated.perfil.extra.get("director").is_none());
    }

    #[test]
    fn test_first_missing_field_is_reported() {
        let mut fields = form("merkahorro");
        fields.remove("mision_cargo");
        fields.remove("gerencia");
        let err = Validator::default().validate(&fields).unwrap_err();
        assert!(matches!(err, WorkflowError::Validation { ref field, .. } if field == "mision_cargo"));
    }

    #[test]
    fn test_area_not_required_for_construahorro() {
        let mut fields = form("construahorro");
        fields.remove("area");
        assert!(Validator::default().validate(&fields).is_ok());

        let mut fields = form("megamayoristas");
        fields.remove("area");
        let err = Validator::default().validate(&fields).unwrap_err();
        assert!(matches!(err, WorkflowError::Validation { ref field, .. } if field == "area"));
    }

    #[test]
    fn test_vehicle_requires_licence_type() {
        let mut fields = form("merkahorro");
        fields.insert("requiere_vehiculo".into(), json!("si"));
        let err = Validator::default().validate(&fields).unwrap_err();
        assert!(matches!(err, WorkflowError::Validation { ref field, .. } if field == "tipo_licencia"));

        fields.insert("tipo_licencia".into(), json!("C2"));
        assert!(Validator::default().validate(&fields).is_ok());

        fields.insert("requiere_vehiculo".into(), json!("no"));
        fields.remove("tipo_licencia");
        assert!(Validator::default().validate(&fields).is_ok());
    }

    #[test]
    fn test_boolean_vehicle_flag_is_typed() {
        let mut fields = form("merkahorro");
        fields.insert("requiere_vehiculo".into(), json!(true));
        let err = Validator::default().validate(&fields).unwrap_err();
        assert!(matches!(err, WorkflowError::Validation { ref field, .. } if field == "tipo_licencia"));

        fields.insert("tipo_licencia".into(), json!("B1"));
        let validated = Validator::default().validate(&fields).unwrap();
        assert!(validated.perfil.requires_vehicle());

        fields.insert("requiere_vehiculo".into(), json!(false));
        fields.remove("tipo_licencia");
        let validated = Validator::default().validate(&fields).unwrap();
        assert!(!validated.perfil.requires_vehicle());
    }

    #[test]
    fn test_approver_must_be_an_email() {
        let mut fields = form("merkahorro");
        fields.insert("calidad".into(), json!("Laura Gómez"));
        let err = Validator::default().validate(&fields).unwrap_err();
        assert!(matches!(err, WorkflowError::Validation { ref field, .. } if field == "calidad"));
    }

    #[test]
    fn test_unknown_company_is_rejected() {
        let err = Validator::default().validate(&form("superahorro")).unwrap_err();
        assert!(matches!(err, WorkflowError::Validation { ref field, .. } if field == "company"));
    }

    #[test]
    fn test_mistyped_profile_field_names_the_path() {
        let mut fields = form("merkahorro");
        fields.insert("responsabilidades".into(), json!("no es una lista"));
        let err = Validator::default().validate(&fields).unwrap_err();
        assert!(matches!(err, WorkflowError::Validation { ref field, .. } if field == "responsabilidades"));
    }
}
