use actix_multipart::Multipart;
use core_data::models::{Submission, UploadedFile, WorkflowError};
use futures_util::TryStreamExt;
use serde_json::{Map, Value};
use tracing::debug;

pub const DOCUMENT_FIELD: &str = "documento";

/// Collects a multipart form into a [`Submission`]. Text fields holding JSON
/// arrays or objects are decoded; repeated names are gathered into arrays.
pub async fn read_submission(mut payload: Multipart, max_file_bytes: usize) -> Result<Submission, WorkflowError> {
    let mut fields = Map::new();
    let mut documento = None;

    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| WorkflowError::validation("form", e.to_string()))?
    {
        let disposition = field.content_disposition().clone();
        let name = disposition.get_name().unwrap_or_default().to_string();
        let filename = disposition.get_filename().map(str::to_string);
        let content_type = field
            .content_type()
            .map(|mime| mime.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let mut bytes = Vec::new();
        while let Some(chunk) = field
            .try_next()
            .await
            .map_err(|e| WorkflowError::validation(name.clone(), e.to_string()))?
        {
            if bytes.len() + chunk.len() > max_file_bytes {
                return Err(WorkflowError::validation(
                    name,
                    format!("exceeds the {} byte limit", max_file_bytes),
                ));
            }
            bytes.extend_from_slice(&chunk);
        }

        if name == DOCUMENT_FIELD {
            // Browsers send an empty part when no file was picked.
            match filename {
                Some(filename) if !bytes.is_empty() => {
                    debug!(filename = %filename, size = bytes.len(), "Received structural chart");
                    documento = Some(UploadedFile::new(filename, content_type, bytes));
                }
                _ => debug!("Empty document part ignored"),
            }
            continue;
        }

        if name.is_empty() {
            continue;
        }

        let text = String::from_utf8(bytes)
            .map_err(|_| WorkflowError::validation(name.clone(), "is not valid UTF-8"))?;
        insert_field(&mut fields, name, parse_text(&text));
    }

    Ok(Submission::new(fields, documento))
}

fn parse_text(text: &str) -> Value {
    let trimmed = text.trim();
    if trimmed.starts_with('[') || trimmed.starts_with('{') {
        if let Ok(value) = serde_json::from_str(trimmed) {
            return value;
        }
    }
    Value::String(text.to_string())
}

fn insert_field(fields: &mut Map<String, Value>, name: String, value: Value) {
    let is_list = name.ends_with("[]");
    let name = name.trim_end_matches("[]").to_string();
    match fields.get_mut(&name) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None if is_list && !value.is_array() => {
            fields.insert(name, Value::Array(vec![value]));
        }
        None => {
            fields.insert(name, value);
        }
    }
}
