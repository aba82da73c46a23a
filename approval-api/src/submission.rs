use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::instrument;

use crate::error::ApiError;
use crate::multipart::read_submission;
use crate::state::AppState;

#[instrument(skip(state, payload))]
pub async fn create_profile(state: web::Data<AppState>, payload: Multipart) -> Result<HttpResponse, ApiError> {
    let submission = read_submission(payload, state.max_upload_bytes).await?;
    let outcome = state.submissions.create(submission).await?;
    let record = outcome.record;

    Ok(HttpResponse::Created().json(json!({
        "message": format!(
            "Profile submitted; {} has been notified",
            outcome.notification.recipient
        ),
        "workflow_id": record.workflow_id(),
        "id": record.id().to_string(),
        "estado": record.estado(),
    })))
}

#[instrument(skip(state, id, payload), fields(record_id = *id))]
pub async fn resend_profile(
    state: web::Data<AppState>,
    id: web::Path<u64>,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let submission = read_submission(payload, state.max_upload_bytes).await?;
    let outcome = state.submissions.resubmit(id.into_inner(), submission).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Profile resubmitted; the approval chain starts again",
        "record": outcome.record,
    })))
}

pub async fn list_profiles(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let records = state.submissions.list().await?;
    Ok(HttpResponse::Ok().json(records))
}

pub async fn profile_history(
    state: web::Data<AppState>,
    workflow_id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let records = state.submissions.history(&workflow_id).await?;
    Ok(HttpResponse::Ok().json(records))
}
