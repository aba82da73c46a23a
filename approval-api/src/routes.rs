use actix_web::{web, HttpResponse};
use core_data::models::WorkflowError;
use serde_json::json;

use crate::decision::decide;
use crate::error::ApiError;
use crate::state::AppState;
use crate::submission::{create_profile, list_profiles, profile_history, resend_profile};

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

/// Registers every endpoint against `state`.
pub fn configure(state: AppState) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg: &mut web::ServiceConfig| {
        let json_config = web::JsonConfig::default().error_handler(|err, _req| {
            ApiError(WorkflowError::validation("body", err.to_string())).into()
        });

        cfg.app_data(web::Data::new(state))
            .app_data(json_config)
            .route("/health", web::get().to(health))
            .route("/yuli", web::post().to(create_profile))
            .route("/yuli", web::get().to(list_profiles))
            .route("/yuli/resend/{id}", web::post().to(resend_profile))
            .route("/yuli/{workflow_id}", web::get().to(profile_history))
            .route("/dgdecision/{id}/{role}", web::post().to(decide));
    }
}
