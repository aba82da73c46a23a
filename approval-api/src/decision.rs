use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DecisionRequest {
    pub decision: String,
    #[serde(default)]
    pub observacion: Option<String>,
}

#[instrument(skip(state, path, body), fields(record_id = path.0, role = %path.1))]
pub async fn decide(
    state: web::Data<AppState>,
    path: web::Path<(u64, String)>,
    body: web::Json<DecisionRequest>,
) -> Result<HttpResponse, ApiError> {
    let (id, role) = path.into_inner();
    let DecisionRequest {
        decision,
        observacion,
    } = body.into_inner();

    let outcome = state
        .engine
        .apply_decision(id, &role, &decision, observacion.as_deref())
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": outcome.message,
        "id": outcome.record.id().to_string(),
        "estado": outcome.record.estado(),
        "etapas_aprobadas": outcome.record.etapas_aprobadas(),
    })))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use core_data::models::{Submission, UploadedFile};
    use core_data::ports::mail::RecordingMailService;
    use serde_json::{json, Value};

    use crate::routes::configure;
    use crate::state::testing::in_memory;

    fn submission(company: &str) -> Submission {
        let fields = match json!({
            "company": company,
            "nombre_cargo": "Coordinador de calidad",
            "mision_cargo": "Asegurar la calidad de los productos",
            "area": "area@merkahorro.com",
            "director": "director@merkahorro.com",
            "gerencia": "gerencia@merkahorro.com",
            "calidad": "calidad@merkahorro.com",
            "seguridad": "sst@merkahorro.com"
        }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        Submission::new(
            fields,
            Some(UploadedFile::new("organigrama.pdf", "application/pdf", b"%PDF".to_vec())),
        )
    }

    async fn delivered(mail: &Arc<RecordingMailService>, expected: usize) {
        for _ in 0..50 {
            if mail.sent().len() >= expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    #[actix_web::test]
    async fn test_area_approval_over_http() {
        let ts = in_memory();
        let created = ts.state.submissions.create(submission("merkahorro")).await.unwrap();
        let id = created.record.id();
        let app = test::init_service(App::new().configure(configure(ts.state.clone()))).await;

        let req = test::TestRequest::post()
            .uri(&format!("/dgdecision/{}/area", id))
            .set_json(json!({"decision": "aprobar", "observacion": "Conforme"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["estado"], "pendiente por director");
        assert_eq!(body["etapas_aprobadas"], json!(["area"]));
        assert_eq!(body["id"], json!(id.to_string()));

        delivered(&ts.mail, 2).await;
        let sent = ts.mail.sent();
        assert_eq!(sent.last().map(|e| e.to.as_str()), Some("director@merkahorro.com"));

        let replay = test::TestRequest::post()
            .uri(&format!("/dgdecision/{}/area", id))
            .set_json(json!({"decision": "aprobar"}))
            .to_request();
        let resp = test::call_service(&app, replay).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_rejection_requires_observation() {
        let ts = in_memory();
        let created = ts.state.submissions.create(submission("merkahorro")).await.unwrap();
        let app = test::init_service(App::new().configure(configure(ts.state.clone()))).await;

        let req = test::TestRequest::post()
            .uri(&format!("/dgdecision/{}/area", created.record.id()))
            .set_json(json!({"decision": "rechazado"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["error"].as_str().unwrap().contains("observation"));
    }

    #[actix_web::test]
    async fn test_unknown_role_and_record() {
        let ts = in_memory();
        let created = ts.state.submissions.create(submission("construahorro")).await.unwrap();
        let app = test::init_service(App::new().configure(configure(ts.state.clone()))).await;

        let req = test::TestRequest::post()
            .uri(&format!("/dgdecision/{}/tesoreria", created.record.id()))
            .set_json(json!({"decision": "aprobar"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri(&format!("/dgdecision/{}/area", created.record.id()))
            .set_json(json!({"decision": "aprobar"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri("/dgdecision/404/director")
            .set_json(json!({"decision": "aprobar"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_malformed_body_is_a_json_400() {
        let ts = in_memory();
        let app = test::init_service(App::new().configure(configure(ts.state.clone()))).await;

        let req = test::TestRequest::post()
            .uri("/dgdecision/1/area")
            .set_json(json!({"observacion": "sin decisión"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["field"], "body");
    }
}
