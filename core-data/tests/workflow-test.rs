use std::sync::Arc;
use std::time::Duration;

use core_data::models::*;
use core_data::ports::*;
use core_data::workflow::*;
use serde_json::{json, Map, Value};

struct Harness {
    store: Arc<InMemoryRecordStore>,
    mail: Arc<RecordingMailService>,
    events: BroadcastPublisher,
    submissions: SubmissionHandler,
    engine: WorkflowEngine,
}

fn harness_with_mail(mail: RecordingMailService) -> Harness {
    let store = Arc::new(InMemoryRecordStore::new());
    let mail = Arc::new(mail);
    let events = BroadcastPublisher::new(32);
    let notifier = Notifier::new(mail.clone(), Duration::from_secs(2));
    let submissions = SubmissionHandler::new(
        store.clone(),
        Arc::new(InMemoryBlobStore::new()),
        notifier.clone(),
        Arc::new(events.clone()),
        IdGenerator::new(1).unwrap(),
        Validator::default(),
    );
    let engine = WorkflowEngine::new(store.clone(), notifier, Arc::new(events.clone()));
    Harness {
        store,
        mail,
        events,
        submissions,
        engine,
    }
}

fn harness() -> Harness {
    harness_with_mail(RecordingMailService::new())
}

fn fields(company: &str) -> Map<String, Value> {
    match json!({
        "company": company,
        "nombre_cargo": "Jefe de tienda",
        "mision_cargo": "Dirigir la operación de la tienda",
        "area": "area@merkahorro.com",
        "director": "director@merkahorro.com",
        "gerencia": "gerencia@merkahorro.com",
        "calidad": "calidad@merkahorro.com",
        "seguridad": "sst@merkahorro.com"
    }) {
        Value::Object(map) => map,
        _ => unreachable!(),
    }
}

fn chart() -> UploadedFile {
    UploadedFile::new("organigrama.pdf", "application/pdf", b"%PDF-1.4".to_vec())
}

async fn submit(h: &Harness, company: &str) -> WorkflowRecord {
    let outcome = h
        .submissions
        .create(Submission::new(fields(company), Some(chart())))
        .await
        .unwrap();
    outcome.notification.wait().await.unwrap();
    outcome.record
}

async fn advance_to(h: &Harness, record: &WorkflowRecord, target: Role) {
    for role in record.company().roles() {
        if *role == target {
            break;
        }
        let outcome = h
            .engine
            .apply_decision(record.id(), role.as_str(), "aprobar", None)
            .await
            .unwrap();
        outcome.notification.wait().await.unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_area_approval_notifies_director() {
        let h = harness();
        let record = submit(&h, "merkahorro").await;
        assert_eq!(record.estado(), &WorkflowState::Pending(Role::Area));

        let outcome = h
            .engine
            .apply_decision(record.id(), "area", "aprobar", Some("Todo en orden"))
            .await
            .unwrap();
        outcome.notification.wait().await.unwrap();

        let stored = h.store.get(record.id()).await.unwrap();
        assert_eq!(stored.estado().to_string(), "pendiente por director");
        assert_eq!(stored.etapas_aprobadas(), &[Role::Area]);
        assert_eq!(stored.observations().get(Role::Area), Some("Todo en orden"));

        let sent = h.mail.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].to, "area@merkahorro.com");
        assert_eq!(sent[1].to, "director@merkahorro.com");
    }

    #[tokio::test]
    async fn test_replayed_decision_is_stale() {
        let h = harness();
        let record = submit(&h, "merkahorro").await;

        let first = h
            .engine
            .apply_decision(record.id(), "area", "aprobar", None)
            .await
            .unwrap();
        first.notification.wait().await.unwrap();
        let emails_before = h.mail.sent().len();

        let err = h
            .engine
            .apply_decision(record.id(), "area", "aprobar", None)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::StaleOrInvalidState { .. }));
        assert_eq!(err.status_code(), 400);

        let stored = h.store.get(record.id()).await.unwrap();
        assert_eq!(stored.estado(), &WorkflowState::Pending(Role::Director));
        assert_eq!(stored.etapas_aprobadas(), &[Role::Area]);
        assert_eq!(h.mail.sent().len(), emails_before);
    }

    #[tokio::test]
    async fn test_concurrent_decisions_apply_once() {
        let h = harness();
        let record = submit(&h, "megamayoristas").await;

        let (a, b) = tokio::join!(
            h.engine.apply_decision(record.id(), "area", "aprobado", None),
            h.engine.apply_decision(record.id(), "area", "aprobado", None),
        );
        let successes = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
        assert_eq!(successes, 1);

        let stored = h.store.get(record.id()).await.unwrap();
        assert_eq!(stored.etapas_aprobadas(), &[Role::Area]);
    }

    #[tokio::test]
    async fn test_construahorro_starts_at_director() {
        let h = harness();
        let mut form = fields("construahorro");
        form.remove("area");
        let outcome = h
            .submissions
            .create(Submission::new(form, Some(chart())))
            .await
            .unwrap();
        assert_eq!(outcome.record.estado().to_string(), "pendiente por director");
        assert!(outcome.record.etapas_aprobadas().is_empty());
        assert_eq!(outcome.notification.recipient, "director@merkahorro.com");

        let err = h
            .engine
            .apply_decision(outcome.record.id(), "area", "aprobar", None)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::RoleNotApplicable { .. }));
    }

    #[tokio::test]
    async fn test_safety_rejection_notifies_creator() {
        let h = harness();
        let record = submit(&h, "merkahorro").await;
        advance_to(&h, &record, Role::Seguridad).await;

        let mut events = h.events.subscribe();
        let outcome = h
            .engine
            .apply_decision(record.id(), "seguridad", "rechazar", Some("no cumple"))
            .await
            .unwrap();
        outcome.notification.wait().await.unwrap();

        let stored = outcome.record;
        assert_eq!(stored.estado().to_string(), "rechazado por seguridad (sst@merkahorro.com)");
        assert_eq!(
            stored.etapas_aprobadas(),
            &[Role::Area, Role::Director, Role::Gerencia, Role::Calidad]
        );
        assert_eq!(stored.observations().get(Role::Seguridad), Some("no cumple"));

        let last = h.mail.sent().pop().unwrap();
        assert_eq!(last.to, "area@merkahorro.com");
        assert!(last.html.contains("no cumple"));

        let event = events.recv().await.unwrap();
        assert_eq!(event.kind, EventKind::Rejected);
        assert_eq!(event.role, Some(Role::Seguridad));
    }

    #[tokio::test]
    async fn test_rejection_without_comment_is_refused() {
        let h = harness();
        let record = submit(&h, "merkahorro").await;
        let err = h
            .engine
            .apply_decision(record.id(), "area", "rechazado", Some(""))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::MissingRejectionComment));
        let stored = h.store.get(record.id()).await.unwrap();
        assert_eq!(stored.estado(), &WorkflowState::Pending(Role::Area));
    }

    #[tokio::test]
    async fn test_final_approval_notifies_creator() {
        let h = harness();
        let record = submit(&h, "merkahorro").await;
        advance_to(&h, &record, Role::Seguridad).await;

        let outcome = h
            .engine
            .apply_decision(record.id(), "seguridad", "aprobar", None)
            .await
            .unwrap();
        assert_eq!(outcome.notification.recipient, "area@merkahorro.com");
        outcome.notification.wait().await.unwrap();

        assert_eq!(outcome.record.estado(), &WorkflowState::ApprovedByAll);
        assert_eq!(outcome.record.etapas_aprobadas().len(), 5);
        let last = h.mail.sent().pop().unwrap();
        assert_eq!(last.to, "area@merkahorro.com");
        assert!(last.subject.starts_with("Perfil aprobado"));

        let err = h
            .engine
            .apply_decision(record.id(), "seguridad", "aprobar", None)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::StaleOrInvalidState { .. }));
    }

    #[tokio::test]
    async fn test_invalid_inputs_are_reported() {
        let h = harness();
        let record = submit(&h, "merkahorro").await;

        let err = h
            .engine
            .apply_decision(record.id(), "rrhh", "aprobar", None)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidRole(_)));

        let err = h
            .engine
            .apply_decision(record.id(), "area", "tal vez", None)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidDecision(_)));

        let err = h
            .engine
            .apply_decision(999, "area", "aprobar", None)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    #[tokio::test]
    async fn test_mail_failure_does_not_undo_the_transition() {
        let h = harness_with_mail(RecordingMailService::failing());
        let outcome = h
            .submissions
            .create(Submission::new(fields("merkahorro"), Some(chart())))
            .await
            .unwrap();
        assert!(outcome.notification.wait().await.is_err());

        let decided = h
            .engine
            .apply_decision(outcome.record.id(), "area", "aprobar", None)
            .await
            .unwrap();
        assert!(decided.notification.wait().await.is_err());

        let stored = h.store.get(outcome.record.id()).await.unwrap();
        assert_eq!(stored.estado(), &WorkflowState::Pending(Role::Director));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_mail_provider_is_cut_off_by_timeout() {
        let h = harness_with_mail(RecordingMailService::slow(Duration::from_secs(60)));
        let record = h
            .submissions
            .create(Submission::new(fields("merkahorro"), Some(chart())))
            .await
            .unwrap()
            .record;

        let started = tokio::time::Instant::now();
        let decided = h
            .engine
            .apply_decision(record.id(), "area", "aprobar", None)
            .await
            .unwrap();
        assert!(started.elapsed() < Duration::from_secs(2));

        let stored = h.store.get(record.id()).await.unwrap();
        assert_eq!(stored.estado(), &WorkflowState::Pending(Role::Director));

        let err = decided.notification.wait().await.unwrap_err();
        assert!(matches!(err, MailError::Timeout(2000)));
        assert!(started.elapsed() >= Duration::from_secs(2));
        assert!(started.elapsed() < Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_stage_set_grows_monotonically_without_duplicates() {
        let h = harness();
        let record = submit(&h, "megamayoristas").await;
        let mut previous_len = 0;
        for role in Company::Megamayoristas.roles() {
            let outcome = h
                .engine
                .apply_decision(record.id(), role.as_str(), "aprobar", None)
                .await
                .unwrap();
            let stages = outcome.record.etapas_aprobadas().to_vec();
            assert_eq!(stages.len(), previous_len + 1);
            let mut deduped = stages.clone();
            deduped.dedup();
            assert_eq!(deduped, stages);
            previous_len = stages.len();
        }
        let stored = h.store.get(record.id()).await.unwrap();
        assert_eq!(stored.historial().len(), 6);
    }
}
