use std::sync::Arc;
use std::time::Instant;

use core_data::models::*;
use core_data::ports::*;
use core_data::workflow::*;
use serde_json::{json, Value};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(InMemoryRecordStore::new());
    let notifier = Notifier::new(Arc::new(LogMailService), DEFAULT_MAIL_TIMEOUT);
    let events = BroadcastPublisher::new(16);
    let mut feed = events.subscribe();

    let submissions = SubmissionHandler::new(
        store.clone(),
        Arc::new(InMemoryBlobStore::new()),
        notifier.clone(),
        Arc::new(events.clone()),
        IdGenerator::new(1)?,
        Validator::default(),
    );
    let engine = WorkflowEngine::new(store, notifier, Arc::new(events));

    let fields = match json!({
        "company": "construahorro",
        "nombre_cargo": "Asesor comercial",
        "mision_cargo": "Asesorar a los clientes en la compra de materiales",
        "director": "director@construahorro.com",
        "gerencia": "gerencia@construahorro.com",
        "calidad": "calidad@construahorro.com",
        "seguridad": "sst@construahorro.com"
    }) {
        Value::Object(map) => map,
        _ => unreachable!(),
    };
    let chart = UploadedFile::new("organigrama.pdf", "application/pdf", b"%PDF-1.4".to_vec());

    let start = Instant::now();
    let created = submissions.create(Submission::new(fields, Some(chart))).await?;
    created.notification.wait().await?;
    let id = created.record.id();
    println!("Created {} -> {}", id, created.record.estado());

    for role in Company::Construahorro.roles() {
        let outcome = engine.apply_decision(id, role.as_str(), "aprobar", None).await?;
        outcome.notification.wait().await?;
        println!("{}: {}", outcome.message, outcome.record.estado());
    }
    println!("Total processing time: {:?}", start.elapsed());

    println!("\nEvents:");
    while let Ok(event) = feed.try_recv() {
        println!("  {:?} {} {}", event.kind, event.record_id, event.estado);
    }

    println!("\nAudit Trail:");
    let record = submissions.get(id).await?;
    for audit in record.historial() {
        println!("Description: {}", audit.description());
        for change in audit.changes() {
            println!("  Field: {}", change.field());
            println!("  Old Value: {:?}", change.old_value());
            println!("  New Value: {:?}", change.new_value());
            println!("  Reason: {}", change.reason());
        }
    }
    Ok(())
}
