mod adapters;
mod config;
mod decision;
mod error;
mod multipart;
mod routes;
mod state;
mod submission;

use actix_web::{App, HttpServer};
use tracing::{debug, error, info, Instrument};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::config::load_config;
use crate::routes::configure;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| {
                std::env::var("RUST_LOG")
                    .unwrap_or_else(|_| "info,actix_web=info".to_string()).into()
            }))
        .with(tracing_subscriber::fmt::layer()
            .with_file(true)
            .with_line_number(true)
            .with_thread_ids(true)
            .with_target(true)
            .with_level(true))
        .init();

    let startup_span = tracing::info_span!("application_startup");

    let config = match load_config() {
        Ok(cfg) => {
            info!(
                host = %cfg.server.hostname,
                port = %cfg.server.port,
                machine_id = cfg.ids.machine_id,
                "Configuration loaded successfully"
            );
            cfg
        }
        Err(e) => {
            error!(
                error = %e,
                "Failed to load configuration. Exiting application"
            );
            std::process::exit(1);
        }
    };

    let state = match state::build(&config).instrument(startup_span).await {
        Ok(state) => state,
        Err(e) => {
            error!(
                error = %e,
                "Failed to initialise collaborators. Exiting application"
            );
            std::process::exit(1);
        }
    };

    let bind_address = format!("{}:{}", &config.server.hostname, &config.server.port);
    info!(
        address = %bind_address,
        "Starting HTTP server"
    );

    HttpServer::new(move || {
        debug!("Initializing new worker");
        App::new()
            .configure(configure(state.clone()))
            .wrap(actix_web::middleware::Logger::default())
            .wrap(actix_web::middleware::Compress::default())
            .wrap(actix_web::middleware::DefaultHeaders::new()
                .add(("Access-Control-Allow-Origin", "*"))
                .add(("Access-Control-Allow-Methods", "GET, POST"))
                .add(("Access-Control-Allow-Headers", "Content-Type")))
    })
    .bind(&bind_address)
    .map_err(|e| {
        error!(error = %e, address = %bind_address, "Failed to bind server");
        e
    })?
    .run()
    .await
}
