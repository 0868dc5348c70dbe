use std::sync::Arc;

use actix_request_identifier::{IdReuse, RequestIdentifier};
use actix_web::web::Data;
use anyhow::Context;
use tracing_actix_web::TracingLogger;
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

use crate::config::{Settings, StoreKind};
use crate::database::connect::{create_db_connection_pool, run_migrations};
use crate::database::memory::MemoryStore;
use crate::database::postgres::PgStore;
use crate::database::LedgerStore;
use crate::ledger::Ledger;

mod config;
mod database;
mod error;
mod idgen;
mod ledger;
mod proto;
mod responses;
mod routes;
mod schema;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env()?;

    // setup tracing and use bunyan formatter
    let level = settings.log_level;
    let formatting_layer = BunyanFormattingLayer::new("flock-ledger".into(), std::io::stdout);
    let subscriber = Registry::default()
        .with(filter_fn(move |metadata| *metadata.level() <= level))
        .with(JsonStorageLayer)
        .with(formatting_layer);
    tracing::subscriber::set_global_default(subscriber).context("failed to install tracing subscriber")?;

    let store: Arc<dyn LedgerStore> = match settings.store {
        StoreKind::Postgres => {
            let database_url = settings
                .database_url
                .as_deref()
                .context("DATABASE_URL must be set")?;
            let db = create_db_connection_pool(database_url)?;
            run_migrations(&db)?;
            Arc::new(PgStore::new(db))
        }
        StoreKind::Memory => {
            tracing::warn!("using the in-memory store, nothing will be persisted");
            Arc::new(MemoryStore::new())
        }
    };
    let ledger = Ledger::new(store);

    tracing::info!(bind_address = %settings.bind_address, store = ?settings.store, "starting ledger server");
    let server = actix_web::HttpServer::new(move || {
        actix_web::App::new()
            .wrap(TracingLogger::default())
            .wrap(RequestIdentifier::with_uuid().use_incoming_id(IdReuse::UseIncoming))
            .app_data(Data::new(ledger.clone()))
            .configure(routes::configure)
    });

    server
        .bind(&settings.bind_address)
        .with_context(|| format!("failed to bind {}", settings.bind_address))?
        .run()
        .await
        .context("server error")
}
