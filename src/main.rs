use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ratchet::config::Config;
use ratchet::db::{create_pool, init_audit_db, init_db, queries, AppState};
use ratchet::features::{features_for_tier, Tier};
use ratchet::handlers;
use ratchet::id::EntityType;
use ratchet::keycodec::KeyCodec;
use ratchet::models::{CreateCustomer, License, LicensePayload};
use ratchet::util::{now, SECONDS_PER_DAY};

#[derive(Parser, Debug)]
#[command(name = "ratchet")]
#[command(about = "License server for the Ratchet CMMS suite")]
struct Cli {
    /// Seed the database with dev data (customer + one license per tier)
    #[arg(long)]
    seed: bool,

    /// Delete databases on exit (dev mode only, useful for fresh starts)
    #[arg(long)]
    ephemeral: bool,
}

/// Seeds the database with dev data for testing.
/// Creates a customer and one license per tier, printing the keys.
/// Only runs in dev mode and when the database is empty.
fn seed_dev_data(state: &AppState) {
    let conn = state.db.get().expect("Failed to get db connection for seeding");

    let existing = queries::list_customers(&conn).expect("Failed to list customers");
    if !existing.is_empty() {
        tracing::info!("Database already has data, skipping seed");
        return;
    }

    tracing::info!("============================================");
    tracing::info!("SEEDING DEV DATA");
    tracing::info!("============================================");

    let customer = queries::create_customer(
        &conn,
        &CreateCustomer {
            name: "Dev Customer".to_string(),
            contact_email: Some("dev@ratchet.local".to_string()),
        },
    )
    .expect("Failed to create dev customer");

    tracing::info!("Customer: {} (id: {})", customer.name, customer.id);

    println!();
    println!("--- COPY FROM HERE ---");
    println!("  customer_id: {}", customer.id);

    for tier in [Tier::Basic, Tier::Pro, Tier::Enterprise] {
        let ts = now();
        let payload = LicensePayload {
            license_id: EntityType::License.gen_id(),
            customer_id: customer.id.clone(),
            tier,
            max_activations: 3,
            issued_at: ts,
            expires_at: ts + 365 * SECONDS_PER_DAY,
            features: features_for_tier(tier),
        };
        let license_key = state
            .codec
            .issue(&payload)
            .expect("Failed to sign dev license");
        let license = License {
            id: payload.license_id.clone(),
            customer_id: payload.customer_id.clone(),
            license_key: license_key.clone(),
            tier,
            max_activations: payload.max_activations,
            features: payload.features.clone(),
            issued_at: payload.issued_at,
            expires_at: payload.expires_at,
            revoked: false,
            revoked_at: None,
            revoked_reason: None,
        };
        queries::insert_license(&conn, &license).expect("Failed to insert dev license");

        tracing::info!("License ({}): {}", tier.as_ref(), license.id);
        println!("  {}_license_key: {}", tier.as_ref(), license_key);
    }

    println!("--- END COPY ---");
    println!();

    tracing::info!("============================================");
    tracing::info!("DEV DATA SEEDED SUCCESSFULLY");
    tracing::info!("============================================");
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ratchet=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    if config.dev_mode {
        tracing::info!("Running in DEVELOPMENT mode");
    }
    if config.admin_api_key.is_none() {
        tracing::warn!("ADMIN_API_KEY not set: admin API is disabled");
    }

    // Create database connection pools
    let db_pool = create_pool(&config.database_path).expect("Failed to create database pool");
    let audit_pool =
        create_pool(&config.audit_database_path).expect("Failed to create audit database pool");

    // Initialize database schemas
    {
        let conn = db_pool.get().expect("Failed to get connection");
        init_db(&conn).expect("Failed to initialize database");
    }
    {
        let conn = audit_pool.get().expect("Failed to get audit connection");
        init_audit_db(&conn).expect("Failed to initialize audit database");
    }

    // Load or generate the license signing keypair
    let codec = KeyCodec::load_or_generate(Path::new(&config.signing_key_path))
        .expect("Failed to load signing key");
    tracing::info!("License public key: {}", codec.public_key_b64());

    let state = AppState {
        db: db_pool,
        audit: audit_pool,
        codec: Arc::new(codec),
        base_url: config.base_url.clone(),
        release_dir: config.release_dir.clone(),
        admin_api_key: config.admin_api_key.clone(),
        expiry_warning_days: config.expiry_warning_days,
        audit_log_enabled: config.audit_log_enabled,
    };

    // Seed dev data if --seed flag is passed (only in dev mode)
    if cli.seed {
        if !config.dev_mode {
            tracing::warn!("--seed flag ignored: not in dev mode (set RATCHET_ENV=dev)");
        } else {
            seed_dev_data(&state);
        }
    }

    let app = handlers::router(state).layer(TraceLayer::new_for_http());

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    let cleanup_on_exit = cli.ephemeral && config.dev_mode;
    let db_path = config.database_path.clone();
    let audit_path = config.audit_database_path.clone();

    if cleanup_on_exit {
        tracing::info!("EPHEMERAL MODE: databases will be deleted on exit");
    }

    tracing::info!("Ratchet license server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Failed to start server");

    if cleanup_on_exit {
        tracing::info!("Cleaning up ephemeral databases...");
        for path in [&db_path, &audit_path] {
            if let Err(e) = std::fs::remove_file(path) {
                tracing::warn!("Failed to remove {}: {}", path, e);
            }
            let _ = std::fs::remove_file(format!("{}-wal", path));
            let _ = std::fs::remove_file(format!("{}-shm", path));
        }
        tracing::info!("Ephemeral cleanup complete");
    }
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received, stopping server...");
}
