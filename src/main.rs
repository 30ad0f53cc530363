use axum::Router;
use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use signpost::config::Config;
use signpost::db::{create_pool, init_db, queries, AppState};
use signpost::handlers;
use signpost::models::{CreateCategory, CreateOrganisation, CreateUser};

#[derive(Parser, Debug)]
#[command(name = "signpost")]
#[command(about = "Directory of community organisations")]
struct Cli {
    /// Seed the database with dev data (categories, organisations, users)
    #[arg(long)]
    seed: bool,

    /// Delete the database on exit (dev mode only, useful for fresh starts)
    #[arg(long)]
    ephemeral: bool,
}

/// Seeds the database with dev data for local testing.
/// Creates: categories, organisations with and without coordinates, an
/// admin user and an organisation-admin user. Only runs when empty.
fn seed_dev_data(state: &AppState) {
    let conn = state.db.get().expect("Failed to get db connection for seeding");

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM organisations", [], |row| row.get(0))
        .expect("Failed to count organisations");
    if count > 0 {
        tracing::info!("Database already has data, skipping seed");
        return;
    }

    tracing::info!("Seeding dev data");

    let advice = queries::create_category(
        &conn,
        &CreateCategory {
            name: "Advice & Support".to_string(),
        },
    )
    .expect("Failed to create dev category");
    let youth = queries::create_category(
        &conn,
        &CreateCategory {
            name: "Youth Work".to_string(),
        },
    )
    .expect("Failed to create dev category");

    let counselling = queries::create_organisation(
        &conn,
        &CreateOrganisation {
            name: "Harrow Bereavement Counselling".to_string(),
            description: Some("Bereavement counselling for the borough".to_string()),
            address: Some("64 Pinner Road".to_string()),
            postcode: Some("HA1 4HZ".to_string()),
            email: Some("info@counselling.example.org".to_string()),
            website: Some("https://counselling.example.org".to_string()),
            latitude: Some(51.5898),
            longitude: Some(-0.3346),
            publish_email: true,
            category_ids: vec![advice.id.clone()],
            ..Default::default()
        },
    )
    .expect("Failed to create dev organisation");

    // Entry without coordinates: exercises the no-marker path on the map
    queries::create_organisation(
        &conn,
        &CreateOrganisation {
            name: "Harrow Youth Club".to_string(),
            description: Some("Weekly youth club nights".to_string()),
            category_ids: vec![youth.id.clone()],
            ..Default::default()
        },
    )
    .expect("Failed to create dev organisation");

    let admin_key = queries::generate_api_key();
    queries::create_user(
        &conn,
        &CreateUser {
            email: "admin@signpost.local".to_string(),
            name: "Dev Admin".to_string(),
            admin: true,
            organisation_id: None,
        },
        &admin_key,
    )
    .expect("Failed to create dev admin");

    let org_admin_key = queries::generate_api_key();
    queries::create_user(
        &conn,
        &CreateUser {
            email: "orgadmin@signpost.local".to_string(),
            name: "Dev Org Admin".to_string(),
            admin: false,
            organisation_id: Some(counselling.id.clone()),
        },
        &org_admin_key,
    )
    .expect("Failed to create dev org admin");

    tracing::info!("Dev data seeded");

    // Copy-paste friendly output (no log formatting)
    println!();
    println!("--- COPY FROM HERE ---");
    println!("  admin_api_key: {}", admin_key);
    println!("  org_admin_api_key: {}", org_admin_key);
    println!("  organisation_id: {}", counselling.id);
    println!("--- END COPY ---");
    println!();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "signpost=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env();

    if config.dev_mode {
        tracing::info!("Running in DEVELOPMENT mode");
    }

    // Create database connection pool and initialize the schema
    let db_pool = create_pool(&config.database_path).expect("Failed to create database pool");
    {
        let conn = db_pool.get().expect("Failed to get connection");
        init_db(&conn).expect("Failed to initialize database");
    }

    let state = AppState {
        db: db_pool,
        base_url: config.base_url.clone(),
    };

    // Seed dev data if --seed flag is passed (only in dev mode)
    if cli.seed {
        if !config.dev_mode {
            tracing::warn!("--seed flag ignored: not in dev mode (set SIGNPOST_ENV=dev)");
        } else {
            seed_dev_data(&state);
        }
    }

    // Build the application router
    let app = Router::new()
        .merge(handlers::router(state.clone()))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start the server
    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    let cleanup_on_exit = cli.ephemeral && config.dev_mode;
    let db_path = config.database_path.clone();

    if cleanup_on_exit {
        tracing::info!("EPHEMERAL MODE: database will be deleted on exit");
    }

    tracing::info!("Signpost server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Failed to start server");

    // Cleanup on exit if ephemeral mode
    if cleanup_on_exit {
        tracing::info!("Cleaning up ephemeral database...");
        if let Err(e) = std::fs::remove_file(&db_path) {
            tracing::warn!("Failed to remove {}: {}", db_path, e);
        } else {
            tracing::info!("Removed {}", db_path);
        }
        let _ = std::fs::remove_file(format!("{}-wal", db_path));
        let _ = std::fs::remove_file(format!("{}-shm", db_path));
    }
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received, stopping server...");
}
