use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use startupmatch::auth::session::{SessionClaims, SessionKeys};
use startupmatch::auth::Principal;
use startupmatch::cli;
use startupmatch::config;
use startupmatch::models::content::ContentKind;
use startupmatch::moderation;
use startupmatch::store::memory::MemoryStore;
use startupmatch::store::postgres::PgStore;
use startupmatch::store::ContentStore;
use startupmatch::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use opentelemetry::KeyValue;
    use opentelemetry_sdk::{trace as sdktrace, Resource};

    // OTLP export only when an endpoint is configured
    let telemetry_layer = match std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT") {
        Ok(_) => {
            let tracer = opentelemetry_otlp::new_pipeline()
                .tracing()
                .with_exporter(opentelemetry_otlp::new_exporter().tonic())
                .with_trace_config(sdktrace::config().with_resource(Resource::new(vec![
                    KeyValue::new("service.name", "startupmatch"),
                ])))
                .install_batch(opentelemetry_sdk::runtime::Tokio)
                .context("failed to install OpenTelemetry tracer")?;
            Some(tracing_opentelemetry::layer().with_tracer(tracer))
        }
        Err(_) => None,
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "startupmatch=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .with(telemetry_layer)
        .init();

    let cfg = config::load()?;
    let args = cli::Cli::parse();

    let result = match args.command {
        Some(cli::Commands::Serve { port, in_memory }) => {
            let port = port.unwrap_or(cfg.port);
            run_server(cfg, port, in_memory).await
        }
        Some(cli::Commands::Migrate) => {
            let db = PgStore::connect(&cfg.database_url).await?;
            db.migrate().await?;
            println!("Migrations applied.");
            Ok(())
        }
        Some(cli::Commands::User { command }) => {
            let db = PgStore::connect(&cfg.database_url).await?;
            handle_user_command(&db, command).await
        }
        Some(cli::Commands::Session { command }) => handle_session_command(&cfg, command),
        Some(cli::Commands::Moderation { command }) => {
            let db = PgStore::connect(&cfg.database_url).await?;
            handle_moderation_command(&db, command).await
        }
        None => {
            let port = cfg.port;
            run_server(cfg, port, false).await
        }
    };

    if let Err(ref e) = result {
        eprintln!("Error: {:?}", e);
    }
    result
}

async fn run_server(cfg: config::Config, port: u16, in_memory: bool) -> anyhow::Result<()> {
    let store: Arc<dyn ContentStore> = if in_memory {
        tracing::warn!("Using in-memory store; all data is lost on exit");
        Arc::new(MemoryStore::new())
    } else {
        tracing::info!("Connecting to database...");
        let db = PgStore::connect(&cfg.database_url).await?;

        tracing::info!("Running migrations...");
        db.migrate().await?;
        Arc::new(db)
    };

    let state = Arc::new(AppState::new(cfg, store)?);
    let app = startupmatch::app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("StartupMatch listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn handle_user_command(db: &PgStore, cmd: cli::UserCommands) -> anyhow::Result<()> {
    match cmd {
        cli::UserCommands::List => {
            let users = db.list_users().await?;
            if users.is_empty() {
                println!("No users found.");
                return Ok(());
            }

            println!("{:<30} {:<30} {:<6} JOINED", "ID", "EMAIL", "ADMIN");
            for u in users {
                println!(
                    "{:<30} {:<30} {:<6} {}",
                    u.id,
                    u.email.as_deref().unwrap_or("-"),
                    u.is_admin,
                    u.created_at.format("%Y-%m-%d")
                );
            }
        }
        cli::UserCommands::Promote { user_id } => {
            if db.set_admin(&user_id, true).await? {
                println!("User {} is now an admin.", user_id);
            } else {
                println!("User {} not found.", user_id);
            }
        }
        cli::UserCommands::Demote { user_id } => {
            if db.set_admin(&user_id, false).await? {
                println!("User {} is no longer an admin.", user_id);
            } else {
                println!("User {} not found.", user_id);
            }
        }
    }
    Ok(())
}

fn handle_session_command(cfg: &config::Config, cmd: cli::SessionCommands) -> anyhow::Result<()> {
    match cmd {
        cli::SessionCommands::Issue {
            sub,
            email,
            first_name,
            last_name,
            hours,
        } => {
            if hours <= 0 {
                anyhow::bail!("--hours must be positive");
            }
            let mut claims = SessionClaims::new(sub, chrono::Duration::hours(hours));
            claims.email = email;
            claims.first_name = first_name;
            claims.last_name = last_name;

            let token = SessionKeys::new(&cfg.session_secret).issue(&claims)?;
            println!("Authorization: Bearer {}", token);
        }
    }
    Ok(())
}

async fn handle_moderation_command(
    db: &PgStore,
    cmd: cli::ModerationCommands,
) -> anyhow::Result<()> {
    match cmd {
        cli::ModerationCommands::Pending => {
            let queue = moderation::pending_queue(db).await?;
            if queue.is_empty() {
                println!("Nothing awaiting review.");
                return Ok(());
            }

            println!("{:<12} {:<38} {:<30} SUBMITTED", "KIND", "ID", "OWNER");
            for item in queue.iter() {
                println!(
                    "{:<12} {:<38} {:<30} {}",
                    item.kind(),
                    item.id(),
                    item.owner_id(),
                    item.created_at().format("%Y-%m-%d %H:%M")
                );
            }
        }
        cli::ModerationCommands::Set {
            kind,
            id,
            status,
            admin,
        } => {
            let kind = ContentKind::parse(&kind)
                .ok_or_else(|| anyhow::anyhow!("unknown content kind: {}", kind))?;
            let id = uuid::Uuid::parse_str(&id).context("Invalid item ID")?;

            let user = db
                .get_user(&admin)
                .await?
                .ok_or_else(|| anyhow::anyhow!("user not found: {}", admin))?;
            let principal = Principal::from_user(&user);

            let item = moderation::set_status(db, kind, id, &status, &principal)
                .await
                .map_err(|e| anyhow::anyhow!("{}", e))?;
            println!("{} {} is now {}.", kind.label(), item.id(), item.status());
        }
    }
    Ok(())
}
