//! VidFlow server - main entry point
//!
//! Video production workflow API: projects and videos moving through the
//! role-gated status pipeline, live notifications, affiliate mentions and
//! the Titulin evergreen analyzer.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vidflow_common::config::{ensure_root_folder, resolve_root_folder, TomlConfig, ROOT_FOLDER_ENV};
use vidflow_common::db::users::{self, NewUser};
use vidflow_common::db::{init::get_setting_i64, init_database, sessions};
use vidflow_common::workflow::Role;
use vidflow_server::api::auth::hash_password;
use vidflow_server::services::{OpenAiAnalysis, YoutubeApiClient};
use vidflow_server::{build_router, AppState};

/// Password for the admin account created on an empty database
const ADMIN_PASSWORD_ENV: &str = "VIDFLOW_ADMIN_PASSWORD";

/// Command-line arguments for vidflow-server
#[derive(Parser, Debug)]
#[command(name = "vidflow-server")]
#[command(about = "Video production workflow server")]
#[command(version)]
struct Args {
    /// Port to listen on (overrides the config file)
    #[arg(short, long, env = "VIDFLOW_PORT")]
    port: Option<u16>,

    /// Bind address (overrides the config file)
    #[arg(short, long, env = "VIDFLOW_BIND")]
    bind: Option<String>,

    /// Root folder holding the database
    #[arg(short, long, env = ROOT_FOLDER_ENV)]
    root_folder: Option<PathBuf>,

    /// TOML bootstrap config
    #[arg(short, long, env = "VIDFLOW_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = TomlConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("vidflow_server={0},vidflow_common={0},tower_http=info", config.logging.level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting VidFlow server v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let root_folder = resolve_root_folder(args.root_folder.as_deref(), ROOT_FOLDER_ENV, &config);
    ensure_root_folder(&root_folder).context("Failed to create root folder")?;
    info!("Root folder: {}", root_folder.display());

    let db_path = config.database_path(&root_folder);
    info!("Database path: {}", db_path.display());
    let pool = init_database(&db_path)
        .await
        .context("Failed to initialize database")?;

    bootstrap_admin(&pool).await?;

    let purged = sessions::purge_expired(&pool, Utc::now()).await?;
    if purged > 0 {
        info!("Purged {} expired sessions", purged);
    }

    let mut state = AppState::new(pool.clone())
        .with_session_ttl(chrono::Duration::hours(config.session_ttl_hours.max(1)));

    match config.youtube.api_key.clone().filter(|k| !k.is_empty()) {
        Some(key) => {
            state = state.with_youtube(Arc::new(YoutubeApiClient::new(&config.youtube, key)));
            info!("YouTube client enabled");
        }
        None => warn!("No YouTube API key configured, channel harvesting disabled"),
    }

    match config.analysis.api_key.clone().filter(|k| !k.is_empty()) {
        Some(key) => {
            let analysis = Arc::new(OpenAiAnalysis::new(&config.analysis, key));
            state = state.with_analysis(analysis.clone(), analysis);
            info!(
                "Title analysis enabled ({}, {})",
                config.analysis.embedding_model, config.analysis.chat_model
            );
        }
        None => warn!("No analysis API key configured, title analysis disabled"),
    }

    let heartbeat = get_setting_i64(&pool, "notification_heartbeat_secs", 30).await?;
    let idle_timeout = get_setting_i64(&pool, "notification_idle_timeout_secs", 60).await?;
    let heartbeat_task = state.hub.spawn_heartbeat(
        Duration::from_secs(heartbeat.max(1) as u64),
        Duration::from_secs(idle_timeout.max(1) as u64),
    );

    let app = build_router(state);

    let bind = args.bind.unwrap_or(config.bind_address);
    let port = args.port.unwrap_or(config.port);
    let addr = format!("{}:{}", bind, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("VidFlow listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    heartbeat_task.abort();
    pool.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Create `admin` when the database has no users
async fn bootstrap_admin(pool: &sqlx::SqlitePool) -> Result<()> {
    if users::count_users(pool).await? > 0 {
        return Ok(());
    }

    let Some(password) = std::env::var(ADMIN_PASSWORD_ENV).ok().filter(|p| !p.is_empty()) else {
        warn!(
            "Database has no users; set {} to create the initial admin account",
            ADMIN_PASSWORD_ENV
        );
        return Ok(());
    };

    let password_hash = hash_password(&password).map_err(|e| anyhow!("{:?}", e))?;
    let admin = users::create_user(
        pool,
        &NewUser {
            username: "admin".to_string(),
            password_hash,
            full_name: Some("Administrador".to_string()),
            email: None,
            role: Role::Admin,
            max_assigned_videos: None,
            max_monthly_videos: None,
        },
    )
    .await
    .context("Failed to create initial admin")?;

    info!("Created initial admin account '{}'", admin.username);
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
