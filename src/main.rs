//! rtc-blame - per-line blame for Jazz RTC sandboxes
//!
//! # Usage
//! ```bash
//! rtc-blame blame src/Foo.java src/Bar.java   # Print blame as JSON
//! rtc-blame serve --base-dir ~/sandbox        # Serve blame over HTTP
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use clap::{Args, Parser, Subcommand};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rtc_blame::models::BlameResponse;
use rtc_blame::scm::{BlameCommand, BlameInput, InputFile, Workspace};
use rtc_blame::{routes, BlameConfig};

/// Per-line blame for files in a Jazz RTC sandbox
#[derive(Parser)]
#[command(name = "rtc-blame")]
#[command(about = "Per-line blame for Jazz RTC sandboxes via lscm annotate", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    jazz: JazzArgs,
}

#[derive(Args)]
struct JazzArgs {
    /// Username for Jazz RTC authentication
    #[arg(short, long, global = true, env = "RTC_USERNAME")]
    username: Option<String>,

    /// Password for Jazz RTC authentication
    #[arg(short = 'P', long, global = true, env = "RTC_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Timeout for each annotate command, in milliseconds (0 = default)
    #[arg(long, global = true, env = "RTC_TIMEOUT_MS", default_value_t = 60_000)]
    timeout_ms: u64,

    /// The lscm executable
    #[arg(long, global = true, env = "RTC_LSCM", default_value = "lscm")]
    lscm: String,

    /// Sandbox directory that annotate runs from
    #[arg(short, long, global = true, default_value = ".")]
    base_dir: PathBuf,
}

impl JazzArgs {
    fn config(&self) -> BlameConfig {
        BlameConfig::default()
            .with_credentials(self.username.clone(), self.password.clone())
            .with_timeout_ms(self.timeout_ms)
            .with_executable(self.lscm.clone())
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Blame files and print the result as JSON
    Blame {
        /// Files to blame, relative to the base directory
        #[arg(value_name = "FILES", required = true)]
        files: Vec<PathBuf>,
    },
    /// Serve blame over HTTP
    Serve {
        /// Port to run the server on
        #[arg(short, long, default_value = "3001")]
        port: u16,
    },
}

async fn run_blame(jazz: &JazzArgs, files: &[PathBuf]) -> anyhow::Result<bool> {
    let base_dir = tokio::fs::canonicalize(&jazz.base_dir).await?;

    let mut inputs = Vec::with_capacity(files.len());
    let mut ok = true;
    for path in files {
        match InputFile::from_disk(&base_dir, path).await {
            Ok(file) => inputs.push(file),
            Err(e) => {
                eprintln!("✗ {}: {}", path.display(), e);
                ok = false;
            }
        }
    }

    let command = BlameCommand::new(jazz.config());
    let mut results: Vec<BlameResponse> = Vec::new();
    let report = command
        .blame(&BlameInput::new(base_dir, inputs), &mut results)
        .await;

    println!("{}", serde_json::to_string_pretty(&results)?);

    for (path, e) in report.failures() {
        eprintln!("✗ {}: {}", path, e);
        ok = false;
    }
    Ok(ok)
}

async fn run_server(jazz: &JazzArgs, port: u16) -> anyhow::Result<()> {
    let workspace = match Workspace::open(&jazz.base_dir, jazz.config()) {
        Ok(w) => w,
        Err(e) => {
            eprintln!("✗ Failed to open sandbox: {}", e);
            eprintln!("  Path: {}", jazz.base_dir.display());
            std::process::exit(1);
        }
    };
    let base_dir = workspace.base_dir.display().to_string();

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .merge(routes::create_router(Arc::new(workspace)))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr = format!("127.0.0.1:{}", port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("✗ Failed to bind to port {}: {}", port, e);
            eprintln!("  Try a different port with --port <PORT>");
            std::process::exit(1);
        }
    };

    println!();
    println!("  Sandbox: {}", base_dir);
    println!("  Server:  http://{}/api/v1/blame?path=<file>", addr);
    println!();
    println!("  Press Ctrl+C to stop");
    println!();

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        println!("\n  Shutting down...");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing (quiet unless RUST_LOG says otherwise)
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match &cli.command {
        Commands::Blame { files } => {
            if !run_blame(&cli.jazz, files).await? {
                std::process::exit(1);
            }
        }
        Commands::Serve { port } => run_server(&cli.jazz, *port).await?,
    }

    Ok(())
}
