use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use clausex_core::error::UploadError;
use clausex_core::extraction::LoanExtractor;
use clausex_core::llm::gemini::GeminiClient;
use clausex_core::session::{store, SessionStore};

#[derive(Debug, Parser)]
#[command(name = "clausex_cli", about = "Analyze a loan document and print the extracted terms")]
struct Args {
    /// Loan agreement to analyze (PDF, JPG or PNG).
    path: PathBuf,

    /// Override the MIME type guessed from the file extension.
    #[arg(long)]
    mime_type: Option<String>,

    /// Print single-line JSON instead of pretty output.
    #[arg(long)]
    compact: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();

    let settings = clausex_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let model = GeminiClient::from_settings(&settings)?;
    let extractor = LoanExtractor::new(Arc::new(model));
    let session = SessionStore::new();

    match store::upload_file(&session, &extractor, &args.path, args.mime_type.as_deref()).await {
        Ok(record) => {
            let out = if args.compact {
                serde_json::to_string(&record)?
            } else {
                serde_json::to_string_pretty(&record)?
            };
            println!("{out}");
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            match &err {
                UploadError::FileRead(e) => {
                    tracing::error!(
                        path = %args.path.display(),
                        error = %format!("{:#}", e.cause()),
                        "could not read document"
                    );
                }
                UploadError::Extraction(e) => {
                    sentry_anyhow::capture_anyhow(e.cause());
                }
            }
            eprintln!("{err}");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn init_sentry(settings: &clausex_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
