use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use citadelle::models::CreateCardInput;
use citadelle::{api, db};

#[derive(Parser)]
#[command(name = "citadelle")]
#[command(about = "Card-collection server: daily draws, trades and staggered card reveals")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the Citadelle server
    Serve {
        /// Port for HTTP API
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
    /// Load a card catalog from a JSON file
    Seed {
        /// Path to a JSON array of {name, rarity, image_id?} entries
        #[arg(short, long)]
        file: PathBuf,
    },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "citadelle=debug,tower_http=debug".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn serve(port: u16) -> anyhow::Result<()> {
    tracing::info!("Starting Citadelle server on port {}", port);

    let db = db::Database::open_default()?;
    db.migrate()?;

    let app = api::create_router(api::AppState::new(db));

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    tracing::info!("Citadelle server listening on http://127.0.0.1:{}", port);

    axum::serve(listener, app).await?;
    Ok(())
}

fn seed(file: PathBuf) -> anyhow::Result<()> {
    let db = db::Database::open_default()?;
    db.migrate()?;

    let raw = std::fs::read_to_string(&file)?;
    let entries: Vec<CreateCardInput> = serde_json::from_str(&raw)?;

    let mut created = 0usize;
    let mut skipped = 0usize;
    for entry in entries {
        match db.create_card(entry) {
            Ok(card) => {
                created += 1;
                tracing::debug!("Seeded {} ({})", card.name, card.rarity.as_str());
            }
            Err(e) if e.to_string().contains("already") => {
                skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }

    println!(
        "Seeded {} cards from {} ({} duplicates skipped)",
        created,
        file.display(),
        skipped
    );
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing();

    match cli.command {
        Some(Commands::Serve { port }) => serve(port).await?,
        Some(Commands::Seed { file }) => seed(file)?,
        None => serve(3000).await?,
    }

    Ok(())
}
