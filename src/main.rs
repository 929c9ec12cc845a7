//! moviemind CLI entry point

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use moviemind::{
    commands::{
        cmd_db_reset, cmd_db_status, cmd_expand, cmd_index, cmd_init, cmd_profile, cmd_recommend,
        cmd_search, cmd_status, print_db_status, print_expand_result, print_index_stats,
        print_init_report, print_profile, print_recommendation, print_search_results,
        print_status,
    },
    config::Config,
    embed::create_embedder,
    error::Result,
    generate::{GeminiGenerator, Generator},
    progress::LogWriterFactory,
    recommend::RecommendationFilters,
    store::QdrantStore,
};
use std::path::{Path, PathBuf};
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "moviemind")]
#[command(version, about = "Movie recommendations from your Letterboxd history", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config and create the Qdrant collection
    Init {
        /// Force overwrite existing config
        #[arg(long)]
        force: bool,
    },

    /// Load a Letterboxd export and rebuild the index
    Index {
        /// Export folder containing ratings.csv (and optionally reviews.csv)
        #[arg(default_value = "letterboxd")]
        folder: PathBuf,
    },

    /// Search watched movies by meaning
    Search {
        /// The search query
        query: String,

        /// Maximum number of movies
        #[arg(short, long, default_value = "10")]
        limit: usize,

        /// Search with the query as given, without variants
        #[arg(long)]
        no_expand: bool,
    },

    /// Show the variants a query expands to
    Expand {
        /// The query to expand
        query: String,
    },

    /// Recommend unseen movies
    Recommend {
        /// What you are in the mood for
        query: String,

        /// Minimum rating of the movies used as taste profile
        #[arg(long)]
        min_rating: Option<f32>,

        /// Earliest release year of the movies used as taste profile
        #[arg(long)]
        year_min: Option<i32>,

        /// Allow already watched movies in the recommendations
        #[arg(long)]
        include_watched: bool,
    },

    /// Summarize a Letterboxd export
    Profile {
        /// Export folder containing ratings.csv
        #[arg(default_value = "letterboxd")]
        folder: PathBuf,
    },

    /// Show system status
    Status,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Manage the Qdrant collection
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

/// Database management actions
#[derive(Subcommand)]
enum DbAction {
    /// Show Qdrant collection status
    Status,

    /// Reset the collection (delete all vectors and recreate)
    Reset {
        /// Skip confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(LogWriterFactory::default()))
        .with(filter)
        .init();

    match &cli.command {
        Commands::Init { force } => {
            let report = cmd_init(init_base_dir(cli.config.as_deref()), *force).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_init_report(&report);
            }
            return Ok(());
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(*shell, &mut cmd, "moviemind", &mut std::io::stdout());
            return Ok(());
        }
        Commands::Expand { query } => {
            let result = cmd_expand(query);
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_expand_result(&result);
            }
            return Ok(());
        }
        Commands::Profile { folder } => {
            let stats = cmd_profile(folder)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                print_profile(&stats);
            }
            return Ok(());
        }
        _ => {}
    }

    let config = load_config(cli.config.as_deref())?;
    let store = QdrantStore::connect(&config)?;

    match cli.command {
        Commands::Index { folder } => {
            let embedder = create_embedder(&config.embedding)?;
            let stats = cmd_index(&config, embedder.as_ref(), &store, &folder, !cli.json).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                print_index_stats(&stats);
            }
        }

        Commands::Search {
            query,
            limit,
            no_expand,
        } => {
            let embedder = create_embedder(&config.embedding)?;
            let result =
                cmd_search(&config, embedder.as_ref(), &store, &query, limit, !no_expand).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_search_results(&result);
            }
        }

        Commands::Recommend {
            query,
            min_rating,
            year_min,
            include_watched,
        } => {
            let embedder = create_embedder(&config.embedding)?;
            let generator = GeminiGenerator::from_config(&config)?;
            let defaults = RecommendationFilters::from(&config.recommend);
            let filters = RecommendationFilters {
                min_rating: min_rating.unwrap_or(defaults.min_rating),
                year_min: year_min.unwrap_or(defaults.year_min),
                only_unwatched: !include_watched,
            };

            let result = cmd_recommend(
                &config,
                embedder.as_ref(),
                &store,
                generator.as_ref().map(|g| g as &dyn Generator),
                &query,
                &filters,
            )
            .await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_recommendation(&result);
            }
        }

        Commands::Status => {
            let status = cmd_status(&config, &store).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                print_status(&status);
            }
        }

        Commands::Db { action } => handle_db_action(&config, &store, action, cli.json).await?,

        Commands::Init { .. }
        | Commands::Completions { .. }
        | Commands::Expand { .. }
        | Commands::Profile { .. } => unreachable!(),
    }

    Ok(())
}

async fn handle_db_action(
    config: &Config,
    store: &QdrantStore,
    action: DbAction,
    json: bool,
) -> Result<()> {
    match action {
        DbAction::Status => {
            let status = cmd_db_status(store, &config.collection_name).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                print_db_status(&status);
            }
        }
        DbAction::Reset { yes } => {
            if !yes {
                eprintln!("⚠️  This will delete ALL indexed movies!");
                eprintln!("Run with --yes to confirm.");
                std::process::exit(1);
            }
            cmd_db_reset(store).await?;
            if json {
                println!(r#"{{"status": "ok", "message": "Collection reset"}}"#);
            } else {
                println!("✓ Qdrant collection reset (all data deleted and collection recreated)");
            }
        }
    }

    Ok(())
}

/// Base directory for `init`: the parent of a `.toml` path, or the given directory
fn init_base_dir(path: Option<&Path>) -> Option<PathBuf> {
    let path = path?;
    if path.extension().is_some_and(|e| e == "toml") {
        path.parent().map(PathBuf::from)
    } else {
        Some(path.to_path_buf())
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path),
        None => Config::load_from(None),
    }
}
