//! Binary entry point for lenscape.
//!
//! Every command prints JSON on stdout; logs go to stderr.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow needless_pass_by_value for command functions
#![allow(clippy::needless_pass_by_value)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use lenscape::config::LenscapeConfig;
use lenscape::embedding::MachineLearningClient;
use lenscape::models::{PersonId, PersonRating, RatingDimension, RatingRecord, TagLabels};
use lenscape::observability::{self, InitOptions};
use lenscape::services::{sort_by_dimension, sort_by_rating, sort_default};
use lenscape::storage::{JsonCatalog, PersonRatingStore, TagTaxonomyStore};
use lenscape::{
    ImageSearchRequest, ImageSearchService, OrganizeService, OwnerId, OwnerScope,
    PeopleAuditService, SequencableAsset, Sequencer,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

/// Lenscape - image similarity search and sequencing for photo catalogs.
#[derive(Parser)]
#[command(name = "lenscape")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true, env = "LENSCAPE_CONFIG_PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Search the catalog by example image.
    Search {
        /// Path to the example image.
        image: PathBuf,

        /// Search mode: face or content (`similar` is accepted).
        #[arg(short, long, default_value = "face")]
        mode: String,

        /// Owner whose assets may match (repeatable).
        #[arg(short, long = "owner", required = true)]
        owners: Vec<String>,

        /// Maximum results per index query.
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// List an owner's unassigned assets in browsing order.
    Organize {
        /// Owner identifier.
        owner: String,
    },

    /// List an owner's people whose assets span several directories.
    AuditPaths {
        /// Owner identifier.
        owner: String,
    },

    /// Order assets from a JSON file so similar ones sit together.
    Sequence {
        /// JSON array of assets with optional embeddings.
        file: PathBuf,
    },

    /// Manage person ratings.
    Rate {
        /// Rating subcommand.
        #[command(subcommand)]
        action: RateAction,
    },

    /// Manage the tag taxonomy.
    Tags {
        /// Tags subcommand.
        #[command(subcommand)]
        action: TagsAction,
    },

    /// Show the effective configuration.
    Config,

    /// Check that the machine-learning service answers.
    Ping,
}

/// Rating subcommands.
#[derive(Subcommand)]
enum RateAction {
    /// Create or replace a person's rating.
    Set {
        /// Person identifier.
        person: String,

        /// Owner recording the rating.
        #[arg(long)]
        owner: Option<String>,

        /// Overall score.
        #[arg(long)]
        overall: Option<f32>,

        /// Looks score.
        #[arg(long)]
        looks: Option<f32>,

        /// Body score.
        #[arg(long)]
        body: Option<f32>,

        /// Content score.
        #[arg(long)]
        content: Option<f32>,
    },

    /// List ratings.
    List {
        /// `default`, or a dimension (overall, looks, body, content).
        /// Without it, unrated people come first.
        #[arg(short, long)]
        sort: Option<String>,
    },
}

/// Tag taxonomy subcommands.
#[derive(Subcommand)]
enum TagsAction {
    /// Print the taxonomy.
    Show,
    /// Replace the taxonomy with the contents of a JSON file.
    Import {
        /// JSON document with `types` and `skills`.
        file: PathBuf,
    },
}

/// Main entry point.
fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let (config, warnings) = match LenscapeConfig::load_with_warnings(cli.config.as_deref()) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        },
    };

    let observability = match observability::init_from_config(
        &config,
        InitOptions {
            verbose: cli.verbose,
        },
    ) {
        Ok(handle) => handle,
        Err(e) => {
            for warning in &warnings {
                eprintln!("Warning: {warning}");
            }
            eprintln!("Failed to initialize observability: {e}");
            return ExitCode::FAILURE;
        },
    };
    for warning in &warnings {
        tracing::warn!(warning = %warning, "Configuration warning");
    }

    let outcome = run_command(cli.command, &config);

    if let Some(metrics) = observability.metrics()
        && let Err(e) = metrics.write_textfile()
    {
        eprintln!("Failed to write metrics: {e}");
    }

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        },
    }
}

/// Runs the selected command.
fn run_command(command: Commands, config: &LenscapeConfig) -> anyhow::Result<()> {
    match command {
        Commands::Search {
            image,
            mode,
            owners,
            limit,
        } => cmd_search(config, &image, &mode, owners, limit),
        Commands::Organize { owner } => cmd_organize(config, owner),
        Commands::AuditPaths { owner } => cmd_audit_paths(config, owner),
        Commands::Sequence { file } => cmd_sequence(config, &file),
        Commands::Rate { action } => cmd_rate(config, action),
        Commands::Tags { action } => cmd_tags(config, action),
        Commands::Config => print_json(config),
        Commands::Ping => cmd_ping(config),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn open_catalog(config: &LenscapeConfig) -> anyhow::Result<Arc<JsonCatalog>> {
    let path = config.storage.catalog_path();
    let catalog = JsonCatalog::open(&path)
        .with_context(|| format!("opening catalog {}", path.display()))?;
    Ok(Arc::new(catalog))
}

fn ml_client(config: &LenscapeConfig) -> MachineLearningClient {
    MachineLearningClient::new(config.machine_learning.url.clone(), config.http_config())
}

/// Search command.
fn cmd_search(
    config: &LenscapeConfig,
    image: &Path,
    mode: &str,
    owners: Vec<String>,
    limit: Option<usize>,
) -> anyhow::Result<()> {
    let bytes =
        std::fs::read(image).with_context(|| format!("reading image {}", image.display()))?;
    let original_name = image
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let scope: OwnerScope = owners.into_iter().collect();
    let request = ImageSearchRequest::new(
        mode,
        bytes,
        original_name,
        scope,
        Some(limit.unwrap_or(config.search.default_max_results)),
    )?;

    let catalog = open_catalog(config)?;
    let service = ImageSearchService::new(
        config.image_search_settings(),
        config.storage.upload_dir(),
        Arc::new(ml_client(config)),
        catalog.clone(),
        catalog,
    );
    let response = service.search(&request)?;
    print_json(&response)
}

/// Organize command.
fn cmd_organize(config: &LenscapeConfig, owner: String) -> anyhow::Result<()> {
    let catalog = open_catalog(config)?;
    let service = OrganizeService::new(
        catalog.clone(),
        catalog,
        Sequencer::new(config.sequencing.chaining_limit),
    );
    let assets = service.unassigned_assets(&OwnerId::new(owner))?;
    print_json(&assets)
}

/// People path audit command.
fn cmd_audit_paths(config: &LenscapeConfig, owner: String) -> anyhow::Result<()> {
    let service = PeopleAuditService::new(open_catalog(config)?, config.storage.library_dir());
    let people = service.multi_path_people(&OwnerId::new(owner))?;
    print_json(&people)
}

/// Sequence command.
fn cmd_sequence(config: &LenscapeConfig, file: &Path) -> anyhow::Result<()> {
    let contents =
        std::fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
    let assets: Vec<SequencableAsset> = serde_json::from_str(&contents)
        .with_context(|| format!("parsing assets from {}", file.display()))?;

    let ordered: Vec<_> = Sequencer::new(config.sequencing.chaining_limit)
        .arrange(&assets)?
        .into_iter()
        .map(SequencableAsset::summary)
        .collect();
    print_json(&ordered)
}

/// Rate command.
fn cmd_rate(config: &LenscapeConfig, action: RateAction) -> anyhow::Result<()> {
    let mut store = PersonRatingStore::open(config.storage.ratings_path())?;
    match action {
        RateAction::Set {
            person,
            owner,
            overall,
            looks,
            body,
            content,
        } => {
            let person = PersonId::new(person);
            store.upsert(
                person.clone(),
                owner.map(OwnerId::new),
                PersonRating {
                    looks,
                    body,
                    content,
                    overall,
                },
            );
            store.flush()?;
            print_json(&store.get(&person))
        },
        RateAction::List { sort } => {
            let mut records: Vec<RatingRecord> = store.iter().cloned().collect();
            match sort.as_deref() {
                None => sort_by_rating(&mut records, |r| r.rate),
                Some("default") => sort_default(&mut records, |r| r.rate),
                Some(name) => {
                    let Some(dimension) = RatingDimension::parse(name) else {
                        bail!("unknown sort '{name}' (expected default, overall, looks, body or content)");
                    };
                    sort_by_dimension(&mut records, dimension, |r| r.rate);
                },
            }
            print_json(&records)
        },
    }
}

/// Tags command.
fn cmd_tags(config: &LenscapeConfig, action: TagsAction) -> anyhow::Result<()> {
    let store = TagTaxonomyStore::open(config.storage.tags_path())?;
    match action {
        TagsAction::Show => print_json(&store.load()?),
        TagsAction::Import { file } => {
            let contents = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let labels: TagLabels = serde_json::from_str(&contents)
                .with_context(|| format!("parsing taxonomy from {}", file.display()))?;
            print_json(&store.save(labels)?)
        },
    }
}

/// Ping command.
fn cmd_ping(config: &LenscapeConfig) -> anyhow::Result<()> {
    let client = ml_client(config);
    let available = client.is_available();
    print_json(&serde_json::json!({
        "endpoint": client.endpoint(),
        "available": available,
    }))?;
    if !available {
        bail!("machine-learning service at {} is not reachable", client.endpoint());
    }
    Ok(())
}
