//! Listing CLI.
//!
//! Manages a listing project (`.listing/`): scaffolding, users, favorites, and
//! a scripted run of the listing-creation wizard.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use listing::core::error::FavoriteError;
use listing::core::types::SubmissionResult;
use listing::exit_codes;
use listing::favorites::{add_favorite, remove_favorite, resolve_current_user};
use listing::io::config::{ListingConfig, load_config};
use listing::io::init::{InitOptions, ListingPaths, init_project};
use listing::io::notify::{ConsoleNotifier, LogRefresh};
use listing::io::store::{JsonStore, ListingStore};
use listing::logging;
use listing::run::{Answers, RunOutcome, run_wizard};
use listing::wizard::{Collaborators, WizardSettings};

#[derive(Parser)]
#[command(name = "listing", version, about = "Multi-step listing creation wizard")]
struct Cli {
    /// Project root containing `.listing/`.
    #[arg(long, global = true, default_value = ".")]
    project_dir: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create `.listing/` with default config, an empty store and the store schema.
    Init {
        /// Overwrite config and schema. An existing store is kept.
        #[arg(short, long)]
        force: bool,
    },
    /// Manage users.
    User {
        #[command(subcommand)]
        command: UserCommand,
    },
    /// Print every listing.
    Listings,
    /// Add or remove a listing from a user's favorites.
    Favorite {
        #[command(subcommand)]
        command: FavoriteCommand,
    },
    /// Walk the wizard with answers from a TOML file and submit at the last step.
    Wizard {
        /// Id of the user creating the listing.
        #[arg(long)]
        user: String,
        /// TOML file with a `[fields]` table.
        #[arg(long)]
        answers: PathBuf,
    },
}

#[derive(Subcommand)]
enum UserCommand {
    /// Add a user and print its id.
    Add { name: String, email: String },
}

#[derive(Subcommand)]
enum FavoriteCommand {
    Add {
        listing_id: String,
        #[arg(long)]
        user: Option<String>,
    },
    Remove {
        listing_id: String,
        #[arg(long)]
        user: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    logging::init();
    let cli = Cli::parse();
    let code = match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            exit_code_for(&err)
        }
    };
    std::process::exit(code);
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<FavoriteError>() {
        Some(FavoriteError::Unauthenticated) => exit_codes::UNAUTHENTICATED,
        _ => exit_codes::INVALID,
    }
}

async fn run(cli: Cli) -> Result<i32> {
    let root = cli.project_dir.as_path();
    match cli.command {
        Command::Init { force } => cmd_init(root, force),
        Command::User {
            command: UserCommand::Add { name, email },
        } => cmd_user_add(root, &name, &email),
        Command::Listings => cmd_listings(root).await,
        Command::Favorite { command } => cmd_favorite(root, command).await,
        Command::Wizard { user, answers } => cmd_wizard(root, &user, &answers).await,
    }
}

/// Loaded config plus the opened store for an initialized project.
struct Project {
    config: ListingConfig,
    store: JsonStore,
}

fn open_project(root: &Path) -> Result<Project> {
    let paths = ListingPaths::new(root);
    if !paths.listing_dir.is_dir() {
        bail!(
            "{} is not a listing project (run `listing init` first)",
            root.display()
        );
    }
    let config = load_config(&paths.config_path)?;
    let store = JsonStore::open(paths.store_path(&config)).context("open store")?;
    Ok(Project { config, store })
}

fn cmd_init(root: &Path, force: bool) -> Result<i32> {
    let paths = init_project(root, &InitOptions { force })?;
    println!("initialized {}", paths.listing_dir.display());
    Ok(exit_codes::OK)
}

fn cmd_user_add(root: &Path, name: &str, email: &str) -> Result<i32> {
    let project = open_project(root)?;
    let user = project.store.add_user(name, email)?;
    println!("{}", user.id);
    Ok(exit_codes::OK)
}

async fn cmd_listings(root: &Path) -> Result<i32> {
    let project = open_project(root)?;
    for listing in project.store.listings().await? {
        println!(
            "{}\t{}\t{}\t${}",
            listing.id, listing.draft.title, listing.draft.category, listing.draft.price
        );
    }
    Ok(exit_codes::OK)
}

async fn cmd_favorite(root: &Path, command: FavoriteCommand) -> Result<i32> {
    let project = open_project(root)?;
    let user = match command {
        FavoriteCommand::Add { listing_id, user } => {
            add_favorite(&project.store, user.as_deref(), &listing_id).await?
        }
        FavoriteCommand::Remove { listing_id, user } => {
            remove_favorite(&project.store, user.as_deref(), &listing_id).await?
        }
    };
    println!("{}", user.favorite_ids.join("\n"));
    Ok(exit_codes::OK)
}

async fn cmd_wizard(root: &Path, user_id: &str, answers_path: &Path) -> Result<i32> {
    let project = open_project(root)?;
    let user = resolve_current_user(&project.store, Some(user_id)).await?;
    let answers = Answers::load(answers_path)?;
    let with = Collaborators {
        store: &project.store,
        owner_id: &user.id,
        notifier: &ConsoleNotifier,
        refresh: &LogRefresh,
    };

    let outcome = run_wizard(
        &answers,
        WizardSettings::from(&project.config),
        &with,
        |text| println!("{}\n", text),
    )
    .await?;

    match outcome {
        RunOutcome::Submitted(SubmissionResult::Success(listing)) => {
            println!("created listing {}", listing.id);
            Ok(exit_codes::OK)
        }
        RunOutcome::Submitted(SubmissionResult::Failure(reason)) => {
            eprintln!("submission failed: {}", reason);
            Ok(exit_codes::SUBMISSION_FAILED)
        }
        RunOutcome::Blocked(fields) => {
            let names: Vec<String> = fields.iter().map(ToString::to_string).collect();
            eprintln!("wizard blocked, invalid fields: {}", names.join(", "));
            Ok(exit_codes::SUBMISSION_FAILED)
        }
    }
}
