//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use promptdesk_blobstore::{FsBlobStore, open_blob_store};
use promptdesk_core::prompt::select_latest;
use promptdesk_core::{Library, SessionDefaults, SessionProgress, SessionService};
use promptdesk_shared::{
    AppConfig, KnowledgeDocument, RecordId, expand_home, init_config, load_config,
    load_config_from,
};
use promptdesk_storage::Storage;
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// PromptDesk: assemble chat sessions from saved prompts and internal knowledge.
#[derive(Parser)]
#[command(
    name = "promptdesk",
    version,
    about = "Assemble procurement-assistant chat sessions from saved prompts and knowledge documents.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to read instead of ~/.promptdesk/promptdesk.toml.
    #[arg(long, global = true, env = "PROMPTDESK_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Initialize a chat session for a user and print it.
    Session {
        /// User identifier.
        #[arg(short, long)]
        user: String,

        /// Print the whole session as JSON.
        #[arg(long)]
        json: bool,

        /// Print the full model context after the summary.
        #[arg(long, conflicts_with = "json")]
        print_context: bool,
    },

    /// List a user's saved system prompt versions.
    Prompts {
        /// User identifier.
        #[arg(short, long)]
        user: String,
    },

    /// System prompt management.
    Prompt {
        #[command(subcommand)]
        action: PromptAction,
    },

    /// List a user's knowledge documents.
    Docs {
        /// User identifier.
        #[arg(short, long)]
        user: String,
    },

    /// Knowledge document management.
    Doc {
        #[command(subcommand)]
        action: DocAction,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Prompt subcommands.
#[derive(Subcommand)]
pub(crate) enum PromptAction {
    /// Save a new prompt version from a file.
    Save {
        /// User identifier.
        #[arg(short, long)]
        user: String,

        /// File containing the system prompt text.
        #[arg(short, long)]
        file: PathBuf,

        /// Model identifier to store with the prompt.
        #[arg(short, long, default_value = "")]
        model: String,

        /// Free-form evaluation notes.
        #[arg(short, long, default_value = "")]
        evaluation: String,
    },
}

/// Knowledge document subcommands.
#[derive(Subcommand)]
pub(crate) enum DocAction {
    /// Copy a text file into the blob root and register it.
    Add {
        /// User identifier.
        #[arg(short, long)]
        user: String,

        /// File holding the extracted document text.
        #[arg(short, long)]
        file: PathBuf,

        /// Display name (defaults to the file name).
        #[arg(short, long)]
        name: Option<String>,

        /// Original format label (defaults to the file extension).
        #[arg(long)]
        format: Option<String>,
    },
    /// Unregister a document and delete its blob.
    Remove {
        /// User identifier.
        #[arg(short, long)]
        user: String,

        /// Document identifier.
        #[arg(long)]
        id: String,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "promptdesk=info",
        1 => "promptdesk=debug",
        _ => "promptdesk=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Session {
            user,
            json,
            print_context,
        } => cmd_session(config_path, &user, json, print_context).await,
        Command::Prompts { user } => cmd_prompts(config_path, &user).await,
        Command::Prompt { action } => match action {
            PromptAction::Save {
                user,
                file,
                model,
                evaluation,
            } => cmd_prompt_save(config_path, &user, &file, &model, &evaluation).await,
        },
        Command::Docs { user } => cmd_docs(config_path, &user).await,
        Command::Doc { action } => match action {
            DocAction::Add {
                user,
                file,
                name,
                format,
            } => cmd_doc_add(config_path, &user, &file, name.as_deref(), format.as_deref()).await,
            DocAction::Remove { user, id } => cmd_doc_remove(config_path, &user, &id).await,
        },
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show(config_path).await,
        },
    }
}

fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    };
    Ok(config)
}

async fn open_storage(config: &AppConfig) -> Result<Storage> {
    let db_path = expand_home(&config.storage.db_path);
    Ok(Storage::open(&db_path).await?)
}

async fn open_storage_readonly(config: &AppConfig) -> Result<Storage> {
    let db_path = expand_home(&config.storage.db_path);
    Storage::open_readonly(&db_path).await.map_err(|e| {
        eyre!(
            "cannot open database at '{}': {e} (save a prompt or add a document first)",
            db_path.display()
        )
    })
}

/// Reject blank user ids before anything is written under them.
fn require_user(user: &str) -> Result<&str> {
    if user.trim().is_empty() {
        return Err(eyre!("--user must not be empty"));
    }
    Ok(user)
}

fn fs_blob_store(config: &AppConfig) -> Result<FsBlobStore> {
    if config.blobs.backend != "fs" {
        return Err(eyre!(
            "this command needs the 'fs' blob backend, but blobs.backend is '{}'",
            config.blobs.backend
        ));
    }
    Ok(FsBlobStore::new(expand_home(&config.blobs.root)))
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

async fn cmd_session(
    config_path: Option<&Path>,
    user: &str,
    json: bool,
    print_context: bool,
) -> Result<()> {
    let config = resolve_config(config_path)?;
    let storage = Arc::new(open_storage(&config).await?);
    let blobs = open_blob_store(&config.blobs)?;

    let library = Library::new(storage.clone(), blobs);
    let service = SessionService::with_defaults(
        storage,
        Arc::new(library),
        SessionDefaults::from(&config.session),
    );

    info!(user, "initializing chat session");

    let reporter = CliProgress::new(!json);
    let result = service.initialize_with_progress(user, &reporter).await;
    reporter.finish();
    let session = result?;

    if json {
        println!("{}", serde_json::to_string_pretty(&session)?);
        return Ok(());
    }

    println!();
    println!("  Chat session ready.");
    println!("  User:      {user}");
    println!("  Model:     {}", session.ai_model);
    println!("  Prompt:    {} chars", session.system_prompt.len());
    println!("  Knowledge: {} chars", session.knowledge_context.len());
    println!("  Context:   {} chars", session.full_context.len());
    println!("  Documents: {}", session.documents_used.len());
    for doc in &session.documents_used {
        println!("    - {} ({}, {} bytes)", doc.name, doc.original_format, doc.size);
    }
    println!("  Created:   {}", session.created_at.to_rfc3339());
    println!();

    if print_context {
        println!("{}", session.full_context);
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new(visible: bool) -> Self {
        if !visible {
            return Self {
                spinner: ProgressBar::hidden(),
            };
        }
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }

    fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl SessionProgress for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn document_loaded(&self, name: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Loaded [{current}/{total}] {name}"));
    }

    fn document_skipped(&self, name: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Skipped [{current}/{total}] {name}"));
    }
}

// ---------------------------------------------------------------------------
// Prompts
// ---------------------------------------------------------------------------

async fn cmd_prompts(config_path: Option<&Path>, user: &str) -> Result<()> {
    let config = resolve_config(config_path)?;
    let storage = open_storage_readonly(&config).await?;

    let versions = storage.prompt_versions(user).await?;
    if versions.is_empty() {
        println!("No saved prompts for '{user}'; the built-in default will be used.");
        return Ok(());
    }

    let latest_id = select_latest(versions.clone()).map(|v| v.id);

    println!();
    for v in &versions {
        let marker = if Some(&v.id) == latest_id.as_ref() {
            "*"
        } else {
            " "
        };
        let model = if v.ai_model.is_empty() {
            "(default)"
        } else {
            v.ai_model.as_str()
        };
        println!(
            "  {marker} v{:<4} {}  {:<32} {} chars",
            v.version,
            v.saved_date.format("%Y-%m-%d %H:%M"),
            model,
            v.system_prompt.len()
        );
    }
    println!();

    Ok(())
}

async fn cmd_prompt_save(
    config_path: Option<&Path>,
    user: &str,
    file: &Path,
    model: &str,
    evaluation: &str,
) -> Result<()> {
    let user = require_user(user)?;
    let config = resolve_config(config_path)?;

    let text = tokio::fs::read_to_string(file)
        .await
        .map_err(|e| eyre!("cannot read '{}': {e}", file.display()))?;
    if text.trim().is_empty() {
        return Err(eyre!("'{}' is empty", file.display()));
    }

    let storage = open_storage(&config).await?;
    let saved = storage
        .save_prompt_version(user, &text, evaluation, model)
        .await?;

    info!(user, version = saved.version, "saved system prompt");
    println!("Saved prompt version {} for '{user}' ({}).", saved.version, saved.id);
    Ok(())
}

// ---------------------------------------------------------------------------
// Knowledge documents
// ---------------------------------------------------------------------------

async fn cmd_docs(config_path: Option<&Path>, user: &str) -> Result<()> {
    let config = resolve_config(config_path)?;
    let storage = open_storage_readonly(&config).await?;

    let docs = storage.list_documents(user).await?;
    if docs.is_empty() {
        println!("No knowledge documents for '{user}'.");
        return Ok(());
    }

    println!();
    for doc in &docs {
        println!(
            "  {}  {:<40} {:<6} {:>10} bytes  {}",
            doc.id, doc.name, doc.original_format, doc.size, doc.storage_path
        );
    }
    println!();

    Ok(())
}

async fn cmd_doc_add(
    config_path: Option<&Path>,
    user: &str,
    file: &Path,
    name: Option<&str>,
    format: Option<&str>,
) -> Result<()> {
    let user = require_user(user)?;
    let config = resolve_config(config_path)?;
    let blobs = fs_blob_store(&config)?;
    let storage = open_storage(&config).await?;

    let bytes = tokio::fs::read(file)
        .await
        .map_err(|e| eyre!("cannot read '{}': {e}", file.display()))?;

    let file_name = file
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| eyre!("'{}' has no file name", file.display()))?;
    let display_name = name.map(String::from).unwrap_or_else(|| file_name.clone());
    let original_format = format.map(String::from).unwrap_or_else(|| {
        file.extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_else(|| "txt".to_string())
    });

    let id = RecordId::new().to_string();
    let doc = KnowledgeDocument {
        storage_path: format!("{user}/{id}/{file_name}"),
        id,
        user_id: user.to_string(),
        name: display_name,
        original_format,
        size: bytes.len() as u64,
        uploaded_at: Utc::now(),
    };

    register_document(&storage, &blobs, &doc, &bytes).await?;

    info!(user, id = %doc.id, "registered knowledge document");
    println!("Added '{}' for '{user}' ({}).", doc.name, doc.id);
    Ok(())
}

async fn cmd_doc_remove(config_path: Option<&Path>, user: &str, id: &str) -> Result<()> {
    let user = require_user(user)?;
    let config = resolve_config(config_path)?;
    let storage = open_storage(&config).await?;

    let doc = storage
        .list_documents(user)
        .await?
        .into_iter()
        .find(|d| d.id == id)
        .ok_or_else(|| eyre!("no document '{id}' for user '{user}'"))?;

    let blobs = if config.blobs.backend == "fs" {
        Some(fs_blob_store(&config)?)
    } else {
        None
    };
    unregister_document(&storage, blobs.as_ref(), &doc).await?;

    info!(user, id, "removed knowledge document");
    println!("Removed '{}' ({id}).", doc.name);
    Ok(())
}

/// Write the blob, then the descriptor. A failed insert removes the blob again.
async fn register_document(
    storage: &Storage,
    blobs: &FsBlobStore,
    doc: &KnowledgeDocument,
    bytes: &[u8],
) -> Result<()> {
    blobs.store(&doc.storage_path, bytes).await?;

    if let Err(e) = storage.insert_document(doc).await {
        if let Err(cleanup) = blobs.remove(&doc.storage_path).await {
            tracing::warn!(path = %doc.storage_path, error = %cleanup, "failed to remove orphaned blob");
        }
        return Err(e.into());
    }
    Ok(())
}

/// Delete the blob, then the descriptor, so a failed blob delete keeps the row.
async fn unregister_document(
    storage: &Storage,
    blobs: Option<&FsBlobStore>,
    doc: &KnowledgeDocument,
) -> Result<()> {
    if let Some(blobs) = blobs {
        if !blobs.remove(&doc.storage_path).await? {
            tracing::warn!(path = %doc.storage_path, "blob was already missing");
        }
    }
    storage.delete_document(&doc.id).await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = resolve_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
