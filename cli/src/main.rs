//! `prefs`: inspect and edit consent preferences from a terminal.
//!
//! Both storage mechanisms live in one JSON state file between runs. Each run
//! builds a headless form from the configured categories, constructs a
//! manager over the state file's stores, applies the subcommand, prints the
//! persisted list, and writes the state file back.

use std::cell::RefCell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use clap::{Parser, Subcommand, ValueEnum};
use privacy_prefs::{
    Backends, Category, FormControls, MemoryCookieJar, MemoryForm, MemoryStorage, Options, PreferenceError,
    PreferenceManager, Settings,
};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("invalid JSON in {path}: {source}")]
    InvalidJson { path: PathBuf, source: serde_json::Error },
    #[error("failed to render JSON: {0}")]
    Render(#[from] serde_json::Error),
    #[error("expected <name>=<true|false>, got `{0}`")]
    InvalidToggle(String),
    #[error("no category named `{0}`")]
    UnknownCategory(String),
    #[error(transparent)]
    Preferences(#[from] PreferenceError),
}

#[derive(Parser, Debug)]
#[command(name = "prefs", about = "Inspect and edit persisted consent preferences")]
struct Cli {
    /// JSON file holding the cookie jar and local storage between runs.
    #[arg(long, env = "PREFS_STATE", default_value = "prefs-state.json")]
    state: PathBuf,

    /// Settings document (camelCase JSON) with categories and options.
    #[arg(long, env = "PREFS_SETTINGS")]
    settings: Option<PathBuf>,

    /// Override the backend chosen by the settings.
    #[arg(long, value_enum)]
    backend: Option<Backend>,

    #[arg(long, env = "PREFS_STORAGE_KEY")]
    storage_key: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Backend {
    Cookie,
    Local,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the stored preferences.
    Show,
    /// Toggle categories (`name=true`, `name=off`, ...) and submit.
    Set {
        #[arg(required = true)]
        toggles: Vec<String>,
    },
    /// Reset every category to its default.
    Restore,
}

#[derive(Default, Serialize, Deserialize)]
struct StateFile {
    #[serde(default)]
    cookies: MemoryCookieJar,
    #[serde(default)]
    local: MemoryStorage,
}

fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt().with_writer(io::stderr).init();
    let cli = Cli::parse();

    let settings = match &cli.settings {
        Some(path) => Settings::from_json(&read(path)?)
            .map_err(|source| CliError::InvalidJson { path: path.clone(), source })?,
        None => Settings::default(),
    };
    let state = load_state(&cli.state)?;
    let cookies = Rc::new(RefCell::new(state.cookies));
    let local = Rc::new(RefCell::new(state.local));

    let options = build_options(settings, cli.backend, cli.storage_key);
    let backends = Backends::new(Rc::clone(&cookies), Rc::clone(&local));
    let mut manager = PreferenceManager::new(options, backends)?;

    match cli.command {
        Command::Show => {}
        Command::Set { toggles } => {
            for raw in &toggles {
                let (name, checked) = parse_toggle(raw)?;
                if !manager.form_mut().set_checked(name, checked) {
                    return Err(CliError::UnknownCategory(name.to_owned()));
                }
            }
            manager.update_preferences(None)?;
        }
        Command::Restore => manager.restore_defaults()?,
    }

    println!("{}", serde_json::to_string_pretty(&manager.stored_preferences()?)?);
    drop(manager);

    let state = StateFile { cookies: cookies.borrow().clone(), local: local.borrow().clone() };
    save_state(&cli.state, &state)
}

/// Options over `settings` with CLI overrides, a headless form holding one
/// control per category, and handlers that log each dispatch.
fn build_options(settings: Settings, backend: Option<Backend>, storage_key: Option<String>) -> Options<MemoryForm> {
    let mut options = Options::<MemoryForm>::from(settings);
    if let Some(backend) = backend {
        options = options.save_as_cookie(backend == Backend::Cookie);
    }
    if let Some(key) = storage_key {
        options = options.storage_key(key);
    }

    let categories: Vec<Category> = options
        .categories
        .take()
        .unwrap_or_default()
        .into_iter()
        .map(|category| {
            category.on_action(|record| info!(name = %record.name, checked = record.checked, "category dispatched"))
        })
        .collect();
    let form = categories
        .iter()
        .fold(MemoryForm::new(), |form, category| form.with_control(category.name.clone(), category.checked));

    options.categories(categories).form(form)
}

/// Parse `name=value` where value is `true/false`, `on/off`, `yes/no` or `1/0`.
fn parse_toggle(raw: &str) -> Result<(&str, bool), CliError> {
    let invalid = || CliError::InvalidToggle(raw.to_owned());
    let (name, value) = raw.split_once('=').ok_or_else(invalid)?;
    let name = name.trim();
    if name.is_empty() {
        return Err(invalid());
    }
    let checked = match value.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => true,
        "false" | "off" | "no" | "0" => false,
        _ => return Err(invalid()),
    };
    Ok((name, checked))
}

fn read(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|source| CliError::Read { path: path.to_owned(), source })
}

/// A missing state file is an empty state.
fn load_state(path: &Path) -> Result<StateFile, CliError> {
    if !path.exists() {
        return Ok(StateFile::default());
    }
    serde_json::from_str(&read(path)?).map_err(|source| CliError::InvalidJson { path: path.to_owned(), source })
}

fn save_state(path: &Path, state: &StateFile) -> Result<(), CliError> {
    let raw = serde_json::to_string_pretty(state)?;
    fs::write(path, raw).map_err(|source| CliError::Write { path: path.to_owned(), source })
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
