//! `config-store`: inspect and edit a persisted configuration tree.
//!
//! # Overview
//!
//! ```text
//!   settings.toml ──▶ StoreSettings ──▶ logging, storage path, locale
//!
//!   command ──▶ ConfigStore (load) ──▶ mutate live tree
//!                     │
//!                     ▼
//!               write_config: diff against persisted copy
//!                     │
//!          ┌──────────┴──────────┐
//!          ▼                     ▼
//!   ChannelListener        persisted JSON file
//!   (localized output)
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tokio::sync::mpsc;

use config_store::config::loader::load_settings;
use config_store::config::{default_root, ConfigContainer, ConfigValue, StoreSettings};
use config_store::locale::{available_locales, LocaleStore};
use config_store::observability::logging::init_logging;
use config_store::persistence::watcher::FileWatcher;
use config_store::store::{ChannelListener, ConfigEvent, ConfigStore};

#[derive(Parser)]
#[command(name = "config-store")]
#[command(about = "Inspect and edit a persisted configuration tree", long_about = None)]
struct Cli {
    /// Settings file (TOML)
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Persisted configuration file, overrides the settings file
    #[arg(short, long)]
    file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every setting with its flags
    Show,
    /// Print one setting (dotted path)
    Get { path: String },
    /// Change one setting (dotted path) and save
    Set { path: String, value: String },
    /// Print or write the configuration as JSON
    Export { output: Option<PathBuf> },
    /// Merge a previously exported JSON file and save
    Import { file: PathBuf },
    /// Restore defaults
    Reset,
    /// Show or change the active language
    Locale { tag: Option<String> },
    /// Follow changes made to the persisted file by other processes
    Watch,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let settings = match &cli.settings {
        Some(path) => load_settings(path)?,
        None => StoreSettings::default(),
    };
    init_logging(&settings.logging);

    let path = cli
        .file
        .clone()
        .unwrap_or_else(|| PathBuf::from(&settings.storage.path));

    let (listener, mut events) = ChannelListener::new();
    let mut store = ConfigStore::builder(default_root)
        .fallback_locale(settings.locale.fallback.clone())
        .listener(listener)
        .load_from_path(&path)?;

    let lang_dir = PathBuf::from(&settings.locale.lang_dir);
    let mut locale = load_locale(&lang_dir, store.locale());

    tracing::debug!(path = ?path, locale = %store.locale(), "Store ready");

    match cli.command {
        Commands::Show => print_tree(store.root(), ""),
        Commands::Get { path: key } => {
            let property = store.root().lookup(&key)?;
            println!("{}", property.value);
        }
        Commands::Set { path: key, value } => {
            store.root_mut().set_path_str(&key, &value)?;
            let report = store.write_config()?;
            if !report.config_changed() {
                println!("{}", locale.get("cli.unchanged"));
            }
            print_events(&mut events, &locale);
        }
        Commands::Export { output } => {
            let exported = store.export_to_string();
            match output {
                Some(out) => {
                    fs::write(&out, exported)?;
                    let shown = out.display().to_string();
                    println!("{}", locale.format("cli.saved", &[("path", shown.as_str())]));
                }
                None => println!("{}", exported),
            }
        }
        Commands::Import { file } => {
            let text = fs::read_to_string(&file)?;
            store.load_from_string(&text)?;
            let shown = file.display().to_string();
            println!("{}", locale.format("cli.imported", &[("file", shown.as_str())]));
            print_events(&mut events, &locale);
        }
        Commands::Reset => {
            store.reset()?;
            println!("{}", locale.get("cli.reset"));
        }
        Commands::Locale { tag: None } => {
            println!("{}", store.locale());
            match available_locales(&lang_dir) {
                Ok(tags) => println!("available: {}", tags.join(", ")),
                Err(e) => tracing::warn!(error = %e, "Cannot list languages"),
            }
        }
        Commands::Locale { tag: Some(tag) } => {
            store.set_locale(&tag)?;
            store.write_config()?;
            locale = load_locale(&lang_dir, store.locale());
            println!("{}", locale.format("cli.locale_set", &[("locale", tag.as_str())]));
        }
        Commands::Watch => watch(&mut store, &path, &mut events, &locale).await?,
    }

    Ok(())
}

async fn watch(
    store: &mut ConfigStore,
    path: &Path,
    events: &mut mpsc::UnboundedReceiver<ConfigEvent>,
    locale: &LocaleStore,
) -> Result<(), Box<dyn std::error::Error>> {
    let (watcher, mut changes) = FileWatcher::new(path);
    let _watcher = watcher.run()?;

    let shown = path.display().to_string();
    println!("{}", locale.format("cli.watching", &[("path", shown.as_str())]));

    loop {
        tokio::select! {
            Some(_) = changes.recv() => {
                match store.reload() {
                    Ok(report) if report.config_changed() => print_events(events, locale),
                    Ok(_) => {}
                    Err(e) => tracing::error!(error = %e, "Reload failed"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Stopping watch");
                break;
            }
        }
    }

    Ok(())
}

fn load_locale(dir: &Path, tag: &str) -> LocaleStore {
    LocaleStore::load_from_dir(dir, tag).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Translations unavailable, printing message keys");
        LocaleStore::new()
    })
}

fn print_events(events: &mut mpsc::UnboundedReceiver<ConfigEvent>, locale: &LocaleStore) {
    while let Ok(event) = events.try_recv() {
        let key = format!("notifications.{}", event.as_str());
        println!("{}", locale.get(&key));
    }
}

fn print_tree(container: &ConfigContainer, prefix: &str) {
    if container.has_global_state() {
        let state = container
            .global_state()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "null".to_string());
        println!("{}_global_state = {}", prefix, state);
    }

    for property in container.properties() {
        let path = format!("{}{}", prefix, property.name());
        let flags = property.key.flags;
        match &property.value {
            ConfigValue::Container(child) => {
                if flags.is_empty() {
                    println!("[{}]", path);
                } else {
                    println!("[{}] {}", path, flags);
                }
                print_tree(child, &format!("{}.", path));
            }
            value if flags.is_empty() => println!("{} = {}", path, value),
            value => println!("{} = {} ({})", path, value, flags),
        }
    }
}
