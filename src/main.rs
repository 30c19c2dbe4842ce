mod ai;
mod config;
mod expiry;
mod inventory;
mod offline;
mod service;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;
use url::Url;

use crate::ai::ModelClient;
use crate::config::Config;
use crate::inventory::{Item, ItemStatus, ItemStore, StorageMethod};
use crate::offline::{
  spawn_update_checker, CacheStore, FetchDecision, FetchRequest, Fetcher, HttpFetcher,
  OfflineController, SqliteCacheStore,
};
use crate::service::{ItemDraft, ItemService};

#[derive(Parser, Debug)]
#[command(name = "ecofridge")]
#[command(about = "Offline-first household food inventory tracker")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/ecofridge/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// List inventory items, soonest expiry first
  List {
    /// Include consumed and discarded items
    #[arg(long)]
    all: bool,
    /// Filter by storage method
    #[arg(long)]
    storage: Option<StorageMethod>,
  },
  /// Add an item
  Add {
    name: String,
    #[arg(long)]
    category: Option<String>,
    #[arg(long, default_value = "fridge")]
    storage: StorageMethod,
    #[arg(long, default_value_t = 1)]
    quantity: i64,
    /// Expiry date (YYYY-MM-DD); estimated from the category when omitted
    #[arg(long)]
    expiry: Option<NaiveDate>,
    #[arg(long)]
    memo: Option<String>,
  },
  /// Consume an item, entirely or by quantity
  Consume {
    /// Item id or name fragment
    item: String,
    /// Number of units consumed (default: all of them)
    #[arg(long)]
    quantity: Option<i64>,
  },
  /// Discard a spoiled or expired item
  Discard {
    /// Item id or name fragment
    item: String,
  },
  /// Move an item to another storage method, rescaling its expiry date
  Move {
    /// Item id or name fragment
    item: String,
    to: StorageMethod,
  },
  /// Interpret a natural-language command against the inventory
  Tell { utterance: String },
  /// Extract items from a receipt or product photo
  Scan { image: PathBuf },
  /// Precache the app shell and keep checking for updates
  Shell,
  /// Route one request through the offline controller
  Fetch {
    path: String,
    /// Treat the request as a top-level navigation
    #[arg(long)]
    navigate: bool,
  },
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();
  let _log_guard = init_tracing(&args.command)?;
  let today = Local::now().date_naive();

  match args.command {
    Command::List { all, storage } => {
      let service = ItemService::new(ItemStore::open()?);
      let status = if all { None } else { Some(ItemStatus::Active) };
      let mut items = service.list(status)?;
      if let Some(method) = storage {
        items.retain(|item| item.storage_method == method);
      }
      print_items(&items);
    }
    Command::Add {
      name,
      category,
      storage,
      quantity,
      expiry,
      memo,
    } => {
      let service = ItemService::new(ItemStore::open()?);
      let item = service.add(
        ItemDraft {
          name,
          category,
          storage_method: storage,
          quantity,
          expiry_date: expiry,
          is_estimated: false,
          image_url: None,
          memo,
        },
        today,
      )?;
      print_items(&[item]);
    }
    Command::Consume { item, quantity } => {
      let service = ItemService::new(ItemStore::open()?);
      let target = service.resolve(&item)?;
      let updated = service.consume(&target.id, quantity, quantity.is_none())?;
      println!(
        "{}: {} left ({})",
        updated.name, updated.quantity, updated.status
      );
    }
    Command::Discard { item } => {
      let service = ItemService::new(ItemStore::open()?);
      let target = service.resolve(&item)?;
      let updated = service.discard(&target.id)?;
      println!("{}: {}", updated.name, updated.status);
    }
    Command::Move { item, to } => {
      let service = ItemService::new(ItemStore::open()?);
      let target = service.resolve(&item)?;
      let updated = service.relocate(&target.id, to, today)?;
      println!(
        "{}: {} → {}, expires {}",
        updated.name,
        target.storage_method.label(),
        updated.storage_method.label(),
        updated.expiry_date
      );
    }
    Command::Tell { utterance } => {
      let config = Config::load(args.config.as_deref())?;
      let service = ItemService::new(ItemStore::open()?);
      let client = ModelClient::new(Config::get_api_key()?, config.ai.model)?;

      let inventory = service.active_items()?;
      let commands = ai::interpret_voice_command(&client, today, &inventory, &utterance).await?;
      let results = service.apply_commands(&commands, today);

      for result in &results {
        let name = result.item_name.as_deref().unwrap_or("알 수 없음");
        if result.success {
          println!("✓ {} {}", result.action.as_str(), name);
        } else {
          println!(
            "✗ {} {}: {}",
            result.action.as_str(),
            name,
            result.error.as_deref().unwrap_or("unknown error")
          );
        }
      }
    }
    Command::Scan { image } => {
      let config = Config::load(args.config.as_deref())?;
      let service = ItemService::new(ItemStore::open()?);
      let client = ModelClient::new(Config::get_api_key()?, config.ai.model)?;

      let bytes = std::fs::read(&image)
        .map_err(|e| eyre!("Failed to read image {}: {}", image.display(), e))?;
      let scan = ai::scan_image(
        &client,
        today,
        &expiry::ExpiryTable::default(),
        &bytes,
        mime_type_for(&image),
      )
      .await?;
      let added = service.import_scanned(scan, today)?;
      print_items(&added);
    }
    Command::Shell => {
      let config = Config::load(args.config.as_deref())?;
      run_shell(&config).await?;
    }
    Command::Fetch { path, navigate } => {
      let config = Config::load(args.config.as_deref())?;
      run_fetch(&config, &path, navigate).await?;
    }
  }

  Ok(())
}

/// Precache the app shell, then keep the update checker running until
/// interrupted.
async fn run_shell(config: &Config) -> Result<()> {
  let controller = Arc::new(build_controller(config)?);

  controller.install().await?;
  controller.activate().await?;

  let interval = Duration::from_secs(config.offline.update_interval_minutes * 60);
  let checker = spawn_update_checker(Arc::clone(&controller), interval);

  info!("app shell cached; press Ctrl-C to stop");
  tokio::signal::ctrl_c().await?;
  checker.abort();

  Ok(())
}

/// Route a single request through the controller and report the outcome.
async fn run_fetch(config: &Config, path: &str, navigate: bool) -> Result<()> {
  let controller = build_controller(config)?;
  controller.activate().await?;

  let origin = Url::parse(&config.server.url)
    .map_err(|e| eyre!("Invalid server url {}: {}", config.server.url, e))?;
  let url = origin
    .join(path)
    .map_err(|e| eyre!("Invalid path {}: {}", path, e))?;
  let request = if navigate {
    FetchRequest::navigate(url)
  } else {
    FetchRequest::get(url)
  };

  match controller.handle_fetch(&request).await? {
    FetchDecision::NotHandled => println!("not intercepted; request passes through"),
    FetchDecision::Respond(response) => {
      println!("{} ({} bytes)", response.status, response.body.len());
    }
  }

  Ok(())
}

fn build_controller(config: &Config) -> Result<OfflineController> {
  let origin = Url::parse(&config.server.url)
    .map_err(|e| eyre!("Invalid server url {}: {}", config.server.url, e))?;
  let store = Arc::new(SqliteCacheStore::open()?) as Arc<dyn CacheStore>;
  let fetcher = Arc::new(HttpFetcher::new()?) as Arc<dyn Fetcher>;

  Ok(OfflineController::new(
    config.offline.cache_version.clone(),
    origin,
    store,
    fetcher,
  ))
}

fn print_items(items: &[Item]) {
  if items.is_empty() {
    println!("no items");
    return;
  }

  println!(
    "{:<36}  {:<16} {:<12} {:<6} {:<12} {:>4}",
    "ID", "NAME", "CATEGORY", "WHERE", "EXPIRY", "QTY"
  );
  for item in items {
    let expiry = if item.is_estimated {
      format!("~{}", item.expiry_date)
    } else {
      item.expiry_date.to_string()
    };
    println!(
      "{:<36}  {:<16} {:<12} {:<6} {:<12} {:>4}",
      item.id,
      item.name,
      item.category.as_deref().unwrap_or("-"),
      item.storage_method.label(),
      expiry,
      item.quantity
    );
  }
}

fn mime_type_for(path: &std::path::Path) -> &'static str {
  match path
    .extension()
    .and_then(|e| e.to_str())
    .map(|e| e.to_ascii_lowercase())
    .as_deref()
  {
    Some("png") => "image/png",
    Some("webp") => "image/webp",
    Some("gif") => "image/gif",
    _ => "image/jpeg",
  }
}

/// Long-running shell mode logs to a rolling file; everything else logs to
/// stderr.
fn init_tracing(
  command: &Command,
) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

  if matches!(command, Command::Shell) {
    let dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?
      .join("ecofridge")
      .join("logs");
    std::fs::create_dir_all(&dir)
      .map_err(|e| eyre!("Failed to create log directory: {}", e))?;

    let appender = tracing_appender::rolling::daily(dir, "ecofridge.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
      .with_env_filter(filter)
      .with_writer(writer)
      .with_ansi(false)
      .init();
    Ok(Some(guard))
  } else {
    tracing_subscriber::fmt()
      .with_env_filter(filter)
      .with_writer(std::io::stderr)
      .init();
    Ok(None)
  }
}
