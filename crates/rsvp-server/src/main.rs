//! rsvp-server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens an
//! in-process SQLite store, and serves the RSVP API over HTTP.
//!
//! # Password hash generation
//!
//! To generate the argon2 PHC string for `auth_password_hash` in config.toml:
//!
//! ```
//! cargo run -p rsvp-server -- --hash-password
//! ```
//!
//! # Loading events
//!
//! ```
//! cargo run -p rsvp-server -- --import-events events.json
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use clap::Parser;
use rand_core::OsRng;
use rsvp_api::AppState;
use rsvp_server::{
  Live,
  identity::HttpIdentityProvider,
  import::import_events,
  mail::{LogChannel, Mailer, ResendChannel},
  settings::{MailChannel, ServerConfig},
};
use rsvp_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "RSVP and ticketing server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a password entered on stdin and exit.
  #[arg(long)]
  hash_password: bool,

  /// Load events from a JSON file into the store and exit.
  #[arg(long, value_name = "FILE")]
  import_events: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Helper mode: hash a password and exit.
  if cli.hash_password {
    let password = rpassword_or_stdin()?;
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?
      .to_string();
    println!("{hash}");
    return Ok(());
  }

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("RSVP"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Expand `~` in store path.
  let store_path = expand_tilde(&server_cfg.store_path);

  // Open SQLite store.
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  // Helper mode: import events and exit.
  if let Some(file) = cli.import_events {
    let count = import_events(&store, &file)
      .await
      .with_context(|| format!("failed to import events from {}", file.display()))?;
    tracing::info!("Imported {count} events");
    return Ok(());
  }

  let identity = HttpIdentityProvider::new(
    server_cfg.identity_base_url.clone(),
    server_cfg.identity_secret_key.clone(),
  )
  .context("failed to configure identity provider")?;

  let mailer = match server_cfg.mail_channel {
    MailChannel::Log => {
      tracing::warn!("mail_channel = \"log\": ticket emails will not be sent");
      Mailer::Log(LogChannel)
    }
    MailChannel::Resend => Mailer::Resend(
      ResendChannel::new(
        server_cfg.mail_api_url.clone(),
        server_cfg.mail_api_key.clone(),
        server_cfg.mail_from.clone(),
      )
      .context("failed to configure mail channel")?,
    ),
  };

  let api_config = server_cfg.api_config().context("invalid configuration")?;

  // Build application state.
  let state = AppState::<Live>::new(
    Arc::new(store),
    Arc::new(identity),
    Arc::new(mailer),
    api_config,
  );

  let app = rsvp_api::router(state);
  let address = server_cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Read a password from stdin.
fn rpassword_or_stdin() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  let stdin = io::stdin();
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  stdin.lock().read_line(&mut line)?;
  Ok(
    line
      .trim_end_matches('\n')
      .trim_end_matches('\r')
      .to_string(),
  )
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
