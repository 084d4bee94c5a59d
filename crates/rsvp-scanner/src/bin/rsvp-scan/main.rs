//! `rsvp-scan`: door-side ticket scanner.
//!
//! Reads ticket images, decodes the first valid ticket, and submits it to the
//! RSVP server for admission.
//!
//! # Usage
//!
//! ```
//! rsvp-scan --url http://localhost:8080 --user door --password secret ticket.png
//! rsvp-scan --offline screenshot-1.jpg screenshot-2.jpg
//! ```

mod client;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use client::{AdmissionClient, ClientConfig, Verdict};
use rsvp_core::claim::ScanClaim;
use rsvp_scanner::{DeviceError, ImageFileSource, ScanHandler, Scanner, StopReason};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, filter::LevelFilter};
use uuid::Uuid;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "rsvp-scan", about = "Scan RSVP tickets at the door")]
struct Args {
  /// Image files to scan, in order. Scanning stops at the first valid ticket.
  #[arg(required = true, value_name = "IMAGE")]
  images: Vec<PathBuf>,

  /// Path to a TOML config file (url, username, password, event_id).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the RSVP server (default: http://localhost:8080).
  #[arg(long, env = "RSVP_URL")]
  url: Option<String>,

  /// Organizer username.
  #[arg(long, env = "RSVP_USER")]
  user: Option<String>,

  /// Organizer password (plaintext).
  #[arg(long, env = "RSVP_PASSWORD")]
  password: Option<String>,

  /// Only admit tickets for this event.
  #[arg(long, env = "RSVP_EVENT")]
  event: Option<Uuid>,

  /// Print the decoded ticket without contacting the server.
  #[arg(long)]
  offline: bool,
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:      String,
  #[serde(default)]
  username: String,
  #[serde(default)]
  password: String,
  #[serde(default)]
  event_id: Option<Uuid>,
}

// ─── Handler ──────────────────────────────────────────────────────────────────

/// Prints scan progress to stderr and keeps the claim.
#[derive(Default)]
struct Door {
  claim: Option<ScanClaim>,
}

impl ScanHandler for Door {
  fn on_scan(&mut self, claim: ScanClaim) { self.claim = Some(claim); }

  fn on_decode_error(&mut self, message: &str) { eprintln!("skipped: {message}"); }

  fn on_device_error(&mut self, error: &DeviceError) { eprintln!("error: {error}"); }
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();

  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  let cancel = CancellationToken::new();
  let on_interrupt = cancel.clone();
  tokio::spawn(async move {
    if tokio::signal::ctrl_c().await.is_ok() {
      on_interrupt.cancel();
    }
  });

  let scanner = Scanner::new();
  let session = scanner.session(ImageFileSource::new(args.images))?;
  let mut door = Door::default();
  let reason = session.run(&mut door, cancel).await;

  let claim = match (reason, door.claim) {
    (StopReason::Scanned, Some(claim)) => claim,
    (StopReason::Cancelled, _) => bail!("scan cancelled"),
    (StopReason::DeviceFailed, _) => bail!("could not read the images"),
    _ => bail!("no valid ticket found"),
  };

  println!("ticket:  {}", claim.ticket_id);
  println!("event:   {}", claim.event_title);
  println!("name:    {}", claim.user_name);
  println!("date:    {}", claim.event_date);

  if args.offline {
    return Ok(());
  }

  // CLI flags override config file, which overrides defaults.
  let config = ClientConfig {
    base_url: args
      .url
      .or_else(|| (!file_cfg.url.is_empty()).then(|| file_cfg.url.clone()))
      .unwrap_or_else(|| "http://localhost:8080".to_string()),
    username: args
      .user
      .or_else(|| (!file_cfg.username.is_empty()).then(|| file_cfg.username.clone()))
      .unwrap_or_default(),
    password: args
      .password
      .or_else(|| (!file_cfg.password.is_empty()).then(|| file_cfg.password.clone()))
      .unwrap_or_default(),
  };
  let event_id = args.event.or(file_cfg.event_id);

  match AdmissionClient::new(config)?.admit(&claim, event_id).await? {
    Verdict::Admitted(receipt) => {
      println!(
        "ADMITTED {} at {}",
        receipt.reservation.user.display_name(),
        receipt.admission.admitted_at.format("%H:%M:%S")
      );
      Ok(())
    }
    Verdict::Rejected { kind, error } => bail!("REJECTED ({kind}): {error}"),
  }
}
