//! `vstream` command-line entry point.
//!
//! Loads the config file, installs logging, and runs one subcommand:
//!
//! ```text
//! vstream publish --channel C [--key K] [--input PATH|-]
//! vstream watch   --channel C [--key K] --output PATH|-
//! vstream channels list | show ID | save --id ID --key K ... | remove ID
//! ```
//!
//! # Session lifetime (for beginners)
//!
//! `publish` and `watch` build a [`Session`], open it against the server, and
//! then simply wait on [`SessionHandle::closed`].  A background task listens
//! for Ctrl+C and asks the session to close; the session then stops its
//! timers, releases the media source or output file, and finishes.  The exit
//! status is non-zero when the session ended because of a failure (the
//! handshake never succeeded or the connection broke).
//!
//! When `--key` is omitted the key is looked up in the channel store, which
//! `vstream channels save` fills.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use vstream_client::application::session::{
    Session, SessionError, SessionHandle, SessionObserver, SessionReport,
};
use vstream_client::infrastructure::capture::{file::input_path, FileMediaSource};
use vstream_client::infrastructure::network::WsConnector;
use vstream_client::infrastructure::playback::FileSurface;
use vstream_client::infrastructure::storage::channels::{ChannelStore, ControlledChannel};
use vstream_client::infrastructure::storage::config::{
    load_config, load_config_from, AppConfig, ConfigError,
};
use vstream_core::{session_url, PreviewsConfig, ResolutionList, Role, SessionId};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Publish or watch a VStream live channel.
#[derive(Debug, Parser)]
#[command(name = "vstream", about = "VStream live streaming client", version)]
struct Cli {
    /// Config file to use instead of the platform default.
    ///
    /// The channel store is kept next to it as `channels.toml`.
    #[arg(long, global = true, env = "VSTREAM_CONFIG")]
    config: Option<PathBuf>,

    /// WebSocket base URL of the server, e.g. `wss://live.example.com`.
    #[arg(long, global = true, env = "VSTREAM_SERVER")]
    server: Option<String>,

    /// Log level when `RUST_LOG` is not set.
    #[arg(long, global = true, env = "VSTREAM_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Stream media from a file or standard input to a channel.
    Publish(PublishArgs),
    /// Receive a channel's live stream into a file or standard output.
    Watch(WatchArgs),
    /// Manage the stored channel credentials.
    #[command(subcommand)]
    Channels(ChannelsCommand),
}

#[derive(Debug, Args)]
struct PublishArgs {
    #[arg(long)]
    channel: String,

    /// Streaming key; looked up in the channel store when omitted.
    #[arg(long, env = "VSTREAM_KEY")]
    key: Option<String>,

    /// Media input; `-` or omitted reads standard input.
    #[arg(long, short)]
    input: Option<PathBuf>,

    /// Milliseconds between sent segments.
    #[arg(long)]
    cadence_ms: Option<u64>,
}

#[derive(Debug, Args)]
struct WatchArgs {
    #[arg(long)]
    channel: String,

    /// Channel key; looked up in the channel store when omitted.
    #[arg(long, env = "VSTREAM_KEY")]
    key: Option<String>,

    /// Where to write the received stream; `-` writes standard output.
    #[arg(long, short)]
    output: PathBuf,
}

#[derive(Debug, Subcommand)]
enum ChannelsCommand {
    /// List stored channels.
    List,
    /// Print one stored channel as JSON.
    Show { id: String },
    /// Add or replace a stored channel.
    Save {
        #[arg(long)]
        id: String,
        #[arg(long)]
        key: String,
        /// Record the live stream as VOD.
        #[arg(long)]
        record: bool,
        /// Transcoding targets, e.g. `ORIGINAL,1280x720-30`.
        #[arg(long, default_value = "")]
        resolutions: String,
        /// Preview images, `WIDTHxHEIGHT,DELAY` or `false`.
        #[arg(long, default_value = "false")]
        previews: String,
    },
    /// Remove a stored channel.
    Remove { id: String },
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let loaded = match cli.config.as_deref() {
        Some(path) => load_config_from(path),
        None => load_config(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(ConfigError::NoPlatformConfigDir) => AppConfig::default(),
        Err(e) => return Err(e).context("failed to load configuration"),
    };

    // Initialise structured logging: RUST_LOG, then --log-level / config.
    let level = cli.log_level.as_deref().unwrap_or(&config.logging.log_level);
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
        }))
        .with_writer(std::io::stderr)
        .init();

    let store = channel_store(cli.config.as_deref())?;
    let ws_base = cli.server.unwrap_or_else(|| config.server.ws_base_url.clone());

    match cli.command {
        Command::Publish(args) => publish(args, &config, &store, &ws_base).await,
        Command::Watch(args) => watch(args, &config, &store, &ws_base).await,
        Command::Channels(command) => channels(command, &store),
    }
}

fn channel_store(config_path: Option<&Path>) -> anyhow::Result<ChannelStore> {
    match config_path {
        Some(path) => Ok(ChannelStore::new(path.with_file_name("channels.toml"))),
        None => ChannelStore::open_default().context("failed to locate the channel store"),
    }
}

// ── Sessions ──────────────────────────────────────────────────────────────────

async fn publish(
    args: PublishArgs,
    config: &AppConfig,
    store: &ChannelStore,
    ws_base: &str,
) -> anyhow::Result<()> {
    let key = resolve_key(&args.channel, args.key, store)?;
    let mut settings = config.session.clone();
    if let Some(cadence_ms) = args.cadence_ms {
        settings.capture_interval_ms = cadence_ms;
    }

    let url = session_url(ws_base, &args.channel, &key, Role::Publish)?;
    let input = input_path(args.input);
    let source = FileMediaSource::open(&input, settings.capture_chunk_bytes)
        .with_context(|| format!("failed to open media input {}", input.display()))?;

    info!("publishing {} to channel '{}'", source.label(), args.channel);
    let session = Session::publish(
        args.channel,
        key,
        settings.to_session_config(),
        Box::new(source),
    )
    .with_observer(LogObserver);

    let report = run_until_closed(session.open(Arc::new(WsConnector::new()), url)).await?;
    finish(report)
}

async fn watch(
    args: WatchArgs,
    config: &AppConfig,
    store: &ChannelStore,
    ws_base: &str,
) -> anyhow::Result<()> {
    let key = resolve_key(&args.channel, args.key, store)?;
    let url = session_url(ws_base, &args.channel, &key, Role::Watch)?;

    let mut surface = FileSurface::create(&args.output)
        .with_context(|| format!("failed to create {}", args.output.display()))?;
    let writer = surface.take_writer();

    info!("watching channel '{}' into {}", args.channel, args.output.display());
    let session = Session::watch(
        args.channel,
        key,
        config.session.to_session_config(),
        Box::new(surface),
    )
    .with_observer(LogObserver);

    let report = run_until_closed(session.open(Arc::new(WsConnector::new()), url)).await?;
    if let Some(writer) = writer {
        writer.await.context("playback writer task failed")?;
    }
    if let Some(buffer) = &report.retained_buffer {
        info!("{}: retained {} bytes", report.id, buffer.len());
    }
    finish(report)
}

/// Waits for the session to close, closing it on Ctrl+C.
async fn run_until_closed(handle: SessionHandle) -> anyhow::Result<SessionReport> {
    let controller = handle.controller();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            controller.close();
        }
    });

    let report = handle.closed().await;
    ctrl_c.abort();
    Ok(report?)
}

fn finish(report: SessionReport) -> anyhow::Result<()> {
    match report.failure {
        Some(error) if error.is_fatal() => bail!("{}: {error}", report.id),
        _ => {
            info!("{}: finished", report.id);
            Ok(())
        }
    }
}

fn resolve_key(channel: &str, key: Option<String>, store: &ChannelStore) -> anyhow::Result<String> {
    if let Some(key) = key {
        return Ok(key);
    }
    match store.get(channel) {
        Some(stored) => Ok(stored.key),
        None => bail!(
            "no key for channel '{channel}': pass --key or run `vstream channels save`"
        ),
    }
}

/// Logs session lifecycle notifications.
struct LogObserver;

impl SessionObserver for LogObserver {
    fn on_opened(&mut self, id: &SessionId) {
        info!("{id}: connected");
    }

    fn on_error(&mut self, id: &SessionId, error: &SessionError) {
        warn!("{id}: {error}");
    }

    fn on_closed(&mut self, id: &SessionId) {
        info!("{id}: closed");
    }
}

// ── Channel store commands ────────────────────────────────────────────────────

fn channels(command: ChannelsCommand, store: &ChannelStore) -> anyhow::Result<()> {
    match command {
        ChannelsCommand::List => {
            for channel in store.get_all() {
                println!(
                    "{}\trecord={}\tresolutions={}\tpreviews={}",
                    channel.id,
                    channel.record,
                    channel.resolutions,
                    channel.previews.encode()
                );
            }
        }
        ChannelsCommand::Show { id } => {
            let channel = store
                .get(&id)
                .with_context(|| format!("channel '{id}' is not stored"))?;
            println!("{}", serde_json::to_string_pretty(&channel)?);
        }
        ChannelsCommand::Save {
            id,
            key,
            record,
            resolutions,
            previews,
        } => {
            let channel = ControlledChannel {
                id,
                key,
                record,
                resolutions: ResolutionList::decode(&resolutions),
                previews: PreviewsConfig::decode(&previews),
            };
            info!("saving channel '{}' to {}", channel.id, store.path().display());
            store.upsert(channel)?;
        }
        ChannelsCommand::Remove { id } => {
            if !store.remove(&id)? {
                warn!("channel '{id}' was not stored");
            }
        }
    }
    Ok(())
}
