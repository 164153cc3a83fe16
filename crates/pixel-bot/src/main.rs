//! Idle Pixel wiki bot
//!
//! Logs in, holds a websocket session to the game server and answers chat
//! commands. Reconnects on its own until SIGTERM or Ctrl+C.

use anyhow::{bail, Context, Result};
use clap::Parser;
use pixel_bot::config::Config;
use pixel_bot::context::{BotState, Settings};
use pixel_bot::dispatcher::Gates;
use pixel_bot::flags::RuntimeFlags;
use pixel_bot::handlers;
use pixel_bot::responder::Responder;
use pixel_bot::store::{AclStore, JsonFileBackend};
use pixel_bot::Bridge;
use pixel_types::{Callout, Decoder, Identity};
use pixel_ws::{
    HttpLogin, LoginError, Session, SignatureProvider, StaticSignature, SystemClock, WsConnector,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Idle Pixel wiki bot CLI
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/pixel-bot.toml")]
    config: String,

    /// Game server websocket URL (overrides config file)
    #[arg(long, env = "PIXEL_WS_URL")]
    ws_url: Option<String>,

    /// Account name for the website login (overrides config file)
    #[arg(long, env = "PIXEL_USERNAME")]
    username: Option<String>,

    /// Account password for the website login (overrides config file)
    #[arg(long, env = "PIXEL_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Pre-obtained LOGIN signature; skips the website login
    #[arg(long, env = "PIXEL_SIGNATURE", hide_env_values = true)]
    signature: Option<String>,

    /// Path of the JSON store (overrides config file)
    #[arg(long, env = "PIXEL_STORE_PATH")]
    store_path: Option<String>,
}

impl Args {
    fn apply(self, config: &mut Config) {
        if let Some(url) = self.ws_url {
            config.server.url = url;
        }
        if let Some(username) = self.username {
            config.login.username = Some(username);
        }
        if let Some(password) = self.password {
            config.login.password = Some(password);
        }
        if let Some(signature) = self.signature {
            config.login.signature = Some(signature);
        }
        if let Some(path) = self.store_path {
            config.bot.store_path = path;
        }
    }
}

/// Where the `LOGIN=` signature comes from for this run.
enum Login {
    Static(StaticSignature),
    Http(HttpLogin),
}

impl SignatureProvider for Login {
    async fn signature(&self) -> Result<String, LoginError> {
        match self {
            Login::Static(s) => s.signature().await,
            Login::Http(h) => h.signature().await,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pixel_bot=debug,pixel_ws=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Idle Pixel wiki bot");

    let args = Args::parse();

    let mut config = if std::path::Path::new(&args.config).exists() {
        info!("Loading config from file: {}", args.config);
        Config::from_file(&args.config)?
    } else {
        info!("Config file not found, loading from environment");
        Config::from_env()?
    };
    args.apply(&mut config);

    url::Url::parse(&config.bot.wiki_url)
        .with_context(|| format!("Invalid wiki url: {}", config.bot.wiki_url))?;

    let store = AclStore::load(JsonFileBackend::new(&config.bot.store_path))
        .with_context(|| format!("Failed to load store from {}", config.bot.store_path))?;

    let login = match config.login.signature.clone().filter(|s| !s.is_empty()) {
        Some(signature) => {
            info!("Using configured login signature");
            Login::Static(StaticSignature::new(signature))
        }
        None => {
            let Some(creds) = config.login.credentials(store.record().credentials.as_ref()) else {
                bail!("No login signature or credentials configured");
            };
            info!(user = %creds.username, url = %config.login.url, "Using website login");
            Login::Http(HttpLogin::new(
                config.login.url.clone(),
                creds.username,
                creds.password,
                config.server.accept_invalid_certs,
            )?)
        }
    };

    if config.server.accept_invalid_certs {
        warn!("TLS certificate verification is disabled for {}", config.server.url);
    }

    let bot = &config.bot;
    let gates = Gates {
        cooldown: bot.cooldown(),
        bans: bot.ban_patterns(),
        super_user: bot.super_user(),
    };
    let flags = RuntimeFlags::new(bot.flags, Identity::new(&bot.fake_identity));
    let state = BotState::new(store, flags, Settings::from_config(bot));

    let mut decoder = Decoder::new().with_sigil(bot.sigil);
    if let Some(phrase) = &bot.woof_phrase {
        decoder = decoder.with_woof_phrase(phrase.clone());
    }
    let responder = Responder::new(Callout::new(&bot.callout_identity, &bot.response_tag));

    let mut bridge = Bridge::new(
        decoder,
        handlers::dispatcher(gates),
        responder,
        state,
        SystemClock,
    );

    let connector = WsConnector::new(config.server.url.clone())
        .accept_invalid_certs(config.server.accept_invalid_certs);
    info!(url = %connector.url(), "Connecting to game server...");
    let mut session = Session::new(connector, login, SystemClock, bot.reconnect_policy());

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm =
            signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;
        tokio::select! {
            _ = session.start(&mut bridge) => {}
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        tokio::select! {
            _ = session.start(&mut bridge) => {}
            _ = tokio::signal::ctrl_c() => {}
        }
    }

    info!(
        connections = session.connections(),
        failed_attempts = session.failures(),
        dispatched = bridge.dispatched(),
        next_sequence = bridge.responder().sequence(),
        "Shutdown signal received, closing session"
    );
    session.close().await;

    info!("Wiki bot stopped");
    Ok(())
}
