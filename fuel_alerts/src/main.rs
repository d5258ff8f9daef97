#![warn(clippy::pedantic)]

use anyhow::Context;
use chrono::Utc;
use fuel_alerts::check::run_check;
use fuel_alerts::cli::Command;
use fuel_alerts::interactions::{router, serve_interactions};
use fuel_alerts::jobs::{PeriodicCheck, spawn_periodic_check};
use fuel_alerts::notify::DiscordNotifier;
use fuel_alerts::responder::{ResponderSettings, StatusResponder};
use fuel_alerts::status::build_status_report;
use fuel_alerts::thresholds::Thresholds;
use shared::esi::EsiClient;
use shared::{Config, init_tracing, load_config, shutdown_listener};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing().context("initialize tracing")?;

    let res = run().await;
    if let Err(ref e) = res {
        error!(error = ?e, "❌ fuel alerts run failed");
    }
    res
}

async fn run() -> anyhow::Result<()> {
    let command = Command::from_args(std::env::args().skip(1))?;
    let config = load_config().context("load config")?;

    match command {
        Command::Check => check_once(&config).await,
        Command::Status => print_status(&config).await,
        Command::Serve => serve(config).await,
    }
}

fn load_thresholds(config: &Config) -> anyhow::Result<Thresholds> {
    Thresholds::new(
        &config.alerts.thresholds_hours,
        config.alerts.check_interval,
    )
    .context("invalid alert thresholds")
}

fn discord_notifier(config: &Config) -> anyhow::Result<DiscordNotifier> {
    config.require_discord()?;
    Ok(DiscordNotifier::new(
        config.discord.bot_token.expose(),
        config.discord.channel_id,
    ))
}

async fn check_once(config: &Config) -> anyhow::Result<()> {
    config.require_sso()?;
    let thresholds = load_thresholds(config)?;
    let notifier = discord_notifier(config)?;
    let api = EsiClient::new(config).context("build ESI client")?;

    run_check(
        &api,
        &notifier,
        &thresholds,
        config.discord.max_message_len,
        Utc::now(),
    )
    .await?;
    Ok(())
}

async fn print_status(config: &Config) -> anyhow::Result<()> {
    config.require_sso()?;
    let api = EsiClient::new(config).context("build ESI client")?;

    let report = build_status_report(&api, Utc::now()).await?;
    println!("{}", report.render_full());
    Ok(())
}

async fn serve(config: Config) -> anyhow::Result<()> {
    config.require_sso()?;
    let thresholds = load_thresholds(&config)?;
    let notifier = Arc::new(discord_notifier(&config)?);
    let api = Arc::new(EsiClient::new(&config).context("build ESI client")?);

    let shutdown = CancellationToken::new();
    let signal_handle = tokio::spawn(shutdown_listener(Some(shutdown.clone())));

    let responder = Arc::new(StatusResponder::new(
        Arc::clone(&api),
        Arc::clone(&notifier),
        ResponderSettings {
            deadline: config.interactions.response_deadline,
            initial_estimate: config.interactions.initial_fetch_estimate,
            max_entries: config.status.max_entries,
            max_message_len: config.discord.max_message_len,
        },
    ));
    let app = router(responder, &config.interactions.command_name);
    let listen_addr = config.interactions.listen_addr.clone();
    let server_token = shutdown.clone();
    let server_handle =
        tokio::spawn(async move { serve_interactions(app, &listen_addr, server_token).await });

    info!(
        interval = %humantime::format_duration(config.alerts.check_interval),
        thresholds = ?thresholds.hours(),
        "starting periodic fuel check"
    );
    let check_handle = spawn_periodic_check(
        PeriodicCheck {
            api,
            notifier,
            interval: config.alerts.check_interval,
            thresholds,
            max_message_len: config.discord.max_message_len,
        },
        shutdown.clone(),
    );

    tokio::select! {
        res = server_handle => {
            shutdown.cancel();
            res?.context("interactions server stopped")?;
        }
        res = signal_handle => {
            shutdown.cancel();
            res?;
        }
    }

    check_handle.await?;
    Ok(())
}
