use {
    dotenv::dotenv,
    log::{error, info},
    playerwatch::{
        config::Config, publisher::DiscordWebhook, scheduler::Scheduler,
        source::ListingPageSource,
    },
    std::time::Duration,
    tokio::signal::{
        self,
        unix::{signal as unix_signal, SignalKind},
    },
};

#[tokio::main]
async fn main() {
    dotenv().ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    if let Err(e) = run().await {
        error!("Unerwarteter Fehler: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    info!("Starte Playerwatch für Server {}", config.server_id);

    let source = ListingPageSource::new(&config.server_id);
    let publisher = DiscordWebhook::new(&config.webhook_url)?;
    let mut scheduler = Scheduler::new(
        source,
        publisher,
        Duration::from_secs(config.update_interval_secs),
        &config.stats_path,
    );

    scheduler.start().await?;

    let mut sigterm = unix_signal(SignalKind::terminate())?;
    tokio::select! {
        _ = signal::ctrl_c() => info!("SIGINT empfangen, beende Bot..."),
        _ = sigterm.recv() => info!("SIGTERM empfangen, beende Bot..."),
    }

    scheduler.stop().await;
    Ok(())
}
