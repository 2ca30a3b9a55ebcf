use log::{error, info, warn};

use messenger_webhook::config::Config;
use messenger_webhook::send_message::GraphApiSender;
use messenger_webhook::webhook::{AppState, router};

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run().await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    info!("Starting with {:?}", config);

    let sender = GraphApiSender::from_config(&config)?;

    if config.register_commands {
        if let Err(e) = sender.register_commands().await {
            warn!("Continuing without bot commands: {}", e);
        }
    }

    let app = router(AppState::new(config.verify_token.clone(), sender));

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!("Listening on {}", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
