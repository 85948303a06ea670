use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

use verstbot_auth::{IamTokenSource, TokenCache};
use verstbot_channels::{BotContext, TelegramAdapter};
use verstbot_config::AppConfig;
use verstbot_sheets::TemplateStore;
use verstbot_vision::OcrClient;

#[derive(Parser)]
#[command(name = "verstbot")]
#[command(about = "Verstbot — task-sheet recognition assistant for dispatch chats")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot (long polling)
    Serve,
    /// Validate configuration and print a redacted snapshot
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Required settings are validated before any network activity; a missing
    // value is fatal right here.
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("configuration error: {err}");
            std::process::exit(1);
        }
    };

    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .json()
        .init();

    match cli.command {
        Commands::Serve => run_bot(config).await?,
        Commands::Check => {
            println!("{}", serde_json::to_string_pretty(&config.redacted())?);
        }
    }

    Ok(())
}

async fn run_bot(config: AppConfig) -> Result<()> {
    info!(
        folder = %config.vision_folder_id,
        sheet = %config.sheet_id,
        "starting verstbot"
    );

    let source = IamTokenSource::new(
        config.service_account_key.clone(),
        config.iam_endpoint.clone(),
    )?;
    let tokens = Arc::new(TokenCache::new(Arc::new(source)));

    let ocr = OcrClient::new(
        tokens.clone(),
        config.vision_endpoint.clone(),
        config.vision_folder_id.clone(),
    )?;
    let templates = TemplateStore::new(
        tokens,
        config.sheets_endpoint.clone(),
        config.sheet_id.clone(),
    )?;

    let ctx = Arc::new(BotContext { ocr, templates });
    TelegramAdapter::new(&config.telegram_token, ctx).start().await;

    Ok(())
}
