//! Telegram adapter: long-polling dispatcher and inbound event handlers.
//!
//! Every handler catches its own failures and converts them into a single
//! user-facing message; the dispatch loop never crashes and other in-flight
//! events are unaffected. Nothing is retried automatically.

use std::sync::Arc;

use teloxide::net::Download;
use teloxide::payloads::SendMessageSetters;
use teloxide::prelude::*;
use teloxide::types::{ParseMode, PhotoSize};
use teloxide::utils::command::BotCommands;
use tracing::{error, info, warn};

use verstbot_sheets::TemplateStore;
use verstbot_vision::{OcrClient, extract_fields};

use crate::reply;

/// Shared handler context, one per process.
pub struct BotContext {
    pub ocr: OcrClient,
    pub templates: TemplateStore,
}

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Доступные команды:")]
pub enum Command {
    #[command(description = "краткая справка")]
    Start,
    #[command(description = "показать команды")]
    Help,
    #[command(description = "найти шаблон по ключевому слову")]
    Template(String),
}

pub struct TelegramAdapter {
    bot: Bot,
    ctx: Arc<BotContext>,
}

impl TelegramAdapter {
    pub fn new(token: &str, ctx: Arc<BotContext>) -> Self {
        Self {
            bot: Bot::new(token),
            ctx,
        }
    }

    /// Run the long-polling dispatcher until shutdown.
    pub async fn start(self) {
        info!("starting Telegram adapter");

        let handler = Update::filter_message()
            .branch(
                dptree::entry()
                    .filter_command::<Command>()
                    .endpoint(handle_command),
            )
            .branch(
                dptree::filter(|msg: Message| msg.photo().is_some()).endpoint(handle_photo),
            );

        Dispatcher::builder(self.bot, handler)
            .dependencies(dptree::deps![self.ctx])
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;
    }
}

async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    ctx: Arc<BotContext>,
) -> ResponseResult<()> {
    match cmd {
        Command::Start => {
            bot.send_message(msg.chat.id, reply::GREETING).await?;
        }
        Command::Help => {
            bot.send_message(msg.chat.id, Command::descriptions().to_string())
                .await?;
        }
        Command::Template(keyword) => {
            handle_template(&bot, &msg, keyword.trim(), &ctx).await?;
        }
    }
    Ok(())
}

async fn handle_template(
    bot: &Bot,
    msg: &Message,
    keyword: &str,
    ctx: &BotContext,
) -> ResponseResult<()> {
    if keyword.is_empty() {
        bot.send_message(msg.chat.id, reply::TEMPLATE_USAGE).await?;
        return Ok(());
    }

    info!(keyword, chat = msg.chat.id.0, "template lookup");
    let rows = match ctx.templates.find(keyword).await {
        Ok(rows) => rows,
        Err(err) => {
            error!(error = %err, "template lookup failed");
            bot.send_message(msg.chat.id, reply::TEMPLATE_LOOKUP_FAILED)
                .await?;
            return Ok(());
        }
    };

    if rows.is_empty() {
        bot.send_message(msg.chat.id, reply::TEMPLATE_NOT_FOUND)
            .await?;
        return Ok(());
    }

    // One message per matching row, in the store's row order.
    for row in rows {
        bot.send_message(msg.chat.id, reply::render_template(&row))
            .parse_mode(ParseMode::Html)
            .await?;
    }
    Ok(())
}

async fn handle_photo(bot: Bot, msg: Message, ctx: Arc<BotContext>) -> ResponseResult<()> {
    // The last rendition is the largest one Telegram offers.
    let Some(photo) = msg.photo().and_then(|sizes| sizes.last()) else {
        return Ok(());
    };
    info!(chat = msg.chat.id.0, "photo received");

    let image = match download_photo(&bot, photo).await {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!(error = %err, "photo download failed");
            bot.send_message(msg.chat.id, reply::RECOGNITION_FAILED)
                .await?;
            return Ok(());
        }
    };

    let text = match ctx.ocr.recognize(&image).await {
        Ok(text) => text,
        Err(err) => {
            error!(error = %err, "recognition failed");
            bot.send_message(msg.chat.id, reply::RECOGNITION_FAILED)
                .await?;
            return Ok(());
        }
    };
    if text.is_empty() {
        bot.send_message(msg.chat.id, reply::RECOGNITION_FAILED)
            .await?;
        return Ok(());
    }

    let fields = extract_fields(&text);
    bot.send_message(msg.chat.id, reply::render_summary(&fields, &text))
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

async fn download_photo(bot: &Bot, photo: &PhotoSize) -> anyhow::Result<Vec<u8>> {
    let file = bot.get_file(photo.file.id.clone()).await?;
    let mut bytes = Vec::new();
    bot.download_file(&file.path, &mut bytes).await?;
    Ok(bytes)
}
