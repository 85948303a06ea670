pub mod reply;
pub mod telegram;

pub use telegram::{BotContext, TelegramAdapter};
