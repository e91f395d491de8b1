//! Telegram Bot API client for volspike.
//!
//! Covers the three calls the bot needs (`getMe`, `getUpdates`,
//! `sendMessage`) and parsing of the four chat commands.

pub mod client;
pub mod command;
pub mod error;
pub mod types;

pub use client::{TelegramClient, DEFAULT_API_BASE};
pub use command::BotCommand;
pub use error::{TelegramError, TelegramResult};
pub use types::{Chat, Message, Update, User};
