//! Chat command parsing.

use std::fmt;

/// Commands understood by the bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotCommand {
    /// Welcome and help text.
    Start,
    /// Begin monitoring for this chat.
    Monitor,
    /// Stop monitoring for this chat.
    Stop,
    /// Report whether monitoring is running.
    Status,
}

impl BotCommand {
    /// Parse a message text such as "/monitor" or "/status@my_bot extra".
    ///
    /// Returns `None` for non-commands and unknown commands.
    pub fn parse(text: &str) -> Option<Self> {
        let first = text.split_whitespace().next()?;
        let name = first.strip_prefix('/')?;
        let name = name.split('@').next().unwrap_or(name);

        match name {
            "start" => Some(Self::Start),
            "monitor" => Some(Self::Monitor),
            "stop" => Some(Self::Stop),
            "status" => Some(Self::Status),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Monitor => "monitor",
            Self::Stop => "stop",
            Self::Status => "status",
        }
    }
}

impl fmt::Display for BotCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.as_str())
    }
}
