//! Chat command handling.

use crate::messages;
use crate::supervisor::{StartOutcome, StopOutcome, Supervisor};
use std::sync::Arc;
use tracing::info;
use volspike_core::SessionId;
use volspike_telegram::BotCommand;

/// Maps chat commands to supervisor actions and reply texts.
pub struct CommandHandler {
    supervisor: Arc<Supervisor>,
}

impl CommandHandler {
    pub fn new(supervisor: Arc<Supervisor>) -> Self {
        Self { supervisor }
    }

    /// Handle `command` for `session`.
    ///
    /// Returns the reply to send, if any. A successful `/monitor` has no
    /// direct reply; the started notice comes from the new loop.
    pub fn handle(&self, session: SessionId, command: BotCommand) -> Option<String> {
        info!(session = %session, command = %command, "Command received");
        match command {
            BotCommand::Start => Some(messages::WELCOME.to_string()),
            BotCommand::Monitor => match self.supervisor.start(session) {
                StartOutcome::Started => None,
                StartOutcome::AlreadyRunning => Some(messages::ALREADY_RUNNING.to_string()),
            },
            BotCommand::Stop => match self.supervisor.stop(session) {
                StopOutcome::Stopped => Some(messages::STOPPED.to_string()),
                StopOutcome::NotRunning => Some(messages::NOT_RUNNING.to_string()),
            },
            BotCommand::Status => Some(messages::status(self.supervisor.status(session))),
        }
    }
}
