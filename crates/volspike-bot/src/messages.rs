//! User-facing message texts.

use volspike_core::MonitorState;

pub const WELCOME: &str = "Welcome to Binance Volume Monitor Bot!\n\n\
Available commands:\n\
/monitor - Start volume monitoring\n\
/stop - Stop volume monitoring\n\
/status - Check monitoring status";

pub const STARTED: &str =
    "Volume monitoring started! You will receive alerts when volume increases more than 5x.";

pub const STOPPED: &str = "Volume monitoring stopped!";

pub const ALREADY_RUNNING: &str = "Monitoring is already running!";

pub const NOT_RUNNING: &str = "Monitoring is not running!";

pub fn status(state: MonitorState) -> String {
    format!("Monitoring is currently {state}")
}
