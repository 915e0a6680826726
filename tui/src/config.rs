use std::{path::PathBuf, time::Duration};

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "chat-tui")]
#[command(about = "Terminal client for the chat rooms service")]
pub struct Config {
    /// Base url of the chat service, the endpoints are resolved relative to it
    #[arg(long, env = "CHAT_BASE_URL", default_value = "http://localhost:8080")]
    pub base_url: String,

    /// Seconds between two refreshes of the room directory
    #[arg(
        long,
        env = "CHAT_POLL_INTERVAL_SECS",
        default_value_t = 3,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub poll_interval_secs: u64,

    /// File the logs are written to, the terminal belongs to the UI
    #[arg(long, env = "CHAT_LOG_FILE", default_value = "chat-tui.log")]
    pub log_file: PathBuf,
}

impl Config {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}
