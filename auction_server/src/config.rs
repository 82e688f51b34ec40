use std::env;

use auction_engine::commission::CommissionConfig;
use log::*;

const DEFAULT_CAP_HOST: &str = "127.0.0.1";
const DEFAULT_CAP_PORT: u16 = 4200;
const DEFAULT_CAP_DATABASE_URL: &str = "sqlite://data/cap_store.db";
const DEFAULT_EVENT_BUFFER_SIZE: usize = 25;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// The commission policy applied at bid acceptance.
    pub commission: CommissionConfig,
    /// Queue depth of the post-settlement event channels (chat creation, notifications).
    pub event_buffer_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_CAP_HOST.to_string(),
            port: DEFAULT_CAP_PORT,
            database_url: DEFAULT_CAP_DATABASE_URL.to_string(),
            commission: CommissionConfig::default(),
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("CAP_HOST").ok().unwrap_or_else(|| DEFAULT_CAP_HOST.into());
        let port = env::var("CAP_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for CAP_PORT. {e} Using the default, {DEFAULT_CAP_PORT}, instead."
                    );
                    DEFAULT_CAP_PORT
                })
            })
            .unwrap_or(DEFAULT_CAP_PORT);
        let database_url = env::var("CAP_DATABASE_URL").unwrap_or_else(|_| {
            warn!("🪛️ CAP_DATABASE_URL is not set. Using the default, {DEFAULT_CAP_DATABASE_URL}, instead.");
            DEFAULT_CAP_DATABASE_URL.into()
        });
        let event_buffer_size = env::var("CAP_EVENT_BUFFER_SIZE")
            .ok()
            .and_then(|s| {
                s.parse::<usize>()
                    .map_err(|e| {
                        error!("🪛️ {s} is not a valid value for CAP_EVENT_BUFFER_SIZE. {e}");
                        e
                    })
                    .ok()
            })
            .unwrap_or(DEFAULT_EVENT_BUFFER_SIZE);
        let commission = CommissionConfig::from_env_or_default();
        Self { host, port, database_url, commission, event_buffer_size }
    }
}
