pub mod api;
pub mod config;
pub mod models;
pub mod session;
pub mod ui;
pub mod upstream;

use config::Config;

use crate::upstream::PeliosClient;

pub struct AppState {
    pub config: Config,
    pub upstream: PeliosClient,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let upstream = PeliosClient::new(&config.api)?;
        Ok(Self { config, upstream })
    }
}
