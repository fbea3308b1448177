pub mod api;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod db;
pub mod mailer;
pub mod media;

pub use db::DbPool;

use config::Config;

use crate::auth::AccessGate;
use crate::mailer::ContactMailer;
use crate::media::{ImageStore, Pickers};

pub struct AppState {
    pub config: Config,
    pub db: DbPool,
    pub mailer: ContactMailer,
    pub images: Option<ImageStore>,
    pub pickers: Pickers,
    pub http: reqwest::Client,
    pub gate: AccessGate,
}

impl AppState {
    pub fn new(config: Config, db: DbPool, images: Option<ImageStore>) -> Self {
        let mailer = ContactMailer::new(config.email.clone());
        let pickers = Pickers::new(config.pickers.clone());
        Self {
            config,
            db,
            mailer,
            images,
            pickers,
            http: reqwest::Client::new(),
            gate: AccessGate::new(),
        }
    }
}
