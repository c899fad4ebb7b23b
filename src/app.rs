// Application state shared across handlers
use std::sync::Arc;

use crate::{
    app_config::AppConfig,
    services::{UrlCheckService, VerdictCache},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub cache: Arc<VerdictCache>,
    pub url_check: Arc<UrlCheckService>,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>, url_check: Arc<UrlCheckService>) -> Self {
        Self {
            config,
            cache: url_check.cache().clone(),
            url_check,
        }
    }
}
