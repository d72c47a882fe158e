use axum::extract::FromRef;
use common::settings::Settings;
use repos::Repo;
use std::sync::Arc;

#[derive(FromRef, Debug, Clone)]
pub struct AppState {
    pub repo: Repo,
    pub settings: Arc<Settings>,
}
