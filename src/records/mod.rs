pub mod dto;
pub mod handlers;
pub mod parser;
pub mod repo_types;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::record_routes()
}
